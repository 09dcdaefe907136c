//! Core library for building rotating facilitator rosters.
//!
//! Meeting dates come from a weekday plus week-of-month recurrence rule, public holidays
//! are optionally removed, and each remaining date is assigned to the least-assigned
//! eligible member.

pub mod assign;
pub mod calendar;
pub mod config;
pub mod error;
pub mod holidays;
pub mod logging;
pub mod pipeline;
pub mod roster;

pub use assign::{UnavailabilityMap, assign, validate_inputs};
pub use calendar::{enumerate, parse_weekday, week_ordinals, weekday_from_index};
pub use config::{
    ConfigError, ConfigLoadResult, ConfigSource, FileConfig, HolidaySettings, RosterDefaults,
    config_directory, config_path, load_config, load_config_from, save_config, save_config_to,
};
pub use error::RosterError;
pub use holidays::{
    HolidayError, HolidaySource, NagerHolidays, NoHolidays, exclude_holidays, fetch_holidays,
    parse_holidays,
};
pub use logging::{LoggingDestination, LoggingError, current_log_path, init_logging};
pub use pipeline::{RosterOutcome, RosterRequest, generate, normalize_members};
pub use roster::{
    Assignee, AssignmentSummary, MonthGroup, Roster, RosterEntry, SummaryRow, UNASSIGNED_LABEL,
    summarize,
};
