use std::io;

use chrono::NaiveDate;
use thiserror::Error;

/// Input validation failures surfaced by the enumerator, engine and roster model.
///
/// Running out of eligible members is not an error; it shows up as a `TBA` entry.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("weekday index {0} is out of range (expected 0-6, Monday = 0)")]
    InvalidWeekday(u8),
    #[error("unknown weekday '{0}'")]
    UnknownWeekday(String),
    #[error("week {0} is out of range (expected 1-5)")]
    InvalidWeek(u32),
    #[error("year {0} is outside the supported calendar range")]
    YearOutOfRange(i32),
    #[error("at least one member is required")]
    NoMembers,
    #[error("member '{0}' is listed more than once")]
    DuplicateMember(String),
    #[error("member '{member}' has unavailable month {month} (expected 1-12)")]
    InvalidMonth { member: String, month: u32 },
    #[error("'{0}' is not a member of this roster")]
    UnknownMember(String),
    #[error("meeting date {date} does not come after {previous}")]
    DatesNotIncreasing { previous: NaiveDate, date: NaiveDate },
    #[error("{0} is not a meeting date in this roster")]
    DateNotInRoster(NaiveDate),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
