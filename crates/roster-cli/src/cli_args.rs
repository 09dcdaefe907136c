use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};

/// Top-level CLI entrypoint.
#[derive(Parser, Debug, Clone)]
#[command(name = "roster", version, about, long_about = None)]
pub struct Cli {
    /// Emit debug logs on stderr and to the log file.
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Supported subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Build a facilitator roster for a year of meetings.
    Generate(GenerateArgs),
    /// List the meeting dates without assigning anyone.
    Dates(ScheduleArgs),
    /// List the public holidays the holiday service reports for a year.
    Holidays(HolidaysArgs),
    /// Manage the configuration file.
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Configuration subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum ConfigCommand {
    /// Write a config.toml populated with the default settings.
    Init {
        /// Replace an existing file.
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
    /// Print where the configuration file is read from.
    Path,
}

/// Recurrence options shared by `generate` and `dates`.
#[derive(Debug, Clone, Args)]
pub struct ScheduleArgs {
    /// Calendar year (defaults to the current year).
    #[arg(long)]
    pub year: Option<i32>,

    /// Meeting weekday, as a name or 0 (Monday) through 6 (Sunday).
    #[arg(long)]
    pub weekday: Option<String>,

    /// Weeks of the month (1-5), comma separated.
    #[arg(long, value_delimiter = ',', value_parser = clap::value_parser!(u32))]
    pub weeks: Vec<u32>,

    /// Keep meetings that fall on public holidays.
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_holidays: bool,
}

/// Arguments for roster generation.
#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub schedule: ScheduleArgs,

    /// Member name; repeat for each member.
    #[arg(short, long = "member", value_name = "NAME", conflicts_with = "members_file")]
    pub members: Vec<String>,

    /// File listing one member per line.
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub members_file: Option<PathBuf>,

    /// Months (1-12) a member cannot facilitate, e.g. `Alice=6,7`.
    #[arg(long, value_name = "NAME=MONTHS", value_parser = parse_unavailability)]
    pub unavailable: Vec<Unavailability>,

    /// Pin a facilitator to a date after assignment, e.g. `2025-01-21=Alice`.
    #[arg(long, value_name = "DATE=NAME", value_parser = parse_fix)]
    pub fix: Vec<ManualFix>,

    /// Allow the same member to facilitate consecutive meetings.
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "avoid_back_to_back")]
    pub allow_back_to_back: bool,

    /// Keep members off consecutive meetings even if the config turns this off.
    #[arg(long, action = ArgAction::SetTrue)]
    pub avoid_back_to_back: bool,

    /// Regenerate without back-to-back avoidance if any date is left TBA.
    #[arg(long, action = ArgAction::SetTrue)]
    pub relax: bool,

    /// Seed for reproducible tie-breaking.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory that receives roster.csv and summary.csv.
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub out: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Args)]
pub struct HolidaysArgs {
    /// Calendar year (defaults to the current year).
    #[arg(long)]
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Months in which a member is unavailable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unavailability {
    pub member: String,
    pub months: Vec<u32>,
}

/// A manual assignment applied after the roster is generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualFix {
    pub date: NaiveDate,
    pub member: String,
}

fn parse_unavailability(value: &str) -> Result<Unavailability, String> {
    let (member, months) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=MONTHS, got '{value}'"))?;
    let member = member.trim();
    if member.is_empty() {
        return Err(format!("missing member name in '{value}'"));
    }

    let months = months
        .split(',')
        .map(str::trim)
        .filter(|month| !month.is_empty())
        .map(|month| {
            month
                .parse::<u32>()
                .map_err(|_| format!("invalid month '{month}' for {member}"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Unavailability {
        member: member.to_string(),
        months,
    })
}

fn parse_fix(value: &str) -> Result<ManualFix, String> {
    let (date, member) = value
        .split_once('=')
        .ok_or_else(|| format!("expected DATE=NAME, got '{value}'"))?;
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}' (use YYYY-MM-DD)", date.trim()))?;
    let member = member.trim();
    if member.is_empty() {
        return Err(format!("missing member name in '{value}'"));
    }

    Ok(ManualFix {
        date,
        member: member.to_string(),
    })
}
