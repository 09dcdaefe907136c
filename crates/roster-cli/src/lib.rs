pub mod cli_args;
pub mod render;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{Datelike, Local};
use rand::SeedableRng;
use rand::rngs::StdRng;
use roster_core::{
    ConfigSource, FileConfig, HolidaySettings, HolidaySource, LoggingDestination, NagerHolidays,
    NoHolidays, RosterDefaults, RosterOutcome, RosterRequest, config_path, enumerate,
    exclude_holidays, fetch_holidays, generate, init_logging, load_config, normalize_members,
    parse_weekday, save_config, week_ordinals,
};
use tracing::{debug, warn};

pub use cli_args::{
    Cli, Command, ConfigCommand, GenerateArgs, HolidaysArgs, ManualFix, OutputFormat,
    ScheduleArgs, Unavailability,
};

pub const ROSTER_CSV_FILE: &str = "roster.csv";
pub const SUMMARY_CSV_FILE: &str = "summary.csv";

/// Log destination and default filter directive for a run.
pub fn logging_for(verbose: bool) -> (LoggingDestination, &'static str) {
    if verbose {
        (LoggingDestination::FileAndStderr, "debug")
    } else {
        (LoggingDestination::StderrOnly, "warn")
    }
}

/// Runs one parsed command line.
pub fn dispatch(cli: Cli) -> Result<()> {
    let (destination, directive) = logging_for(cli.verbose);
    if let Err(err) = init_logging(destination, directive) {
        eprintln!("Warning: logging disabled: {err}");
    }

    match cli.command {
        Command::Generate(args) => run_generate(&args),
        Command::Dates(args) => run_dates(&args),
        Command::Holidays(args) => run_holidays(&args),
        Command::Config(cmd) => handle_config_command(cmd),
    }
}

fn load_config_with_warnings() -> FileConfig {
    let load = load_config();
    for warning in &load.warnings {
        eprintln!("Warning: {warning}");
    }
    if load.source == ConfigSource::Default {
        debug!("No config file found; using defaults");
    }
    load.config
}

fn run_generate(args: &GenerateArgs) -> Result<()> {
    let config = load_config_with_warnings();
    let (request, warnings) = build_request(args, &config.defaults, current_year())?;
    for warning in warnings {
        eprintln!("Warning: {warning}");
    }

    let source = holiday_source(request.avoid_holidays, &config.holidays);
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let outcome = generate(&request, source.as_ref(), &mut rng)?;

    match args.format {
        OutputFormat::Text => print!("{}", render::render_outcome(&outcome)),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&outcome).context("failed to serialize roster")?
        ),
    }

    let out_dir = args
        .out
        .clone()
        .or_else(|| config.defaults.output_dir_path());
    if let Some(dir) = out_dir {
        write_outputs(&outcome, &dir)?;
        let notice = format!(
            "Wrote {ROSTER_CSV_FILE} and {SUMMARY_CSV_FILE} to {}",
            dir.display()
        );
        // Keep stdout parseable in JSON mode.
        match args.format {
            OutputFormat::Text => println!("\n{notice}"),
            OutputFormat::Json => eprintln!("{notice}"),
        }
    }

    Ok(())
}

fn run_dates(args: &ScheduleArgs) -> Result<()> {
    let config = load_config_with_warnings();
    let year = args.year.unwrap_or_else(current_year);
    let (weekday, ordinals) = resolve_schedule(args, &config.defaults)?;

    let mut dates = enumerate(year, weekday, &ordinals)?;
    if !args.no_holidays && config.defaults.avoid_holidays {
        let source = holiday_source(true, &config.holidays);
        let holidays = fetch_holidays(source.as_ref(), year);
        dates = exclude_holidays(&dates, &holidays);
    }

    print!("{}", render::render_dates(&dates));
    Ok(())
}

fn run_holidays(args: &HolidaysArgs) -> Result<()> {
    let config = load_config_with_warnings();
    let year = args.year.unwrap_or_else(current_year);
    let settings = config.holidays.with_env_overrides();
    let source = NagerHolidays::new(&settings).context("failed to build HTTP client")?;

    // Surface the failure here; roster generation degrades instead.
    let holidays = source
        .holidays(year)
        .with_context(|| format!("holiday lookup failed for {}", source.url_for(year)))?;
    if holidays.is_empty() {
        println!("No public holidays reported for {year} ({}).", settings.country);
    }
    for date in holidays {
        println!("{}", date.format("%Y-%m-%d %a"));
    }
    Ok(())
}

fn handle_config_command(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Init { force } => {
            let path = config_path();
            if path.exists() && !force {
                bail!(
                    "Config file already exists at {}; pass --force to overwrite.",
                    path.display()
                );
            }
            let written = save_config(&FileConfig::default())
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote default config to {}", written.display());
            Ok(())
        }
        ConfigCommand::Path => {
            println!("{}", config_path().display());
            Ok(())
        }
    }
}

/// Resolves CLI flags against config defaults into a roster request.
///
/// Returns the request plus advisory warnings (e.g. repeated member names).
pub fn build_request(
    args: &GenerateArgs,
    defaults: &RosterDefaults,
    fallback_year: i32,
) -> Result<(RosterRequest, Vec<String>)> {
    let mut warnings = Vec::new();
    let year = args.schedule.year.unwrap_or(fallback_year);
    let (weekday, ordinals) = resolve_schedule(&args.schedule, defaults)?;

    let raw_members = match args.members_file.as_deref() {
        Some(path) => read_members_file(path)?,
        None => args.members.clone(),
    };
    let (members, duplicates) = normalize_members(raw_members);
    if !duplicates.is_empty() {
        warnings.push(format!(
            "Duplicate member names removed: {}",
            duplicates.join(", ")
        ));
    }

    let mut request = RosterRequest::new(year, weekday, ordinals, members);
    request.avoid_holidays = defaults.avoid_holidays && !args.schedule.no_holidays;
    request.avoid_back_to_back = if args.allow_back_to_back {
        false
    } else {
        args.avoid_back_to_back || defaults.avoid_back_to_back
    };
    request.relax_when_unassigned = args.relax;

    for entry in &args.unavailable {
        request
            .unavailable
            .entry(entry.member.clone())
            .or_default()
            .extend(entry.months.iter().copied());
    }
    for fix in &args.fix {
        if let Some(previous) = request.overrides.insert(fix.date, fix.member.clone()) {
            warnings.push(format!(
                "--fix for {} given more than once; using {} instead of {}",
                fix.date, fix.member, previous
            ));
        }
    }

    Ok((request, warnings))
}

fn resolve_schedule(
    args: &ScheduleArgs,
    defaults: &RosterDefaults,
) -> Result<(u8, BTreeSet<usize>)> {
    let weekday = parse_weekday(args.weekday.as_deref().unwrap_or(defaults.weekday.as_str()))?;
    let weeks = if args.weeks.is_empty() {
        &defaults.weeks
    } else {
        &args.weeks
    };
    Ok((weekday, week_ordinals(weeks)?))
}

fn read_members_file(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read members file {}", path.display()))?;
    Ok(text.lines().map(str::to_string).collect())
}

fn holiday_source(avoid_holidays: bool, settings: &HolidaySettings) -> Box<dyn HolidaySource> {
    if !avoid_holidays {
        return Box::new(NoHolidays);
    }
    match NagerHolidays::new(&settings.clone().with_env_overrides()) {
        Ok(source) => Box::new(source),
        Err(err) => {
            warn!(error = %err, "Holiday client unavailable; keeping every meeting date");
            Box::new(NoHolidays)
        }
    }
}

/// Writes `roster.csv` and `summary.csv` into `dir`, creating it if needed.
pub fn write_outputs(outcome: &RosterOutcome, dir: &Path) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let roster_path = dir.join(ROSTER_CSV_FILE);
    let summary_path = dir.join(SUMMARY_CSV_FILE);
    outcome
        .roster
        .save_csv(&roster_path)
        .with_context(|| format!("failed to write {}", roster_path.display()))?;
    outcome
        .summary
        .save_csv(&summary_path)
        .with_context(|| format!("failed to write {}", summary_path.display()))?;
    Ok((roster_path, summary_path))
}

fn current_year() -> i32 {
    Local::now().year()
}
