//! Meeting date enumeration for "Nth weekday of the month" recurrence rules.

use std::collections::BTreeSet;

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::error::RosterError;

/// Weekdays indexed Monday = 0 through Sunday = 6.
const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Highest 1-based week of the month a weekday can fall in.
pub const MAX_WEEK_OF_MONTH: u32 = 5;

pub fn weekday_from_index(index: u8) -> Result<Weekday, RosterError> {
    WEEKDAYS
        .get(index as usize)
        .copied()
        .ok_or(RosterError::InvalidWeekday(index))
}

/// Parses a weekday name (`tuesday`, `Tue`) or a 0-based index (`1`) into its index.
pub fn parse_weekday(value: &str) -> Result<u8, RosterError> {
    let trimmed = value.trim();
    if let Ok(index) = trimmed.parse::<u8>() {
        weekday_from_index(index)?;
        return Ok(index);
    }

    trimmed
        .parse::<Weekday>()
        .map(|weekday| weekday.num_days_from_monday() as u8)
        .map_err(|_| RosterError::UnknownWeekday(trimmed.to_string()))
}

/// Converts 1-based weeks of the month (1 = first occurrence) into 0-based ordinals.
pub fn week_ordinals(weeks: &[u32]) -> Result<BTreeSet<usize>, RosterError> {
    weeks
        .iter()
        .map(|&week| {
            if (1..=MAX_WEEK_OF_MONTH).contains(&week) {
                Ok((week - 1) as usize)
            } else {
                Err(RosterError::InvalidWeek(week))
            }
        })
        .collect()
}

/// Computes every meeting date in `year` that falls on `weekday` (Monday = 0) at one of
/// the requested 0-based `ordinals` within its month.
///
/// A month without the requested occurrence (a 5th Tuesday, say) contributes nothing.
/// The result is sorted ascending with no duplicates.
pub fn enumerate(
    year: i32,
    weekday: u8,
    ordinals: &BTreeSet<usize>,
) -> Result<Vec<NaiveDate>, RosterError> {
    let target = weekday_from_index(weekday)?;
    if NaiveDate::from_ymd_opt(year, 1, 1).is_none()
        || NaiveDate::from_ymd_opt(year, 12, 31).is_none()
    {
        return Err(RosterError::YearOutOfRange(year));
    }

    let mut dates = Vec::new();
    for month in 1..=12 {
        let occurrences = occurrences_in_month(year, month, target)?;
        dates.extend(
            ordinals
                .iter()
                .filter_map(|&ordinal| occurrences.get(ordinal).copied()),
        );
    }

    dates.sort();
    dates.dedup();
    Ok(dates)
}

fn occurrences_in_month(
    year: i32,
    month: u32,
    target: Weekday,
) -> Result<Vec<NaiveDate>, RosterError> {
    let first_day =
        NaiveDate::from_ymd_opt(year, month, 1).ok_or(RosterError::YearOutOfRange(year))?;
    let days_to_add =
        (7 + target.num_days_from_monday() - first_day.weekday().num_days_from_monday()) % 7;

    let mut occurrences = Vec::with_capacity(5);
    let mut current = first_day.checked_add_days(Days::new(u64::from(days_to_add)));
    while let Some(date) = current.filter(|date| date.month() == month) {
        occurrences.push(date);
        current = date.checked_add_days(Days::new(7));
    }
    Ok(occurrences)
}
