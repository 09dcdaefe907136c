use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;
use tracing::info;

use crate::assign::{UnavailabilityMap, assign, validate_inputs};
use crate::calendar::enumerate;
use crate::error::RosterError;
use crate::holidays::{HolidaySource, exclude_holidays, fetch_holidays};
use crate::roster::{AssignmentSummary, Roster, summarize};

/// Fully resolved parameters for one roster run.
#[derive(Debug, Clone)]
pub struct RosterRequest {
    pub year: i32,
    /// Monday = 0 through Sunday = 6.
    pub weekday: u8,
    /// 0-based occurrences of the weekday within each month.
    pub week_ordinals: BTreeSet<usize>,
    pub members: Vec<String>,
    pub unavailable: UnavailabilityMap,
    pub avoid_holidays: bool,
    pub avoid_back_to_back: bool,
    /// Re-run once without back-to-back avoidance when the first pass leaves `TBA` slots.
    pub relax_when_unassigned: bool,
    /// Manual fixes applied after assignment.
    pub overrides: BTreeMap<NaiveDate, String>,
}

impl RosterRequest {
    pub fn new(
        year: i32,
        weekday: u8,
        week_ordinals: BTreeSet<usize>,
        members: Vec<String>,
    ) -> Self {
        Self {
            year,
            weekday,
            week_ordinals,
            members,
            unavailable: UnavailabilityMap::new(),
            avoid_holidays: true,
            avoid_back_to_back: true,
            relax_when_unassigned: false,
            overrides: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RosterOutcome {
    /// Meeting dates after holiday filtering.
    pub dates: Vec<NaiveDate>,
    /// Meeting dates dropped because they fell on a public holiday.
    pub holidays_excluded: Vec<NaiveDate>,
    pub roster: Roster,
    /// Derived from the final roster, after overrides.
    pub summary: AssignmentSummary,
    /// True when back-to-back avoidance was dropped to fill `TBA` slots.
    pub relaxed: bool,
}

impl RosterOutcome {
    pub fn unassigned_dates(&self) -> Vec<NaiveDate> {
        self.roster.unassigned_dates()
    }
}

/// Enumerates the meeting dates, drops holidays, assigns facilitators and applies
/// manual overrides.
///
/// Holiday lookup failures never fail the run; the schedule is simply left unfiltered.
pub fn generate<R: Rng + ?Sized>(
    request: &RosterRequest,
    holidays: &dyn HolidaySource,
    rng: &mut R,
) -> Result<RosterOutcome, RosterError> {
    validate_inputs(&request.members, &request.unavailable)?;

    let candidates = enumerate(request.year, request.weekday, &request.week_ordinals)?;
    let (dates, holidays_excluded) = if request.avoid_holidays {
        let holiday_set = fetch_holidays(holidays, request.year);
        let kept = exclude_holidays(&candidates, &holiday_set);
        let dropped: Vec<NaiveDate> = candidates
            .iter()
            .copied()
            .filter(|date| holiday_set.contains(date))
            .collect();
        (kept, dropped)
    } else {
        (candidates, Vec::new())
    };

    info!(
        year = request.year,
        meetings = dates.len(),
        holidays_excluded = holidays_excluded.len(),
        members = request.members.len(),
        "Meeting dates resolved"
    );

    let (mut roster, _) = assign(
        &dates,
        &request.members,
        &request.unavailable,
        request.avoid_back_to_back,
        rng,
    )?;

    let mut relaxed = false;
    if request.relax_when_unassigned
        && request.avoid_back_to_back
        && !roster.unassigned_dates().is_empty()
    {
        info!(
            unassigned = roster.unassigned_dates().len(),
            "Regenerating without back-to-back avoidance"
        );
        roster = assign(&dates, &request.members, &request.unavailable, false, rng)?.0;
        relaxed = true;
    }

    roster.apply_overrides(&request.overrides, &request.members)?;
    let summary = summarize(&roster, &request.members);

    Ok(RosterOutcome {
        dates,
        holidays_excluded,
        roster,
        summary,
        relaxed,
    })
}

/// Trims names, drops blanks and removes repeats (first occurrence wins).
///
/// Returns the cleaned member list and the names that were repeated.
pub fn normalize_members<I, S>(raw: I) -> (Vec<String>, Vec<String>)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut members = Vec::new();
    let mut duplicates = Vec::new();

    for name in raw {
        let name = name.as_ref().trim();
        if name.is_empty() {
            continue;
        }
        if seen.insert(name.to_string()) {
            members.push(name.to_string());
        } else if !duplicates.iter().any(|dup| dup == name) {
            duplicates.push(name.to_string());
        }
    }

    (members, duplicates)
}
