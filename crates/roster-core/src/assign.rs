//! Fair-rotation facilitator assignment.
//!
//! A single greedy pass over the meeting dates, earliest first. Each date goes to the
//! least-assigned eligible member, with ties broken by the supplied random source. The
//! pass never revisits earlier dates, so a tight back-to-back window can leave a `TBA`
//! slot that a look-ahead search would have filled.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::debug;

use crate::error::RosterError;
use crate::roster::{Assignee, AssignmentSummary, Roster, RosterEntry};

/// Months (1-12) in which each member cannot facilitate.
pub type UnavailabilityMap = BTreeMap<String, BTreeSet<u32>>;

/// Checks the engine's preconditions: a non-empty list of unique members and
/// unavailability months within 1-12.
pub fn validate_inputs(
    members: &[String],
    unavailable: &UnavailabilityMap,
) -> Result<(), RosterError> {
    if members.is_empty() {
        return Err(RosterError::NoMembers);
    }

    let mut seen = HashSet::with_capacity(members.len());
    for member in members {
        if !seen.insert(member.as_str()) {
            return Err(RosterError::DuplicateMember(member.clone()));
        }
    }

    for (member, months) in unavailable {
        if let Some(&month) = months.iter().find(|month| !(1..=12).contains(*month)) {
            return Err(RosterError::InvalidMonth {
                member: member.clone(),
                month,
            });
        }
        if !seen.contains(member.as_str()) {
            debug!(member = %member, "Ignoring unavailability for non-member");
        }
    }

    Ok(())
}

/// Assigns a facilitator to every date in `dates`, preserving their order.
///
/// With `avoid_back_to_back`, the members who took the previous two dates are not
/// eligible. A `TBA` outcome never excludes anyone. When nobody is eligible the date is
/// left unassigned and no count changes.
///
/// `dates` must be strictly increasing; a repeated or out-of-order date is rejected.
pub fn assign<R: Rng + ?Sized>(
    dates: &[NaiveDate],
    members: &[String],
    unavailable: &UnavailabilityMap,
    avoid_back_to_back: bool,
    rng: &mut R,
) -> Result<(Roster, AssignmentSummary), RosterError> {
    validate_inputs(members, unavailable)?;
    if let Some(pair) = dates.windows(2).find(|pair| pair[0] >= pair[1]) {
        return Err(RosterError::DatesNotIncreasing {
            previous: pair[0],
            date: pair[1],
        });
    }

    let mut counts: HashMap<&str, usize> = members.iter().map(|m| (m.as_str(), 0)).collect();
    let mut one_back: Option<&str> = None;
    let mut two_back: Option<&str> = None;
    let mut entries = Vec::with_capacity(dates.len());

    for &date in dates {
        let month = date.month();
        let eligible: Vec<&str> = members
            .iter()
            .map(String::as_str)
            .filter(|member| {
                !unavailable
                    .get(*member)
                    .is_some_and(|months| months.contains(&month))
            })
            .filter(|member| {
                !avoid_back_to_back || (one_back != Some(*member) && two_back != Some(*member))
            })
            .collect();

        let chosen = pick_least_assigned(&eligible, &counts, rng);
        match chosen {
            Some(name) => {
                if let Some(count) = counts.get_mut(name) {
                    *count += 1;
                }
            }
            None => debug!(%date, "No eligible facilitator"),
        }

        two_back = one_back;
        one_back = chosen;
        entries.push(RosterEntry {
            date,
            assignee: chosen.map_or(Assignee::Unassigned, |name| {
                Assignee::Member(name.to_string())
            }),
        });
    }

    let roster = Roster::from_entries(entries);
    let summary = AssignmentSummary::from_counts(members, &counts);
    debug!(
        dates = roster.len(),
        unassigned = roster.unassigned_dates().len(),
        avoid_back_to_back,
        "Roster assigned"
    );
    Ok((roster, summary))
}

fn pick_least_assigned<'a, R: Rng + ?Sized>(
    eligible: &[&'a str],
    counts: &HashMap<&str, usize>,
    rng: &mut R,
) -> Option<&'a str> {
    let count_of = |member: &str| counts.get(member).copied().unwrap_or(0);
    let min_count = eligible.iter().map(|member| count_of(*member)).min()?;
    let tied: Vec<&'a str> = eligible
        .iter()
        .copied()
        .filter(|member| count_of(*member) == min_count)
        .collect();
    tied.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::enumerate;
    use crate::roster::summarize;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn members(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn weekly_dates(count: usize) -> Vec<NaiveDate> {
        let start = date(2025, 1, 7);
        (0..count)
            .map(|i| start + chrono::Duration::weeks(i as i64))
            .collect()
    }

    fn january_with_a_away(avoid_back_to_back: bool) -> (Roster, AssignmentSummary) {
        let mut unavailable = UnavailabilityMap::new();
        unavailable.insert("A".to_string(), BTreeSet::from([1]));
        let mut rng = StdRng::seed_from_u64(7);
        assign(
            &[date(2025, 1, 7), date(2025, 1, 14)],
            &members(&["A", "B"]),
            &unavailable,
            avoid_back_to_back,
            &mut rng,
        )
        .unwrap()
    }

    #[test]
    fn test_unavailable_member_leaves_back_to_back_slot_empty() {
        // A is out all January; B took the previous date so the second one stays open.
        let (roster, summary) = january_with_a_away(true);
        let labels: Vec<&str> = roster.iter().map(|e| e.assignee.label()).collect();
        assert_eq!(labels, vec!["B", "TBA"]);
        assert_eq!(summary.count_for("A"), Some(0));
        assert_eq!(summary.count_for("B"), Some(1));
    }

    #[test]
    fn test_unavailable_member_skipped_without_back_to_back_avoidance() {
        let (roster, summary) = january_with_a_away(false);
        let labels: Vec<&str> = roster.iter().map(|e| e.assignee.label()).collect();
        assert_eq!(labels, vec!["B", "B"]);
        assert_eq!(summary.count_for("A"), Some(0));
        assert_eq!(summary.count_for("B"), Some(2));
    }

    #[test]
    fn test_two_members_exhaust_back_to_back_window() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let dates = weekly_dates(4);
            let (roster, summary) = assign(
                &dates,
                &members(&["A", "B"]),
                &UnavailabilityMap::new(),
                true,
                &mut rng,
            )
            .unwrap();

            let entries = roster.entries();
            let first = entries[0].assignee.clone();
            let second = entries[1].assignee.clone();
            assert!(!first.is_unassigned());
            assert!(!second.is_unassigned());
            assert_ne!(first, second);
            assert_eq!(entries[2].assignee, Assignee::Unassigned);
            // The TBA frees the window: only the second-date member is still two back.
            assert_eq!(entries[3].assignee, first);
            assert_eq!(summary.total(), 3);
        }
    }

    #[test]
    fn test_no_repeats_within_two_dates_when_enough_members() {
        for seed in 0..25 {
            let mut rng = StdRng::seed_from_u64(seed);
            let dates = weekly_dates(40);
            let (roster, _) = assign(
                &dates,
                &members(&["A", "B", "C", "D"]),
                &UnavailabilityMap::new(),
                true,
                &mut rng,
            )
            .unwrap();

            let labels: Vec<&str> = roster.iter().map(|e| e.assignee.label()).collect();
            assert!(!labels.contains(&"TBA"));
            for i in 1..labels.len() {
                assert_ne!(labels[i], labels[i - 1], "back-to-back at {i}");
                if i >= 2 {
                    assert_ne!(labels[i], labels[i - 2], "two-apart repeat at {i}");
                }
            }
        }
    }

    #[test]
    fn test_counts_stay_within_one_without_constraints() {
        let roster_members = members(&["A", "B", "C", "D", "E"]);
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let (_, summary) = assign(
                &weekly_dates(103),
                &roster_members,
                &UnavailabilityMap::new(),
                false,
                &mut rng,
            )
            .unwrap();
            assert!(summary.spread() <= 1, "spread {}", summary.spread());
            assert_eq!(summary.total(), 103);
        }
    }

    #[test]
    fn test_roster_matches_dates_and_summary_matches_roster() {
        let dates = enumerate(2025, 1, &BTreeSet::from([0, 2])).unwrap();
        let roster_members = members(&["A", "B", "C"]);
        let mut unavailable = UnavailabilityMap::new();
        unavailable.insert("A".to_string(), BTreeSet::from([3, 4, 5]));
        unavailable.insert("B".to_string(), BTreeSet::from([4, 5]));
        let mut rng = StdRng::seed_from_u64(99);

        let (roster, summary) =
            assign(&dates, &roster_members, &unavailable, true, &mut rng).unwrap();

        assert_eq!(roster.dates(), dates);
        let assigned = roster.iter().filter(|e| !e.assignee.is_unassigned()).count();
        assert_eq!(summary.total(), assigned);
        assert_eq!(summary, summarize(&roster, &roster_members));
        for entry in &roster {
            if let Some(name) = entry.assignee.member() {
                let blocked = unavailable
                    .get(name)
                    .is_some_and(|months| months.contains(&entry.date.month()));
                assert!(!blocked, "{name} assigned during an unavailable month");
            }
        }
    }

    #[test]
    fn test_least_assigned_member_is_preferred() {
        // C is out in January, so after two January dates C has the lowest count.
        let mut unavailable = UnavailabilityMap::new();
        unavailable.insert("C".to_string(), BTreeSet::from([1]));
        let dates = [date(2025, 1, 7), date(2025, 1, 14), date(2025, 2, 4)];

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let (roster, _) = assign(
                &dates,
                &members(&["A", "B", "C"]),
                &unavailable,
                false,
                &mut rng,
            )
            .unwrap();
            assert_eq!(roster.entries()[2].assignee.label(), "C");
        }
    }

    #[test]
    fn test_ties_are_broken_randomly() {
        let roster_members = members(&["A", "B", "C"]);
        let mut seen = HashSet::new();
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let (roster, _) = assign(
                &[date(2025, 1, 7)],
                &roster_members,
                &UnavailabilityMap::new(),
                true,
                &mut rng,
            )
            .unwrap();
            seen.insert(roster.entries()[0].assignee.label().to_string());
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_same_seed_same_roster() {
        let dates = weekly_dates(12);
        let roster_members = members(&["A", "B", "C", "D"]);
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            assign(&dates, &roster_members, &UnavailabilityMap::new(), true, &mut rng)
                .unwrap()
                .0
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_empty_dates_yield_zero_summary() {
        let mut rng = StdRng::seed_from_u64(1);
        let (roster, summary) = assign(
            &[],
            &members(&["A", "B"]),
            &UnavailabilityMap::new(),
            true,
            &mut rng,
        )
        .unwrap();

        assert!(roster.is_empty());
        assert_eq!(summary.rows().len(), 2);
        assert_eq!(summary.total(), 0);
    }

    #[test]
    fn test_empty_members_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = assign(
            &weekly_dates(2),
            &[],
            &UnavailabilityMap::new(),
            true,
            &mut rng,
        )
        .unwrap_err();
        assert!(matches!(err, RosterError::NoMembers));
    }

    #[test]
    fn test_duplicate_members_rejected() {
        let err = validate_inputs(&members(&["A", "B", "A"]), &UnavailabilityMap::new())
            .unwrap_err();
        assert!(matches!(err, RosterError::DuplicateMember(name) if name == "A"));
    }

    #[test]
    fn test_out_of_range_month_rejected() {
        let mut unavailable = UnavailabilityMap::new();
        unavailable.insert("A".to_string(), BTreeSet::from([0, 4]));
        let err = validate_inputs(&members(&["A"]), &unavailable).unwrap_err();
        assert!(matches!(err, RosterError::InvalidMonth { month: 0, .. }));

        unavailable.insert("A".to_string(), BTreeSet::from([13]));
        let err = validate_inputs(&members(&["A"]), &unavailable).unwrap_err();
        assert!(matches!(err, RosterError::InvalidMonth { month: 13, .. }));
    }

    #[test]
    fn test_repeated_or_unordered_dates_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let names = members(&["A", "B", "C"]);

        let repeated = [date(2025, 1, 7), date(2025, 1, 7)];
        let err = assign(&repeated, &names, &UnavailabilityMap::new(), true, &mut rng)
            .unwrap_err();
        assert!(matches!(
            err,
            RosterError::DatesNotIncreasing { date, .. } if date == repeated[1]
        ));

        let unordered = [date(2025, 1, 21), date(2025, 1, 7)];
        let err = assign(&unordered, &names, &UnavailabilityMap::new(), true, &mut rng)
            .unwrap_err();
        assert!(matches!(
            err,
            RosterError::DatesNotIncreasing { previous, date }
                if previous == unordered[0] && date == unordered[1]
        ));
    }
}
