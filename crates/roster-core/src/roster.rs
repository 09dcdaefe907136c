use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

use crate::error::RosterError;

/// Label written wherever a date has no facilitator.
pub const UNASSIGNED_LABEL: &str = "TBA";

pub const ROSTER_CSV_HEADER: [&str; 2] = ["Date", "Facilitator"];
pub const SUMMARY_CSV_HEADER: [&str; 2] = ["Member", "# Assignments"];

/// Outcome for a single meeting date.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Assignee {
    Member(String),
    Unassigned,
}

impl Assignee {
    pub fn member(&self) -> Option<&str> {
        match self {
            Assignee::Member(name) => Some(name.as_str()),
            Assignee::Unassigned => None,
        }
    }

    pub fn is_unassigned(&self) -> bool {
        matches!(self, Assignee::Unassigned)
    }

    pub fn label(&self) -> &str {
        self.member().unwrap_or(UNASSIGNED_LABEL)
    }
}

impl fmt::Display for Assignee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Assignee {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub date: NaiveDate,
    #[serde(rename = "facilitator")]
    pub assignee: Assignee,
}

/// One entry per meeting date, in the order the dates were supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

/// Entries of a single calendar month, labelled like `Jan 2025`.
#[derive(Debug, Clone)]
pub struct MonthGroup<'a> {
    pub label: String,
    pub entries: Vec<&'a RosterEntry>,
}

impl Roster {
    pub(crate) fn from_entries(entries: Vec<RosterEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &RosterEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&RosterEntry> {
        self.entries.iter().find(|entry| entry.date == date)
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.entries.iter().map(|entry| entry.date).collect()
    }

    pub fn unassigned_dates(&self) -> Vec<NaiveDate> {
        self.entries
            .iter()
            .filter(|entry| entry.assignee.is_unassigned())
            .map(|entry| entry.date)
            .collect()
    }

    /// Replaces the assignee of the entry for `date`, returning the previous outcome.
    pub fn set_assignee(
        &mut self,
        date: NaiveDate,
        assignee: Assignee,
    ) -> Result<Assignee, RosterError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.date == date)
            .ok_or(RosterError::DateNotInRoster(date))?;
        Ok(std::mem::replace(&mut entry.assignee, assignee))
    }

    /// Applies manual fixes keyed by date. Every name must belong to `members`.
    ///
    /// Validation happens before any entry changes, so a rejected batch leaves the
    /// roster untouched.
    pub fn apply_overrides(
        &mut self,
        overrides: &BTreeMap<NaiveDate, String>,
        members: &[String],
    ) -> Result<(), RosterError> {
        for (date, name) in overrides {
            if !members.iter().any(|member| member == name) {
                return Err(RosterError::UnknownMember(name.clone()));
            }
            if self.get(*date).is_none() {
                return Err(RosterError::DateNotInRoster(*date));
            }
        }

        for (date, name) in overrides {
            self.set_assignee(*date, Assignee::Member(name.clone()))?;
        }
        Ok(())
    }

    /// Groups entries by calendar month in roster order.
    pub fn by_month(&self) -> Vec<MonthGroup<'_>> {
        let mut groups: Vec<MonthGroup<'_>> = Vec::new();
        let mut current: Option<(i32, u32)> = None;
        for entry in &self.entries {
            let key = (entry.date.year(), entry.date.month());
            if current != Some(key) {
                groups.push(MonthGroup {
                    label: entry.date.format("%b %Y").to_string(),
                    entries: Vec::new(),
                });
                current = Some(key);
            }
            if let Some(group) = groups.last_mut() {
                group.entries.push(entry);
            }
        }
        groups
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), RosterError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(ROSTER_CSV_HEADER)?;
        for entry in &self.entries {
            let date = entry.date.format("%Y-%m-%d").to_string();
            wtr.write_record([date.as_str(), entry.assignee.label()])?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn save_csv(&self, path: &Path) -> Result<(), RosterError> {
        self.write_csv(File::create(path)?)
    }
}

impl<'a> IntoIterator for &'a Roster {
    type Item = &'a RosterEntry;
    type IntoIter = std::slice::Iter<'a, RosterEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub member: String,
    #[serde(rename = "assignments")]
    pub count: usize,
}

/// Assignment counts per member, in member-list order and including zero counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AssignmentSummary {
    rows: Vec<SummaryRow>,
}

impl AssignmentSummary {
    pub(crate) fn from_counts(members: &[String], counts: &HashMap<&str, usize>) -> Self {
        let rows = members
            .iter()
            .map(|member| SummaryRow {
                member: member.clone(),
                count: counts.get(member.as_str()).copied().unwrap_or(0),
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    pub fn count_for(&self, member: &str) -> Option<usize> {
        self.rows
            .iter()
            .find(|row| row.member == member)
            .map(|row| row.count)
    }

    pub fn total(&self) -> usize {
        self.rows.iter().map(|row| row.count).sum()
    }

    /// Difference between the most and least assigned members.
    pub fn spread(&self) -> usize {
        let max = self.rows.iter().map(|row| row.count).max().unwrap_or(0);
        let min = self.rows.iter().map(|row| row.count).min().unwrap_or(0);
        max - min
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), RosterError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(SUMMARY_CSV_HEADER)?;
        for row in &self.rows {
            let count = row.count.to_string();
            wtr.write_record([row.member.as_str(), count.as_str()])?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn save_csv(&self, path: &Path) -> Result<(), RosterError> {
        self.write_csv(File::create(path)?)
    }
}

/// Tallies the roster's facilitators over the full member list.
///
/// Names in the roster that are not in `members` are not counted.
pub fn summarize(roster: &Roster, members: &[String]) -> AssignmentSummary {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for name in roster.iter().filter_map(|entry| entry.assignee.member()) {
        *counts.entry(name).or_insert(0) += 1;
    }
    AssignmentSummary::from_counts(members, &counts)
}
