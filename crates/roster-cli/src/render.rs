use chrono::NaiveDate;
use roster_core::{AssignmentSummary, MonthGroup, Roster, RosterOutcome, UNASSIGNED_LABEL};

const MONTHS_PER_ROW: usize = 3;
const COLUMN_GAP: &str = "    ";

/// Renders the roster as a month grid followed by gaps, skipped holidays and the summary.
pub fn render_outcome(outcome: &RosterOutcome) -> String {
    let mut out = render_month_grid(&outcome.roster);

    if !outcome.holidays_excluded.is_empty() {
        out.push_str(&format!(
            "\nSkipped public holidays: {}\n",
            join_dates(&outcome.holidays_excluded)
        ));
    }

    if outcome.relaxed {
        out.push_str("\nBack-to-back avoidance was relaxed to fill unassigned dates.\n");
    }

    let unassigned = outcome.unassigned_dates();
    if !unassigned.is_empty() {
        out.push_str(&format!(
            "\n{} date(s) left {UNASSIGNED_LABEL}: {}\n",
            unassigned.len(),
            join_dates(&unassigned)
        ));
        out.push_str(
            "Rerun with --relax to allow back-to-back assignments, or pin dates with --fix DATE=NAME.\n",
        );
    }

    out.push('\n');
    out.push_str(&render_summary(&outcome.summary));
    out
}

/// Lays months out side by side, three per row.
pub fn render_month_grid(roster: &Roster) -> String {
    let columns: Vec<Vec<String>> = roster.by_month().iter().map(month_column).collect();
    let mut out = String::new();

    for (index, row) in columns.chunks(MONTHS_PER_ROW).enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let widths: Vec<usize> = row
            .iter()
            .map(|column| column.iter().map(|line| line.chars().count()).max().unwrap_or(0))
            .collect();
        let height = row.iter().map(Vec::len).max().unwrap_or(0);

        for line_index in 0..height {
            let mut line = String::new();
            for (column, width) in row.iter().zip(&widths) {
                let cell = column.get(line_index).map(String::as_str).unwrap_or("");
                line.push_str(&format!("{cell:<width$}{COLUMN_GAP}"));
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }
    }

    out
}

fn month_column(group: &MonthGroup<'_>) -> Vec<String> {
    let mut lines = Vec::with_capacity(group.entries.len() + 1);
    lines.push(group.label.clone());
    lines.extend(
        group
            .entries
            .iter()
            .map(|entry| format!("{}: {}", entry.date.format("%d %a"), entry.assignee)),
    );
    lines
}

pub fn render_summary(summary: &AssignmentSummary) -> String {
    let width = summary
        .rows()
        .iter()
        .map(|row| row.member.chars().count())
        .max()
        .unwrap_or(0)
        .max("Member".len());

    let mut out = String::new();
    out.push_str(&format!("{:<width$}  # Assignments\n", "Member"));
    for row in summary.rows() {
        out.push_str(&format!("{:<width$}  {}\n", row.member, row.count));
    }
    out
}

pub fn render_dates(dates: &[NaiveDate]) -> String {
    dates
        .iter()
        .map(|date| format!("{}\n", date.format("%Y-%m-%d %a")))
        .collect()
}

fn join_dates(dates: &[NaiveDate]) -> String {
    dates
        .iter()
        .map(|date| date.format("%Y-%m-%d").to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use roster_core::{NoHolidays, RosterRequest, generate};

    use super::*;

    fn outcome(members: &[&str], weeks: &[usize]) -> RosterOutcome {
        let mut request = RosterRequest::new(
            2025,
            1,
            weeks.iter().copied().collect::<BTreeSet<_>>(),
            members.iter().map(|name| name.to_string()).collect(),
        );
        request.avoid_holidays = false;
        let mut rng = StdRng::seed_from_u64(7);
        generate(&request, &NoHolidays, &mut rng).unwrap()
    }

    #[test]
    fn test_month_grid_rows_of_three() {
        let outcome = outcome(&["Alice", "Bob", "Carol"], &[0]);
        let grid = render_month_grid(&outcome.roster);
        let lines: Vec<&str> = grid.lines().collect();

        assert!(lines[0].starts_with("Jan 2025"));
        assert!(lines[0].contains("Feb 2025"));
        assert!(lines[0].contains("Mar 2025"));
        assert!(!lines[0].contains("Apr 2025"));
        assert!(lines[1].starts_with("07 Tue: "));
        assert!(lines[1].contains("04 Tue: "));
        // Four rows of a header plus one meeting, separated by blank lines.
        assert_eq!(lines.len(), 4 * 2 + 3);
        assert!(lines[2].is_empty());
        assert!(lines[3].starts_with("Apr 2025"));
    }

    #[test]
    fn test_outcome_lists_unassigned_dates_with_hint() {
        let outcome = outcome(&["Alice", "Bob"], &[0, 2]);
        let text = render_outcome(&outcome);
        assert!(!outcome.unassigned_dates().is_empty());
        assert!(text.contains("left TBA"));
        assert!(text.contains("--relax"));
        assert!(text.contains("Member  # Assignments"));
    }

    #[test]
    fn test_outcome_notes_holidays_and_relaxed_run() {
        let mut outcome = outcome(&["Alice", "Bob", "Carol"], &[0]);
        outcome.holidays_excluded = vec![
            NaiveDate::from_ymd_opt(2025, 10, 7).unwrap(),
            NaiveDate::from_ymd_opt(2025, 12, 2).unwrap(),
        ];
        outcome.relaxed = true;

        let text = render_outcome(&outcome);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines.contains(&"Skipped public holidays: 2025-10-07, 2025-12-02"));
        assert!(lines.contains(&"Back-to-back avoidance was relaxed to fill unassigned dates."));
        assert!(!text.contains("left TBA"));
        // Twelve meetings over three members, four each.
        assert!(text.ends_with("Carol   4\n"));
    }

    #[test]
    fn test_summary_aligns_member_column() {
        let outcome = outcome(&["Alice", "Bartholomew", "Cy"], &[0]);
        let summary = render_summary(&outcome.summary);
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines[0], "Member       # Assignments");
        assert!(lines[1].starts_with("Alice        "));
        assert!(lines[3].starts_with("Cy           "));
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_render_dates() {
        let dates = vec![
            NaiveDate::from_ymd_opt(2025, 1, 7).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 21).unwrap(),
        ];
        assert_eq!(render_dates(&dates), "2025-01-07 Tue\n2025-01-21 Tue\n");
    }
}
