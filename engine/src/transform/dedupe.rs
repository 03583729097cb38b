//! Collapse line items of one transaction into a single visit.
//!
//! A sale with several items is exported as several consecutive rows that
//! are identical once projected (the dwell and attention witnesses
//! included). Only adjacency is checked:
//!
//! ```text
//! X X Y Y Y X   →   X Y X
//! ```
//!
//! Input must already be grouped by transaction. Two identical transactions
//! separated by another row are both kept.

use crate::models::{ProjectedRow, VisitRow};

/// Keep each row that differs from the row immediately before it, then strip its witness.
///
/// Comparison is against the previous *input* row, and ignores source line
/// numbers. The output is built fresh since it is expected to be much
/// smaller than the input.
pub fn dedupe(rows: Vec<ProjectedRow>) -> Vec<VisitRow> {
    let mut visits = Vec::new();
    let mut previous: Option<ProjectedRow> = None;

    for row in rows {
        if previous.as_ref().is_some_and(|p| p.same_record(&row)) {
            continue;
        }
        visits.push(row.visit.clone());
        previous = Some(row);
    }

    visits
}

/// Drop witnesses without collapsing anything.
///
/// Used when the source has no witness columns and is assumed to be
/// one row per visit already.
pub fn strip_witness(rows: Vec<ProjectedRow>) -> Vec<VisitRow> {
    rows.into_iter().map(|r| r.visit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Witness;

    fn row(line: usize, tag: &str) -> ProjectedRow {
        ProjectedRow {
            visit: VisitRow {
                line,
                age: "2".into(),
                gender: "1".into(),
                datetime: format!("2016-02-01 09:{}", tag),
                day: "Monday".into(),
            },
            witness: Some(Witness {
                dwell: "30".into(),
                attention: "5".into(),
            }),
        }
    }

    #[test]
    fn test_adjacency_only() {
        let rows = vec![
            row(2, "15"),
            row(3, "15"),
            row(4, "45"),
            row(5, "45"),
            row(6, "45"),
            row(7, "15"),
        ];

        let visits = dedupe(rows);

        let times: Vec<&str> = visits.iter().map(|v| v.datetime.as_str()).collect();
        assert_eq!(
            times,
            vec!["2016-02-01 09:15", "2016-02-01 09:45", "2016-02-01 09:15"]
        );
        // first line of each run is kept
        assert_eq!(visits.iter().map(|v| v.line).collect::<Vec<_>>(), vec![2, 4, 7]);
    }

    #[test]
    fn test_witness_difference_keeps_both() {
        let first = row(2, "15");
        let mut second = row(3, "15");
        second.witness = Some(Witness {
            dwell: "31".into(),
            attention: "5".into(),
        });

        let visits = dedupe(vec![first, second]);
        assert_eq!(visits.len(), 2);
        assert_eq!(visits[0].fields(), visits[1].fields());
    }

    #[test]
    fn test_empty_input() {
        assert!(dedupe(Vec::new()).is_empty());
    }

    #[test]
    fn test_strip_witness_keeps_every_row() {
        let visits = strip_witness(vec![row(2, "15"), row(3, "15")]);
        assert_eq!(visits.len(), 2);
    }
}
