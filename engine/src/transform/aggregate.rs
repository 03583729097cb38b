//! Aggregate normalized visits into population counts.
//!
//! Two policies are available:
//!
//! - [`AggregationPolicy::Runs`] - one [`SummaryRow`] per contiguous run of
//!   identical `(date, interval)`. A linear merge, not a group-by: input must
//!   already be ordered, and a key that recurs later starts a new row.
//! - [`AggregationPolicy::Global`] - per day-of-week and per interval-of-day
//!   totals, averaged over the number of distinct dates observed.
//!
//! ```text
//! 2016-02-01 Mon 18 ─┐
//! 2016-02-01 Mon 18 ─┴─▶ 2016-02-01,Monday,1,0900-0930,18,2,...
//! 2016-02-01 Mon 19 ───▶ 2016-02-01,Monday,1,0930-1000,19,1,...
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::temporal::convert_time_slice;
use crate::models::{AgeGroup, DayCode, Gender, Interval, NormalizedRow, INTERVALS_PER_DAY};

/// Number of day-of-week buckets.
pub const DAYS_PER_WEEK: usize = 7;

/// How normalized rows are reduced to summary rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationPolicy {
    Runs,
    Global,
}

/// Result of [`aggregate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "policy", content = "data", rename_all = "lowercase")]
pub enum Aggregation {
    Runs(Vec<SummaryRow>),
    Global(GlobalSummary),
}

/// Aggregate with the chosen policy.
pub fn aggregate(rows: &[NormalizedRow], policy: AggregationPolicy) -> Aggregation {
    match policy {
        AggregationPolicy::Runs => Aggregation::Runs(aggregate_runs(rows)),
        AggregationPolicy::Global => Aggregation::Global(aggregate_global(rows)),
    }
}

// =============================================================================
// Counters
// =============================================================================

/// Visit counts split by demographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicCounts {
    pub total: u32,
    pub males: u32,
    pub females: u32,
    pub children: u32,
    pub young_adults: u32,
    pub adults: u32,
    pub seniors: u32,
}

impl DemographicCounts {
    /// Count one visit. Unknown codes only increase the total.
    pub fn record(&mut self, age: &AgeGroup, gender: &Gender) {
        self.total += 1;

        match age {
            AgeGroup::Child => self.children += 1,
            AgeGroup::YoungAdult => self.young_adults += 1,
            AgeGroup::Adult => self.adults += 1,
            AgeGroup::Senior => self.seniors += 1,
            AgeGroup::Unknown(_) => {}
        }

        match gender {
            Gender::Male => self.males += 1,
            Gender::Female => self.females += 1,
            Gender::Unknown(_) => {}
        }
    }

    /// Values in output column order: total, males, females, children,
    /// young adults, adults, seniors.
    pub fn values(&self) -> [u32; 7] {
        [
            self.total,
            self.males,
            self.females,
            self.children,
            self.young_adults,
            self.adults,
            self.seniors,
        ]
    }
}

// =============================================================================
// Run-based aggregation
// =============================================================================

/// One contiguous run of visits sharing a date and interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
    pub date: String,
    pub day: DayCode,
    pub interval: Interval,
    #[serde(flatten)]
    pub counts: DemographicCounts,
}

impl SummaryRow {
    /// Slot within the week, `day * 48 + interval`, in `[0,335]`.
    pub fn week_slot(&self) -> Option<u16> {
        self.day
            .index()
            .map(|d| d as u16 * INTERVALS_PER_DAY as u16 + self.interval.index() as u16)
    }

    /// Clock range of the interval, e.g. `1730-1800`.
    pub fn time_slice(&self) -> String {
        convert_time_slice(self.interval.index() as i64)
    }
}

/// Emit one summary row per contiguous `(date, interval)` run.
pub fn aggregate_runs(rows: &[NormalizedRow]) -> Vec<SummaryRow> {
    let mut summaries = Vec::new();
    let mut current: Option<RunBuilder> = None;

    for row in rows {
        if let Some(run) = current.as_mut() {
            if run.matches(row) {
                run.add(row);
                continue;
            }
        }

        if let Some(done) = current.take() {
            summaries.push(done.build());
        }
        let mut run = RunBuilder::new(row);
        run.add(row);
        current = Some(run);
    }

    if let Some(done) = current {
        summaries.push(done.build());
    }

    summaries
}

/// Builder accumulating one run.
struct RunBuilder {
    date: String,
    day: DayCode,
    interval: Interval,
    counts: DemographicCounts,
}

impl RunBuilder {
    /// The run takes its date, day and interval from its first row.
    fn new(row: &NormalizedRow) -> Self {
        Self {
            date: row.date.clone(),
            day: row.day.clone(),
            interval: row.interval,
            counts: DemographicCounts::default(),
        }
    }

    fn matches(&self, row: &NormalizedRow) -> bool {
        row.date == self.date && row.interval == self.interval
    }

    fn add(&mut self, row: &NormalizedRow) {
        self.counts.record(&row.age, &row.gender);
    }

    fn build(self) -> SummaryRow {
        SummaryRow {
            date: self.date,
            day: self.day,
            interval: self.interval,
            counts: self.counts,
        }
    }
}

// =============================================================================
// Global aggregation
// =============================================================================

/// Totals per day-of-week and per interval-of-day over the whole table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSummary {
    /// Indexed by day, Sunday=0
    pub days: Vec<DemographicCounts>,
    /// Distinct dates observed on each day of the week
    pub day_dates: Vec<u32>,
    /// Indexed by interval, 0-47
    pub intervals: Vec<DemographicCounts>,
    /// Distinct dates in the whole table
    pub distinct_dates: u32,
    /// Rows whose day name was not recognized; counted in intervals only
    pub unrecognized_days: u32,
}

/// Averages for one bucket; `NaN` when no date was observed for it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicAverages {
    pub total: f64,
    pub males: f64,
    pub females: f64,
    pub children: f64,
    pub young_adults: f64,
    pub adults: f64,
    pub seniors: f64,
}

impl DemographicAverages {
    pub fn from_counts(counts: &DemographicCounts, dates: u32) -> Self {
        let avg = |n: u32| {
            if dates == 0 {
                f64::NAN
            } else {
                n as f64 / dates as f64
            }
        };

        Self {
            total: avg(counts.total),
            males: avg(counts.males),
            females: avg(counts.females),
            children: avg(counts.children),
            young_adults: avg(counts.young_adults),
            adults: avg(counts.adults),
            seniors: avg(counts.seniors),
        }
    }

    /// Whether the bucket had no observed date.
    pub fn is_undefined(&self) -> bool {
        self.total.is_nan()
    }

    /// Values in the same column order as [`DemographicCounts::values`].
    pub fn values(&self) -> [f64; 7] {
        [
            self.total,
            self.males,
            self.females,
            self.children,
            self.young_adults,
            self.adults,
            self.seniors,
        ]
    }
}

/// One averaged bucket of a [`GlobalSummary`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketAverage {
    /// Day index (0-6) or interval index (0-47)
    pub index: u8,
    /// Denominator used for the averages
    pub dates: u32,
    pub averages: DemographicAverages,
}

impl GlobalSummary {
    fn empty() -> Self {
        Self {
            days: vec![DemographicCounts::default(); DAYS_PER_WEEK],
            day_dates: vec![0; DAYS_PER_WEEK],
            intervals: vec![DemographicCounts::default(); INTERVALS_PER_DAY],
            distinct_dates: 0,
            unrecognized_days: 0,
        }
    }

    /// Day-of-week averages, divided by the dates seen on that day.
    pub fn day_averages(&self) -> Vec<BucketAverage> {
        self.days
            .iter()
            .zip(&self.day_dates)
            .enumerate()
            .map(|(i, (counts, &dates))| BucketAverage {
                index: i as u8,
                dates,
                averages: DemographicAverages::from_counts(counts, dates),
            })
            .collect()
    }

    /// Interval averages, divided by every distinct date in the table.
    pub fn interval_averages(&self) -> Vec<BucketAverage> {
        self.intervals
            .iter()
            .enumerate()
            .map(|(i, counts)| BucketAverage {
                index: i as u8,
                dates: self.distinct_dates,
                averages: DemographicAverages::from_counts(counts, self.distinct_dates),
            })
            .collect()
    }
}

/// Accumulate per-day and per-interval totals in a single pass.
///
/// Row order does not matter here.
pub fn aggregate_global(rows: &[NormalizedRow]) -> GlobalSummary {
    let mut summary = GlobalSummary::empty();
    let mut dates: HashSet<&str> = HashSet::new();
    let mut dated_days: HashSet<(u8, &str)> = HashSet::new();

    for row in rows {
        if dates.insert(row.date.as_str()) {
            summary.distinct_dates += 1;
        }

        summary.intervals[row.interval.index() as usize].record(&row.age, &row.gender);

        match row.day.index() {
            Some(day) => {
                if dated_days.insert((day, row.date.as_str())) {
                    summary.day_dates[day as usize] += 1;
                }
                summary.days[day as usize].record(&row.age, &row.gender);
            }
            None => summary.unrecognized_days += 1,
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(date: &str, day: &str, interval: u8, age: AgeGroup, gender: Gender) -> NormalizedRow {
        NormalizedRow {
            age,
            gender,
            date: date.into(),
            day: DayCode::from_name(day),
            interval: Interval::new(interval).unwrap(),
        }
    }

    #[test]
    fn test_runs_merge_contiguous_keys() {
        let rows = vec![
            row("2016-02-01", "Monday", 18, AgeGroup::Child, Gender::Male),
            row("2016-02-01", "Monday", 18, AgeGroup::Senior, Gender::Female),
            row("2016-02-01", "Monday", 19, AgeGroup::Adult, Gender::Male),
        ];

        let summaries = aggregate_runs(&rows);

        assert_eq!(summaries.len(), 2);
        let first = &summaries[0];
        assert_eq!(first.date, "2016-02-01");
        assert_eq!(first.interval.index(), 18);
        assert_eq!(first.counts.values(), [2, 1, 1, 1, 0, 0, 1]);
        assert_eq!(first.week_slot(), Some(66));
        assert_eq!(first.time_slice(), "0900-0930");
        assert_eq!(summaries[1].counts.total, 1);
    }

    #[test]
    fn test_runs_recurring_key_is_new_row() {
        let rows = vec![
            row("2016-02-01", "Monday", 18, AgeGroup::Child, Gender::Male),
            row("2016-02-01", "Monday", 19, AgeGroup::Child, Gender::Male),
            row("2016-02-01", "Monday", 18, AgeGroup::Child, Gender::Male),
        ];
        let summaries = aggregate_runs(&rows);
        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[0].interval, summaries[2].interval);
    }

    #[test]
    fn test_runs_date_change_splits_same_interval() {
        let rows = vec![
            row("2016-02-01", "Monday", 20, AgeGroup::Adult, Gender::Male),
            row("2016-02-08", "Monday", 20, AgeGroup::Adult, Gender::Male),
        ];
        assert_eq!(aggregate_runs(&rows).len(), 2);
    }

    #[test]
    fn test_runs_empty() {
        assert!(aggregate_runs(&[]).is_empty());
    }

    #[test]
    fn test_unknown_codes_count_toward_total_only() {
        let mut counts = DemographicCounts::default();
        counts.record(&AgeGroup::from_code("7"), &Gender::from_code(""));
        assert_eq!(counts.values(), [1, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_week_slot_absent_for_unrecognized_day() {
        let rows = vec![row("2016-02-03", "Wedsnday", 10, AgeGroup::Adult, Gender::Male)];
        let summaries = aggregate_runs(&rows);
        assert_eq!(summaries[0].week_slot(), None);
    }

    #[test]
    fn test_global_averages() {
        let rows = vec![
            row("2016-02-01", "Monday", 18, AgeGroup::Child, Gender::Male),
            row("2016-02-01", "Monday", 18, AgeGroup::Adult, Gender::Female),
            row("2016-02-08", "Monday", 18, AgeGroup::Adult, Gender::Female),
            row("2016-02-02", "Tuesday", 20, AgeGroup::Senior, Gender::Male),
        ];

        let summary = aggregate_global(&rows);
        assert_eq!(summary.distinct_dates, 3);
        assert_eq!(summary.day_dates[1], 2);
        assert_eq!(summary.day_dates[2], 1);

        let days = summary.day_averages();
        assert_eq!(days.len(), 7);
        assert_eq!(days[1].averages.total, 1.5);
        assert_eq!(days[1].averages.females, 1.0);
        assert_eq!(days[2].averages.seniors, 1.0);

        let intervals = summary.interval_averages();
        assert_eq!(intervals.len(), 48);
        assert_eq!(intervals[18].averages.total, 1.0);
        assert_eq!(intervals[18].averages.adults, 2.0 / 3.0);
        assert_eq!(intervals[0].averages.total, 0.0);
    }

    #[test]
    fn test_global_zero_dates_is_nan() {
        let rows = vec![row("2016-02-01", "Monday", 18, AgeGroup::Child, Gender::Male)];
        let summary = aggregate_global(&rows);

        let days = summary.day_averages();
        // Sunday never observed
        assert_eq!(days[0].dates, 0);
        assert!(days[0].averages.is_undefined());
        assert!(days[0].averages.values().iter().all(|v| v.is_nan()));
        assert!(!days[1].averages.is_undefined());
    }

    #[test]
    fn test_global_empty_table_is_all_nan() {
        let summary = aggregate_global(&[]);
        assert!(summary.interval_averages().iter().all(|b| b.averages.is_undefined()));
    }

    #[test]
    fn test_global_unrecognized_day_counts_in_intervals_only() {
        let rows = vec![row("2016-02-03", "Wedsnday", 24, AgeGroup::Adult, Gender::Male)];
        let summary = aggregate_global(&rows);
        assert_eq!(summary.unrecognized_days, 1);
        assert_eq!(summary.intervals[24].total, 1);
        assert!(summary.days.iter().all(|d| d.total == 0));
    }

    #[test]
    fn test_aggregate_dispatch() {
        let rows = vec![row("2016-02-01", "Monday", 18, AgeGroup::Child, Gender::Male)];
        assert!(matches!(aggregate(&rows, AggregationPolicy::Runs), Aggregation::Runs(r) if r.len() == 1));
        assert!(matches!(aggregate(&rows, AggregationPolicy::Global), Aggregation::Global(_)));
    }
}
