//! High-level pipeline API.
//!
//! Combines every stage, in order, each consuming the previous stage's table:
//!
//! ```text
//! stream ─▶ tokenize ─▶ resolve ─▶ project ─▶ dedupe ─▶ normalize ─▶ aggregate
//!           └────────────── extract_and_reduce ──────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use footfall::transform::pipeline::{run_file, PipelineOptions};
//!
//! let output = run_file("PointOfSaleSimulation.csv", &PipelineOptions::default())?;
//! println!("{} visits, {} summary rows", output.reduced.visits.len(), output.runs.map_or(0, |r| r.len()));
//! ```

use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

use super::aggregate::{aggregate_global, aggregate_runs, AggregationPolicy, GlobalSummary, SummaryRow};
use super::dedupe::{dedupe, strip_witness};
use super::projector::project_table;
use super::temporal::normalize;
use crate::config::DEFAULT_DELIMITER;
use crate::error::PipelineResult;
use crate::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::models::{NormalizedRow, VisitRow};
use crate::parser::{read_table, read_table_file, RawTable};
use crate::schema::Schema;

/// Options for a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Input field delimiter
    pub delimiter: char,

    /// Collapse redundant line items when witness columns are present
    pub deduplicate: bool,

    /// Aggregations to compute after normalization
    pub policies: Vec<AggregationPolicy>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            deduplicate: true,
            policies: vec![AggregationPolicy::Runs, AggregationPolicy::Global],
        }
    }
}

/// Source file information
#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    /// Data rows read, header excluded
    pub row_count: usize,
    /// Whether redundant line items were collapsed
    pub deduplicated: bool,
}

/// Output of [`extract_and_reduce`]: one row per visit, canonical columns.
#[derive(Debug, Clone)]
pub struct ReducedTable {
    pub schema: Schema,
    pub visits: Vec<VisitRow>,
    pub info: SourceInfo,
}

/// Everything a full run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub reduced: ReducedTable,
    pub normalized: Vec<NormalizedRow>,
    /// Present when [`AggregationPolicy::Runs`] was requested
    pub runs: Option<Vec<SummaryRow>>,
    /// Present when [`AggregationPolicy::Global`] was requested
    pub global: Option<GlobalSummary>,
}

/// Read a stream to exhaustion and reduce it with default options.
pub fn extract_and_reduce<R: Read>(reader: R) -> PipelineResult<ReducedTable> {
    extract_and_reduce_with(reader, &PipelineOptions::default())
}

/// Read a stream to exhaustion and reduce it.
pub fn extract_and_reduce_with<R: Read>(
    reader: R,
    options: &PipelineOptions,
) -> PipelineResult<ReducedTable> {
    log_info("📖 Extracting data...");
    let table = read_table(reader, options.delimiter)?;
    reduce(table, options)
}

/// Project and deduplicate an already loaded table.
pub fn reduce(table: RawTable, options: &PipelineOptions) -> PipelineResult<ReducedTable> {
    let encoding = table.encoding.clone();
    let headers = table.header.clone();
    let row_count = table.rows.len();
    log_success(format!("Read {} rows ({})", row_count, encoding));

    log_info("Removing irrelevant data...");
    let (schema, projected) = project_table(table, options.deduplicate)?;

    let deduplicated = options.deduplicate && schema.deduplicates();
    let visits = if deduplicated {
        log_info("Eliminating redundancies...");
        dedupe(projected)
    } else {
        if options.deduplicate {
            log_warning("No dwell/attention columns: rows are assumed to be one per visit");
        }
        strip_witness(projected)
    };
    log_info_indent(format!("{} rows → {} visits", row_count, visits.len()), 1);

    Ok(ReducedTable {
        schema,
        visits,
        info: SourceInfo {
            encoding,
            delimiter: options.delimiter,
            headers,
            row_count,
            deduplicated,
        },
    })
}

/// Run every stage on a stream.
pub fn run<R: Read>(reader: R, options: &PipelineOptions) -> PipelineResult<PipelineOutput> {
    let reduced = extract_and_reduce_with(reader, options)?;
    finish(reduced, options)
}

/// Open, read and close a source file, then run every stage.
pub fn run_file<P: AsRef<Path>>(path: P, options: &PipelineOptions) -> PipelineResult<PipelineOutput> {
    log_info(format!("📄 Processing: {}", path.as_ref().display()));
    let table = read_table_file(path, options.delimiter)?;
    let reduced = reduce(table, options)?;
    finish(reduced, options)
}

fn finish(reduced: ReducedTable, options: &PipelineOptions) -> PipelineResult<PipelineOutput> {
    log_info("⚙️  Normalizing dates and times...");
    let normalized = normalize(reduced.visits.clone())?;
    log_success(format!("{} visits normalized", normalized.len()));

    let runs = options
        .policies
        .contains(&AggregationPolicy::Runs)
        .then(|| {
            let runs = aggregate_runs(&normalized);
            log_success(format!("{} time slices", runs.len()));
            runs
        });

    let global = options
        .policies
        .contains(&AggregationPolicy::Global)
        .then(|| {
            let global = aggregate_global(&normalized);
            log_success(format!("Averages over {} distinct dates", global.distinct_dates));
            global
        });

    Ok(PipelineOutput {
        reduced,
        normalized,
        runs,
        global,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PipelineError, RowError};
    use crate::logs::LOG_BROADCASTER;

    const SAMPLE: &str = "\
CustomerAgeId,CustomerGenderId,CustomerDwellTime (s),CustomerAttentionTime (s),Datetime,DayOfWeek
2,1,40,12,2016-02-01 09:15,Monday
2,1,40,12,2016-02-01 09:15,Monday
3,2,25,8,2016-02-01 09:45,Monday
1,1,10,2,2016-02-02 10:05,Tuesday
";

    fn quiet() {
        LOG_BROADCASTER.set_quiet(true);
    }

    #[test]
    fn test_default_options() {
        let opts = PipelineOptions::default();
        assert_eq!(opts.delimiter, ',');
        assert!(opts.deduplicate);
        assert_eq!(opts.policies.len(), 2);
    }

    #[test]
    fn test_extract_and_reduce_collapses_line_items() {
        quiet();
        let reduced = extract_and_reduce(SAMPLE.as_bytes()).unwrap();

        assert!(reduced.info.deduplicated);
        assert_eq!(reduced.info.row_count, 4);
        assert_eq!(reduced.visits.len(), 3);
        assert_eq!(
            reduced.visits[0].fields(),
            ["2", "1", "2016-02-01 09:15", "Monday"]
        );
    }

    #[test]
    fn test_end_to_end_runs() {
        quiet();
        let output = run(SAMPLE.as_bytes(), &PipelineOptions::default()).unwrap();

        let intervals: Vec<u8> = output.normalized.iter().map(|r| r.interval.index()).collect();
        assert_eq!(intervals, vec![18, 19, 20]);

        let runs = output.runs.unwrap();
        assert_eq!(runs.len(), 3);
        for run in &runs {
            assert_eq!(run.counts.total, 1);
        }
        assert_eq!(runs[0].date, "2016-02-01");
        assert_eq!(runs[0].time_slice(), "0900-0930");
        assert_eq!(runs[1].time_slice(), "0930-1000");
        assert_eq!(runs[2].date, "2016-02-02");
        assert_eq!(runs[2].day.index(), Some(2));
        assert_eq!(runs[2].counts.children, 1);

        let global = output.global.unwrap();
        assert_eq!(global.distinct_dates, 2);
    }

    #[test]
    fn test_without_witness_rows_are_kept() {
        quiet();
        let content = "CustomerAgeId,CustomerGenderId,Datetime,DayOfWeek\n\
                       2,1,2016-02-01 09:15,Monday\n\
                       2,1,2016-02-01 09:15,Monday\n";
        let reduced = extract_and_reduce(content.as_bytes()).unwrap();
        assert!(!reduced.info.deduplicated);
        assert_eq!(reduced.visits.len(), 2);
    }

    #[test]
    fn test_whitespace_line_stops_batch() {
        quiet();
        let content = "CustomerAgeId,CustomerGenderId,Datetime,DayOfWeek\n\
                       2,1,2016-02-01 09:15,Monday\n   \n\
                       2,1,2016-02-01 09:15,Monday\n";
        let err = extract_and_reduce(content.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Row(RowError::Malformed { line: 3, found: 1, .. })
        ));
    }

    #[test]
    fn test_dedupe_disabled_by_option() {
        quiet();
        let options = PipelineOptions {
            deduplicate: false,
            ..PipelineOptions::default()
        };
        let reduced = extract_and_reduce_with(SAMPLE.as_bytes(), &options).unwrap();
        assert_eq!(reduced.visits.len(), 4);
    }

    #[test]
    fn test_schema_error_aborts() {
        quiet();
        let err = extract_and_reduce("CustomerAgeId,Datetime\n1,2016-02-01 09:15\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, PipelineError::Schema(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_bad_time_stops_batch() {
        quiet();
        let content = "CustomerAgeId,CustomerGenderId,Datetime,DayOfWeek\n\
                       2,1,2016-02-01 09:15,Monday\n\
                       2,1,2016-02-01,Monday\n";
        let err = run(content.as_bytes(), &PipelineOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Row(RowError::DateTime { line: 3, .. })));
    }

    #[test]
    fn test_only_requested_policies() {
        quiet();
        let options = PipelineOptions {
            policies: vec![AggregationPolicy::Global],
            ..PipelineOptions::default()
        };
        let output = run(SAMPLE.as_bytes(), &options).unwrap();
        assert!(output.runs.is_none());
        assert!(output.global.is_some());
    }

    #[test]
    fn test_run_file() {
        quiet();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pos.csv");
        std::fs::write(&path, SAMPLE).unwrap();

        let output = run_file(&path, &PipelineOptions::default()).unwrap();
        assert_eq!(output.reduced.visits.len(), 3);

        let err = run_file(dir.path().join("missing.csv"), &PipelineOptions::default()).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }
}
