//! Transformation module.
//!
//! Each stage consumes the previous stage's table:
//! - Projector: keep the visit columns, drop the rest
//! - Dedupe: collapse consecutive line items of one visit
//! - Temporal: split date/time, encode days, bucket into half hours
//! - Aggregate: count visits per slot, or average them over dates
//! - Pipeline: all of the above behind one call

pub mod aggregate;
pub mod dedupe;
pub mod pipeline;
pub mod projector;
pub mod temporal;

pub use aggregate::{
    aggregate, aggregate_global, aggregate_runs, Aggregation, AggregationPolicy, GlobalSummary,
    SummaryRow,
};
pub use dedupe::{dedupe, strip_witness};
pub use pipeline::{
    extract_and_reduce, extract_and_reduce_with, run, run_file, PipelineOptions, PipelineOutput,
    ReducedTable, SourceInfo,
};
pub use projector::{project, project_table};
pub use temporal::{convert_time_slice, normalize, quantize, time_slice, TimeSlice};
