//! # Footfall - point-of-sale visit reduction and population aggregation
//!
//! Footfall turns a point-of-sale camera export (one row per line item) into
//! one row per customer visit, buckets each visit into a half-hour slot and
//! counts customers by age group and gender.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  POS export │────▶│   Parser    │────▶│   Reduce    │────▶│  Aggregate  │
//! │  (ISO/UTF8) │     │  (auto-enc) │     │(proj+dedupe)│     │ (runs/avg)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use footfall::{run_file, PipelineOptions};
//!
//! let output = run_file("PointOfSaleSimulation.csv", &PipelineOptions::default())?;
//! println!("{} visits", output.reduced.visits.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types, one per failure class
//! - [`config`] - Defaults and environment overrides
//! - [`logs`] - Progress journal
//! - [`models`] - Row types of each stage
//! - [`parser`] - Input decoding and tokenizing
//! - [`schema`] - Header resolution
//! - [`transform`] - Projection, dedupe, normalization, aggregation
//! - [`output`] - CSV and JSON writers

// Core modules
pub mod config;
pub mod error;
pub mod logs;
pub mod models;

// Parsing
pub mod parser;
pub mod schema;

// Transformation
pub mod transform;

// Output
pub mod output;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    InputError, IntervalError, OutputError, PipelineError, PipelineResult, RowError, SchemaError,
};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{Config, ConfigError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    AgeGroup, DayCode, Gender, Interval, NormalizedRow, ProjectedRow, VisitRow, Witness,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{detect_encoding, read_table, read_table_file, tokenize, RawRow, RawTable};
pub use schema::{resolve, Field, Resolution, Schema};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::{
    aggregate, convert_time_slice, dedupe, extract_and_reduce, extract_and_reduce_with, normalize,
    project, quantize, run, run_file, time_slice, Aggregation, AggregationPolicy, GlobalSummary,
    PipelineOptions, PipelineOutput, ReducedTable, SummaryRow,
};
