//! Error types for the footfall reduction pipeline.
//!
//! This module defines one error family per pipeline concern:
//!
//! - [`InputError`] - Opening, reading and decoding the source file
//! - [`SchemaError`] - Mandatory header columns are absent
//! - [`RowError`] - A data row cannot be projected or normalized
//! - [`IntervalError`] - An interval index outside `[0,47]`
//! - [`OutputError`] - Writing reduced, normalized or summary tables
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

use crate::schema::Field;

// =============================================================================
// Input Errors
// =============================================================================

/// Errors while acquiring and reading the source file.
#[derive(Debug, Error)]
pub enum InputError {
    /// The named input file cannot be opened.
    #[error("Cannot open input file '{path}': {source}")]
    MissingInput {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading from an already opened stream failed.
    #[error("Failed to read input: {0}")]
    Read(#[from] std::io::Error),

    /// No header row.
    #[error("Input is empty: no header row found")]
    Empty,
}

// =============================================================================
// Schema Errors
// =============================================================================

/// One or more mandatory columns are absent from the header row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Missing mandatory column(s): {}", join_fields(.missing))]
pub struct SchemaError {
    pub missing: Vec<Field>,
}

fn join_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| f.header())
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Row Errors
// =============================================================================

/// A data row that cannot be carried through the pipeline.
///
/// Rows are never skipped: a skipped row would break the adjacency
/// assumptions of deduplication and run aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    /// Row is shorter than the resolved schema requires.
    #[error("Line {line}: expected at least {required} fields, found {found}")]
    Malformed {
        line: usize,
        required: usize,
        found: usize,
    },

    /// The combined date-time field has no time component.
    #[error("Line {line}: cannot split date and time in '{value}'")]
    DateTime { line: usize, value: String },

    /// The time component is not a valid `HH:MM` clock time.
    #[error("Line {line}: invalid clock time '{value}'")]
    Clock { line: usize, value: String },
}

// =============================================================================
// Interval Errors
// =============================================================================

/// Errors converting between interval indices and clock ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IntervalError {
    #[error("Invalid time slice {0}: expected 0-47")]
    OutOfRange(i64),
}

// =============================================================================
// Output Errors
// =============================================================================

/// Errors while serializing result tables.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV writer error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors.
///
/// This is the error type returned by [`crate::transform::pipeline::extract_and_reduce`]
/// and [`crate::transform::pipeline::run_file`]. Each fatal class maps to a
/// distinct process exit status through [`PipelineError::exit_code`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Row error: {0}")]
    Row(#[from] RowError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),
}

impl PipelineError {
    /// Process exit status for this failure class.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Input(InputError::Empty) => 2,
            PipelineError::Input(_) => 1,
            PipelineError::Schema(_) => 2,
            PipelineError::Row(_) => 3,
            PipelineError::Output(_) => 4,
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for input operations.
pub type InputResult<T> = Result<T, InputError>;

/// Result type for row-level operations.
pub type RowResult<T> = Result<T, RowError>;

/// Result type for output operations.
pub type OutputResult<T> = Result<T, OutputError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
