//! Column projection: keep only the recognized fields, in canonical order.
//!
//! ```text
//! Store,DayOfWeek,Datetime,CustomerAgeId,...      (header, dropped)
//! 12,Monday,2016-02-01 09:15,2,...           →    2,1,2016-02-01 09:15,Monday[,dwell,attention]
//! ```

use crate::error::{PipelineResult, RowError, RowResult};
use crate::logs::log_info;
use crate::models::{ProjectedRow, VisitRow, Witness};
use crate::parser::{RawRow, RawTable};
use crate::schema::Schema;

/// Rewrite every data row to the canonical column order.
///
/// The header never reaches the output. Witness columns are read only when
/// `include_redundancy` is set and the schema resolved both of them. A row
/// too short for the schema stops the whole projection.
pub fn project(
    table: RawTable,
    schema: &Schema,
    include_redundancy: bool,
) -> RowResult<Vec<ProjectedRow>> {
    let include_witness = include_redundancy && schema.deduplicates();
    let required = schema.required_width(include_witness);

    table
        .rows
        .into_iter()
        .map(|row| project_row(row, schema, include_witness, required))
        .collect()
}

/// Resolve the header, then project.
///
/// Schema problems are reported before any data row is looked at.
pub fn project_table(
    table: RawTable,
    include_redundancy: bool,
) -> PipelineResult<(Schema, Vec<ProjectedRow>)> {
    let schema = Schema::from_header(&table.header)?;
    log_info(format!(
        "Resolved columns: age={}, gender={}, datetime={}, day={}",
        schema.age, schema.gender, schema.datetime, schema.day
    ));

    let rows = project(table, &schema, include_redundancy)?;
    Ok((schema, rows))
}

fn project_row(
    row: RawRow,
    schema: &Schema,
    include_witness: bool,
    required: usize,
) -> RowResult<ProjectedRow> {
    let RawRow { line, mut fields } = row;

    if fields.len() < required {
        return Err(RowError::Malformed {
            line,
            required,
            found: fields.len(),
        });
    }

    // Every position maps to a distinct header cell, so each take is unique.
    let mut take = |i: usize| std::mem::take(&mut fields[i]);

    let visit = VisitRow {
        line,
        age: take(schema.age),
        gender: take(schema.gender),
        datetime: take(schema.datetime),
        day: take(schema.day),
    };

    let witness = match schema.witness {
        Some(cols) if include_witness => Some(Witness {
            dwell: take(cols.dwell),
            attention: take(cols.attention),
        }),
        _ => None,
    };

    Ok(ProjectedRow { visit, witness })
}
