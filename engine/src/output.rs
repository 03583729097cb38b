//! Serialization of pipeline tables.
//!
//! | Table      | Header | Columns                                            |
//! |------------|--------|----------------------------------------------------|
//! | reduced    | no     | `age,gender,datetime,day`                          |
//! | normalized | no     | `age,gender,date,day,interval`                     |
//! | summary    | yes    | [`SUMMARY_HEADER`]                                 |
//! | averages   | yes    | day section, then interval section                 |
//!
//! All tables are comma separated, one row per line. Cells are written
//! as-is, never quoted or escaped.

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::OutputResult;
use crate::models::{day_name, weekday_from_index, NormalizedRow, VisitRow};
use crate::transform::aggregate::{BucketAverage, GlobalSummary, SummaryRow};
use crate::transform::temporal::convert_time_slice;

/// Header of the run summary table.
pub const SUMMARY_HEADER: [&str; 12] = [
    "Date",
    "Day",
    "Day ID",
    "Time",
    "Time ID",
    "Total Customers",
    "Males",
    "Females",
    "Children",
    "Young Adults",
    "Adults",
    "Seniors",
];

const AVERAGE_COLUMNS: [&str; 8] = [
    "Dates",
    "Total Customers",
    "Males",
    "Females",
    "Children",
    "Young Adults",
    "Adults",
    "Seniors",
];

fn csv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer)
}

/// Write the deduplicated table, before temporal normalization.
pub fn write_visits<W: Write>(writer: W, visits: &[VisitRow]) -> OutputResult<()> {
    let mut out = csv_writer(writer);
    for visit in visits {
        out.write_record(visit.fields())?;
    }
    out.flush()?;
    Ok(())
}

/// Write the normalized table.
pub fn write_normalized<W: Write>(writer: W, rows: &[NormalizedRow]) -> OutputResult<()> {
    let mut out = csv_writer(writer);
    for row in rows {
        out.write_record([
            row.age.to_string(),
            row.gender.to_string(),
            row.date.clone(),
            row.day.to_string(),
            row.interval.to_string(),
        ])?;
    }
    out.flush()?;
    Ok(())
}

/// Write the run summary table with its header.
pub fn write_summary<W: Write>(writer: W, rows: &[SummaryRow]) -> OutputResult<()> {
    let mut out = csv_writer(writer);
    out.write_record(SUMMARY_HEADER)?;

    for row in rows {
        let mut record = vec![
            row.date.clone(),
            row.day.name().to_string(),
            row.day.index().map(|d| d.to_string()).unwrap_or_default(),
            row.time_slice(),
            row.interval.to_string(),
        ];
        record.extend(row.counts.values().iter().map(|v| v.to_string()));
        out.write_record(&record)?;
    }

    out.flush()?;
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryJson<'a> {
    #[serde(flatten)]
    row: &'a SummaryRow,
    time: String,
    week_slot: Option<u16>,
}

/// JSON rendering of the run summary, with the clock range and week slot.
pub fn write_summary_json<W: Write>(writer: W, rows: &[SummaryRow]) -> OutputResult<()> {
    let records: Vec<SummaryJson> = rows
        .iter()
        .map(|row| SummaryJson {
            row,
            time: row.time_slice(),
            week_slot: row.week_slot(),
        })
        .collect();
    write_json(writer, &records)
}

/// Write global averages: a day-of-week section then an interval section.
///
/// Undefined averages are written as `NaN`.
pub fn write_averages<W: Write>(writer: W, summary: &GlobalSummary) -> OutputResult<()> {
    let mut out = csv_writer(writer);

    out.write_record(["Day", "Day ID"].iter().chain(AVERAGE_COLUMNS.iter()))?;
    for bucket in summary.day_averages() {
        let name = weekday_from_index(bucket.index).map(day_name).unwrap_or_default();
        out.write_record(average_record(name.to_string(), &bucket))?;
    }

    out.write_record(["Time", "Time ID"].iter().chain(AVERAGE_COLUMNS.iter()))?;
    for bucket in summary.interval_averages() {
        let slice = convert_time_slice(bucket.index as i64);
        out.write_record(average_record(slice, &bucket))?;
    }

    out.flush()?;
    Ok(())
}

fn average_record(label: String, bucket: &BucketAverage) -> Vec<String> {
    let mut record = vec![label, bucket.index.to_string(), bucket.dates.to_string()];
    record.extend(bucket.averages.values().iter().map(|v| v.to_string()));
    record
}

/// Pretty-printed JSON rendering of any result table.
pub fn write_json<W: Write, T: Serialize + ?Sized>(mut writer: W, value: &T) -> OutputResult<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    Ok(())
}

/// Create `path` and hand a buffered writer to `write`.
pub fn write_file<P, F>(path: P, write: F) -> OutputResult<()>
where
    P: AsRef<Path>,
    F: FnOnce(&mut BufWriter<File>) -> OutputResult<()>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    write(&mut writer)?;
    writer.flush()?;
    Ok(())
}
