//! Date/time decomposition, day encoding and half-hour quantization.
//!
//! # Interval encoding
//!
//! The minute is floored to the half hour and written as a two digit code,
//! `00` for `:00` and `50` for `:30`. Appended to the hour, this gives a
//! number that grows by exactly 50 per slot, so dividing by 50 yields the
//! slot index:
//!
//! ```text
//! 17:42 → {17, 42} → {17, 30} → {17, "50"} → 1750 → 1750 / 50 = 35
//! ```
//!
//! [`time_slice`] inverts this: `35 → 1750-1800 → 1730-1800`.

use serde::Serialize;
use std::fmt;

use crate::error::{IntervalError, RowError, RowResult};
use crate::logs::{log_error, log_warning};
use crate::models::{AgeGroup, DayCode, Gender, Interval, NormalizedRow, VisitRow};
use crate::parser::tokenize;

/// Normalize every visit: split date/time, encode the day, bucket the time.
///
/// Unrecognized day names pass through unchanged. An unusable date-time
/// stops the batch.
pub fn normalize(visits: Vec<VisitRow>) -> RowResult<Vec<NormalizedRow>> {
    let rows = visits
        .into_iter()
        .map(normalize_visit)
        .collect::<RowResult<Vec<_>>>()?;

    let unrecognized = rows.iter().filter(|r| r.day.index().is_none()).count();
    if unrecognized > 0 {
        log_warning(format!("{} rows with an unrecognized day name", unrecognized));
    }

    Ok(rows)
}

/// Normalize a single visit.
pub fn normalize_visit(visit: VisitRow) -> RowResult<NormalizedRow> {
    let VisitRow {
        line,
        age,
        gender,
        datetime,
        day,
    } = visit;

    let (date, time) = split_datetime(&datetime).ok_or_else(|| RowError::DateTime {
        line,
        value: datetime.clone(),
    })?;

    let interval = quantize(&time).ok_or(RowError::Clock { line, value: time })?;

    Ok(NormalizedRow {
        age: AgeGroup::from_code(&age),
        gender: Gender::from_code(&gender),
        date,
        day: DayCode::from_name(&day),
        interval,
    })
}

/// Split `"<date> <time>"` on the space character.
pub fn split_datetime(value: &str) -> Option<(String, String)> {
    let mut parts = tokenize(value, ' ').into_iter();
    let date = parts.next()?;
    let time = parts.next()?;
    Some((date, time))
}

/// Bucket an `HH:MM[:SS]` clock time into its half-hour slot.
///
/// Seconds are ignored. Returns `None` for anything that is not a valid
/// clock time.
pub fn quantize(time: &str) -> Option<Interval> {
    let parts = tokenize(time, ':');
    if parts.len() < 2 {
        return None;
    }

    let hour: u32 = parts[0].parse().ok()?;
    let minute: u32 = parts[1].parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }

    let floored = (minute / 30) * 30;
    let code = if floored == 30 { 50 } else { 0 };
    let index = (hour * 100 + code) / 50;

    Interval::new(index as u8)
}

/// Clock range covered by an interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSlice {
    /// Start as `HHMM`
    pub start: String,
    /// End as `HHMM`; `2400` for the last slot
    pub end: String,
}

impl fmt::Display for TimeSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Inverse of [`quantize`]: the clock range of an interval index.
pub fn time_slice(index: i64) -> Result<TimeSlice, IntervalError> {
    if !(0..=47).contains(&index) {
        return Err(IntervalError::OutOfRange(index));
    }

    let mut start = format!("{:04}", index * 50).into_bytes();
    let mut end = format!("{:04}", (index + 1) * 50).into_bytes();

    // Exactly one boundary carries the "50" half-hour code.
    if start[2] == b'5' {
        start[2] = b'3';
    } else {
        end[2] = b'3';
    }

    Ok(TimeSlice {
        start: String::from_utf8_lossy(&start).into_owned(),
        end: String::from_utf8_lossy(&end).into_owned(),
    })
}

/// Render an interval as `"HHMM-HHMM"`.
///
/// An out-of-range index is reported and yields an empty string; it can
/// only come from already validated internal data.
pub fn convert_time_slice(index: i64) -> String {
    match time_slice(index) {
        Ok(slice) => slice.to_string(),
        Err(e) => {
            log_error(format!("Internal error: {}", e));
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visit(datetime: &str, day: &str) -> VisitRow {
        VisitRow {
            line: 2,
            age: "3".into(),
            gender: "2".into(),
            datetime: datetime.into(),
            day: day.into(),
        }
    }

    #[test]
    fn test_normalize_splits_and_buckets() {
        let row = normalize_visit(visit("2016-02-01 17:42", "Monday")).unwrap();

        assert_eq!(row.date, "2016-02-01");
        assert_eq!(row.day.index(), Some(1));
        assert_eq!(row.interval.index(), 35);
        assert_eq!(row.age, AgeGroup::Adult);
        assert_eq!(row.gender, Gender::Female);
    }

    #[test]
    fn test_quantize_half_hour_codes() {
        let idx = |t: &str| quantize(t).map(Interval::index);

        assert_eq!(idx("00:00"), Some(0));
        assert_eq!(idx("00:29"), Some(0));
        assert_eq!(idx("00:30"), Some(1));
        assert_eq!(idx("09:15"), Some(18));
        assert_eq!(idx("09:45"), Some(19));
        assert_eq!(idx("10:05"), Some(20));
        assert_eq!(idx("17:42"), Some(35));
        assert_eq!(idx("23:59"), Some(47));
        assert_eq!(idx("17:42:10"), Some(35));
    }

    #[test]
    fn test_quantize_rejects_bad_clock() {
        assert_eq!(quantize("24:00"), None);
        assert_eq!(quantize("12:60"), None);
        assert_eq!(quantize("1742"), None);
        assert_eq!(quantize("ab:cd"), None);
    }

    #[test]
    fn test_unrecognized_day_is_noop() {
        let row = normalize_visit(visit("2016-02-03 12:00", "Wedsnday")).unwrap();
        assert_eq!(row.day, DayCode::Unrecognized("Wedsnday".into()));
        assert_eq!(row.day.to_string(), "Wedsnday");

        let row = normalize_visit(visit("2016-02-03 12:00", "Wednesday")).unwrap();
        assert_eq!(row.day.to_string(), "3");
    }

    #[test]
    fn test_missing_time_is_row_error() {
        let err = normalize_visit(visit("2016-02-01", "Monday")).unwrap_err();
        assert_eq!(
            err,
            RowError::DateTime {
                line: 2,
                value: "2016-02-01".into()
            }
        );

        let err = normalize(vec![visit("2016-02-01 25:10", "Monday")]).unwrap_err();
        assert!(matches!(err, RowError::Clock { .. }));
    }

    #[test]
    fn test_time_slice_inverse() {
        assert_eq!(convert_time_slice(35), "1730-1800");
        assert_eq!(convert_time_slice(0), "0000-0030");
        assert_eq!(convert_time_slice(1), "0030-0100");
        assert_eq!(convert_time_slice(19), "0930-1000");
        assert_eq!(convert_time_slice(47), "2330-2400");
    }

    #[test]
    fn test_time_slice_rewrites_exactly_one_boundary() {
        for i in 0..48 {
            let slice = time_slice(i).unwrap();
            let halves = [&slice.start, &slice.end]
                .iter()
                .filter(|s| s.ends_with("30"))
                .count();
            assert_eq!(halves, 1, "slice {i}: {slice}");
        }
    }

    #[test]
    fn test_invalid_time_slice_is_empty() {
        assert_eq!(convert_time_slice(48), "");
        assert_eq!(convert_time_slice(-1), "");
        assert_eq!(time_slice(99), Err(IntervalError::OutOfRange(99)));
    }

    #[test]
    fn test_quantize_and_slice_agree() {
        for hour in 0..24 {
            for minute in [0, 14, 29, 30, 44, 59] {
                let interval = quantize(&format!("{:02}:{:02}", hour, minute)).unwrap();
                let slice = time_slice(interval.index() as i64).unwrap();
                let start_hour: u32 = slice.start[..2].parse().unwrap();
                let start_minute: u32 = slice.start[2..].parse().unwrap();
                assert_eq!(start_hour, hour);
                assert_eq!(start_minute, (minute / 30) * 30);
            }
        }
    }
}
