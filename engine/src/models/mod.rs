//! Domain models for the footfall reduction pipeline.
//!
//! Each pipeline stage has its own named row type, so column order can
//! never drift between stages:
//!
//! - [`ProjectedRow`] - Column projector output, with optional [`Witness`]
//! - [`VisitRow`] - One customer visit, witness fields stripped
//! - [`NormalizedRow`] - Typed demographics, date, [`DayCode`] and [`Interval`]
//!
//! Demographic codes ([`AgeGroup`], [`Gender`]) are enums internally and
//! are only rendered as text at the serialization boundary. Unrecognized
//! codes keep their source text.

use chrono::Weekday;
use serde::{Serialize, Serializer};
use std::fmt;

// =============================================================================
// Demographics
// =============================================================================

/// Age bracket reported by the point-of-sale camera.
///
/// A code outside 1-4 is kept as its source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AgeGroup {
    Child,
    YoungAdult,
    Adult,
    Senior,
    Unknown(String),
}

impl AgeGroup {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "1" => AgeGroup::Child,
            "2" => AgeGroup::YoungAdult,
            "3" => AgeGroup::Adult,
            "4" => AgeGroup::Senior,
            _ => AgeGroup::Unknown(code.to_string()),
        }
    }

    /// Numeric code, `None` when unrecognized.
    pub fn code(&self) -> Option<u8> {
        match self {
            AgeGroup::Child => Some(1),
            AgeGroup::YoungAdult => Some(2),
            AgeGroup::Adult => Some(3),
            AgeGroup::Senior => Some(4),
            AgeGroup::Unknown(_) => None,
        }
    }
}

/// Gender reported by the point-of-sale camera.
///
/// A code outside 1-2 is kept as its source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
    Unknown(String),
}

impl Gender {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "1" => Gender::Male,
            "2" => Gender::Female,
            _ => Gender::Unknown(code.to_string()),
        }
    }

    pub fn code(&self) -> Option<u8> {
        match self {
            Gender::Male => Some(1),
            Gender::Female => Some(2),
            Gender::Unknown(_) => None,
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgeGroup::Unknown(raw) => f.write_str(raw),
            known => write!(f, "{}", known.code().unwrap_or_default()),
        }
    }
}

impl Serialize for AgeGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AgeGroup::Unknown(raw) => serializer.serialize_str(raw),
            known => serializer.serialize_u8(known.code().unwrap_or_default()),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Unknown(raw) => f.write_str(raw),
            known => write!(f, "{}", known.code().unwrap_or_default()),
        }
    }
}

impl Serialize for Gender {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Gender::Unknown(raw) => serializer.serialize_str(raw),
            known => serializer.serialize_u8(known.code().unwrap_or_default()),
        }
    }
}

// =============================================================================
// Day of week
// =============================================================================

/// Day-of-week cell after normalization.
///
/// Names that are not an exact English day name are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DayCode {
    Known(Weekday),
    Unrecognized(String),
}

impl DayCode {
    /// Exact, case-sensitive match against `Sunday` .. `Saturday`.
    pub fn from_name(name: &str) -> Self {
        let day = match name {
            "Sunday" => Weekday::Sun,
            "Monday" => Weekday::Mon,
            "Tuesday" => Weekday::Tue,
            "Wednesday" => Weekday::Wed,
            "Thursday" => Weekday::Thu,
            "Friday" => Weekday::Fri,
            "Saturday" => Weekday::Sat,
            _ => return DayCode::Unrecognized(name.to_string()),
        };
        DayCode::Known(day)
    }

    /// Day index, Sunday=0 through Saturday=6.
    pub fn index(&self) -> Option<u8> {
        match self {
            DayCode::Known(day) => Some(day.num_days_from_sunday() as u8),
            DayCode::Unrecognized(_) => None,
        }
    }

    /// English day name, or the raw text when unrecognized.
    pub fn name(&self) -> &str {
        match self {
            DayCode::Known(day) => day_name(*day),
            DayCode::Unrecognized(raw) => raw,
        }
    }
}

impl fmt::Display for DayCode {
    /// Renders the index for known days and the raw text otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayCode::Known(day) => write!(f, "{}", day.num_days_from_sunday()),
            DayCode::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for DayCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.index() {
            Some(i) => serializer.serialize_u8(i),
            None => serializer.serialize_str(self.name()),
        }
    }
}

/// English name of a weekday.
pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "Sunday",
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
    }
}

/// Weekday for a Sunday-based index.
pub fn weekday_from_index(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

// =============================================================================
// Interval
// =============================================================================

/// Number of 30-minute slots in a day.
pub const INTERVALS_PER_DAY: usize = 48;

/// A 30-minute slot of the day, always within `[0,47]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Interval(u8);

impl Interval {
    pub fn new(index: u8) -> Option<Self> {
        ((index as usize) < INTERVALS_PER_DAY).then_some(Interval(index))
    }

    pub fn index(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Rows
// =============================================================================

/// Redundancy-witness values; never analytic output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness {
    pub dwell: String,
    pub attention: String,
}

/// One customer visit in canonical column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitRow {
    /// Source line the visit was read from
    #[serde(skip)]
    pub line: usize,
    pub age: String,
    pub gender: String,
    pub datetime: String,
    pub day: String,
}

impl VisitRow {
    /// Canonical fields, in output order.
    pub fn fields(&self) -> [&str; 4] {
        [&self.age, &self.gender, &self.datetime, &self.day]
    }
}

/// Column projector output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedRow {
    pub visit: VisitRow,
    pub witness: Option<Witness>,
}

impl ProjectedRow {
    /// Field-wise equality, ignoring the source line number.
    pub fn same_record(&self, other: &ProjectedRow) -> bool {
        self.visit.fields() == other.visit.fields() && self.witness == other.witness
    }
}

/// A visit after temporal normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedRow {
    pub age: AgeGroup,
    pub gender: Gender,
    pub date: String,
    pub day: DayCode,
    pub interval: Interval,
}
