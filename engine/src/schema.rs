//! Header resolution for point-of-sale exports.
//!
//! Only six header names are recognized. Four are mandatory, the two
//! timing columns are optional and only serve as a redundancy witness
//! for deduplication.
//!
//! ```text
//! header row ──▶ resolve() ──▶ Resolution ──▶ into_schema() ──▶ Schema
//!                               (positions,                     (threaded through
//!                                missing)                        every stage)
//! ```

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::SchemaError;

/// A recognized column of the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Field {
    CustomerAgeId,
    CustomerGenderId,
    Datetime,
    DayOfWeek,
    DwellTime,
    AttentionTime,
}

impl Field {
    /// Every recognized field, in canonical projection order.
    pub const ALL: [Field; 6] = [
        Field::CustomerAgeId,
        Field::CustomerGenderId,
        Field::Datetime,
        Field::DayOfWeek,
        Field::DwellTime,
        Field::AttentionTime,
    ];

    /// Fields without which the pipeline cannot run.
    pub const MANDATORY: [Field; 4] = [
        Field::CustomerAgeId,
        Field::CustomerGenderId,
        Field::Datetime,
        Field::DayOfWeek,
    ];

    /// Header text as it appears in the export.
    pub fn header(self) -> &'static str {
        match self {
            Field::CustomerAgeId => "CustomerAgeId",
            Field::CustomerGenderId => "CustomerGenderId",
            Field::Datetime => "Datetime",
            Field::DayOfWeek => "DayOfWeek",
            Field::DwellTime => "CustomerDwellTime (s)",
            Field::AttentionTime => "CustomerAttentionTime (s)",
        }
    }

    /// Exact-match lookup; no trimming and no case folding.
    pub fn from_header(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.header() == name)
    }

    pub fn is_mandatory(self) -> bool {
        Field::MANDATORY.contains(&self)
    }
}

/// Outcome of scanning a header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    positions: BTreeMap<Field, usize>,
    missing: BTreeSet<Field>,
}

/// Scan the header row once and record the column index of each recognized name.
///
/// When a name occurs more than once, the last occurrence wins.
pub fn resolve(header: &[String]) -> Resolution {
    let mut positions = BTreeMap::new();

    for (i, cell) in header.iter().enumerate() {
        if let Some(field) = Field::from_header(cell) {
            positions.insert(field, i);
        }
    }

    let missing = Field::ALL
        .into_iter()
        .filter(|f| !positions.contains_key(f))
        .collect();

    Resolution { positions, missing }
}

impl Resolution {
    pub fn position(&self, field: Field) -> Option<usize> {
        self.positions.get(&field).copied()
    }

    pub fn positions(&self) -> &BTreeMap<Field, usize> {
        &self.positions
    }

    /// All absent fields, mandatory and optional.
    pub fn missing(&self) -> &BTreeSet<Field> {
        &self.missing
    }

    pub fn missing_mandatory(&self) -> Vec<Field> {
        self.missing.iter().copied().filter(|f| f.is_mandatory()).collect()
    }

    /// Both witness columns are present, so deduplication can run.
    pub fn has_witness(&self) -> bool {
        self.positions.contains_key(&Field::DwellTime)
            && self.positions.contains_key(&Field::AttentionTime)
    }

    /// Turn the resolution into a usable schema, failing on any missing mandatory field.
    pub fn into_schema(self) -> Result<Schema, SchemaError> {
        let missing = self.missing_mandatory();
        if !missing.is_empty() {
            return Err(SchemaError { missing });
        }

        let at = |field: Field| self.positions[&field];
        let witness = match (
            self.position(Field::DwellTime),
            self.position(Field::AttentionTime),
        ) {
            (Some(dwell), Some(attention)) => Some(WitnessColumns { dwell, attention }),
            _ => None,
        };

        Ok(Schema {
            age: at(Field::CustomerAgeId),
            gender: at(Field::CustomerGenderId),
            datetime: at(Field::Datetime),
            day: at(Field::DayOfWeek),
            witness,
        })
    }
}

/// Column positions of the two redundancy-witness fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WitnessColumns {
    pub dwell: usize,
    pub attention: usize,
}

/// Resolved column positions shared by every pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Schema {
    pub age: usize,
    pub gender: usize,
    pub datetime: usize,
    pub day: usize,
    pub witness: Option<WitnessColumns>,
}

impl Schema {
    /// Resolve a header row straight into a schema.
    pub fn from_header(header: &[String]) -> Result<Self, SchemaError> {
        resolve(header).into_schema()
    }

    /// Whether redundant line items can be collapsed.
    pub fn deduplicates(&self) -> bool {
        self.witness.is_some()
    }

    /// Minimum row width needed to read every projected column.
    pub fn required_width(&self, include_witness: bool) -> usize {
        let mut widest = self.age.max(self.gender).max(self.datetime).max(self.day);
        if include_witness {
            if let Some(w) = self.witness {
                widest = widest.max(w.dwell).max(w.attention);
            }
        }
        widest + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_mandatory_only_header() {
        let res = resolve(&header(&[
            "CustomerAgeId",
            "CustomerGenderId",
            "Datetime",
            "DayOfWeek",
        ]));

        assert_eq!(res.position(Field::CustomerAgeId), Some(0));
        assert_eq!(res.position(Field::DayOfWeek), Some(3));
        assert!(res.missing_mandatory().is_empty());
        assert!(res.missing().contains(&Field::DwellTime));
        assert!(res.missing().contains(&Field::AttentionTime));
        assert!(!res.has_witness());

        let schema = res.into_schema().unwrap();
        assert!(!schema.deduplicates());
    }

    #[test]
    fn test_positions_follow_header_not_canonical_order() {
        let schema = Schema::from_header(&header(&[
            "Store",
            "DayOfWeek",
            "CustomerAttentionTime (s)",
            "Datetime",
            "CustomerGenderId",
            "CustomerDwellTime (s)",
            "CustomerAgeId",
        ]))
        .unwrap();

        assert_eq!(schema.age, 6);
        assert_eq!(schema.gender, 4);
        assert_eq!(schema.datetime, 3);
        assert_eq!(schema.day, 1);
        assert_eq!(schema.witness, Some(WitnessColumns { dwell: 5, attention: 2 }));
        assert_eq!(schema.required_width(true), 7);
    }

    #[test]
    fn test_duplicate_header_last_wins() {
        let res = resolve(&header(&[
            "CustomerAgeId",
            "CustomerGenderId",
            "Datetime",
            "DayOfWeek",
            "CustomerAgeId",
        ]));
        assert_eq!(res.position(Field::CustomerAgeId), Some(4));
    }

    #[test]
    fn test_missing_mandatory_is_schema_error() {
        let err = Schema::from_header(&header(&["CustomerAgeId", "Datetime"])).unwrap_err();
        assert_eq!(
            err.missing,
            vec![Field::CustomerGenderId, Field::DayOfWeek]
        );
    }

    #[test]
    fn test_header_variants_not_recognized() {
        assert_eq!(Field::from_header("customerageid"), None);
        assert_eq!(Field::from_header(" CustomerAgeId"), None);
        assert_eq!(Field::from_header("CustomerDwellTime"), None);
        assert_eq!(
            Field::from_header("CustomerDwellTime (s)"),
            Some(Field::DwellTime)
        );
    }

    #[test]
    fn test_single_witness_column_disables_dedupe() {
        let schema = Schema::from_header(&header(&[
            "CustomerAgeId",
            "CustomerGenderId",
            "Datetime",
            "DayOfWeek",
            "CustomerDwellTime (s)",
        ]))
        .unwrap();
        assert!(!schema.deduplicates());
        assert_eq!(schema.required_width(true), 4);
    }
}
