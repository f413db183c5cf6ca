//! FDI tooth designations.
//!
//! Anatomical sites in the clinical-record feed are identified by FDI
//! (ISO 3950) two-digit tooth numbers, e.g. `"16"` for the upper-right first
//! molar or `"75"` for a primary lower-left second molar. This module provides
//! the validated representation and the canonical ordering used whenever teeth
//! are presented to a clinician.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Errors that can occur when parsing or constructing a tooth designation.
#[derive(Debug, thiserror::Error)]
pub enum ToothError {
    /// The input was not a two-digit FDI designation.
    #[error("invalid FDI tooth designation '{0}': expected two digits")]
    Malformed(String),

    /// The quadrant digit was outside 1-8.
    #[error("invalid FDI quadrant {0}: must be 1-4 (permanent) or 5-8 (primary)")]
    Quadrant(u8),

    /// The position digit was outside the range valid for its quadrant.
    #[error("invalid FDI position {position} in quadrant {quadrant}")]
    Position { quadrant: u8, position: u8 },
}

/// A validated FDI (ISO 3950) tooth designation.
///
/// The two digits encode quadrant and position. Quadrants 1-4 cover the
/// permanent dentition (positions 1-8, incisor to third molar); quadrants 5-8
/// cover the primary dentition (positions 1-5).
///
/// # Ordering
///
/// `ToothNumber` orders by quadrant, then position — the order a dental chart
/// is read in. This is deliberately not the lexical order of the string form,
/// which would place `"2"` before `"11"`.
///
/// # Wire form
///
/// Serializes as the two-digit string (`"16"`), and validates on
/// deserialization, so a malformed site identifier is rejected at the feed
/// boundary rather than surfacing mid-aggregation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ToothNumber {
    quadrant: u8,
    position: u8,
}

impl ToothNumber {
    /// Creates a tooth designation from quadrant and position digits.
    ///
    /// # Errors
    ///
    /// Returns [`ToothError::Quadrant`] for a quadrant outside 1-8, or
    /// [`ToothError::Position`] for a position invalid in that quadrant
    /// (1-8 for permanent quadrants, 1-5 for primary quadrants).
    pub fn new(quadrant: u8, position: u8) -> Result<Self, ToothError> {
        if !(1..=8).contains(&quadrant) {
            return Err(ToothError::Quadrant(quadrant));
        }

        let max_position = if quadrant <= 4 { 8 } else { 5 };
        if position == 0 || position > max_position {
            return Err(ToothError::Position { quadrant, position });
        }

        Ok(Self { quadrant, position })
    }

    /// Parses the two-digit string form used by the clinical-record feed.
    ///
    /// # Errors
    ///
    /// Returns [`ToothError::Malformed`] if the input is not exactly two
    /// ASCII digits, or the quadrant/position errors from [`ToothNumber::new`].
    pub fn parse(raw: &str) -> Result<Self, ToothError> {
        let digits: Vec<u8> = raw
            .chars()
            .map(|c| c.to_digit(10).map(|d| d as u8))
            .collect::<Option<_>>()
            .ok_or_else(|| ToothError::Malformed(raw.to_string()))?;

        match digits.as_slice() {
            [quadrant, position] => Self::new(*quadrant, *position),
            _ => Err(ToothError::Malformed(raw.to_string())),
        }
    }

    /// The quadrant digit (1-8).
    pub fn quadrant(&self) -> u8 {
        self.quadrant
    }

    /// The position digit within the quadrant (1 at the midline).
    pub fn position(&self) -> u8 {
        self.position
    }

    /// Returns `true` if this designates a primary (deciduous) tooth.
    pub fn is_primary(&self) -> bool {
        self.quadrant >= 5
    }
}

impl fmt::Display for ToothNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.quadrant, self.position)
    }
}

impl Serialize for ToothNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ToothNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_permanent_and_primary_designations() {
        let molar = ToothNumber::parse("16").expect("valid permanent tooth");
        assert_eq!(molar.quadrant(), 1);
        assert_eq!(molar.position(), 6);
        assert!(!molar.is_primary());

        let primary = ToothNumber::parse("75").expect("valid primary tooth");
        assert!(primary.is_primary());
    }

    #[test]
    fn rejects_malformed_input() {
        for raw in ["", "1", "161", "ab", "1a"] {
            let err = ToothNumber::parse(raw).expect_err("expected parse failure");
            assert!(matches!(err, ToothError::Malformed(_)));
        }
    }

    #[test]
    fn rejects_out_of_range_digits() {
        assert!(matches!(
            ToothNumber::parse("90"),
            Err(ToothError::Quadrant(9))
        ));
        // Position 9 never exists; position 6 does not exist in primary quadrants.
        assert!(matches!(
            ToothNumber::parse("19"),
            Err(ToothError::Position { .. })
        ));
        assert!(matches!(
            ToothNumber::parse("56"),
            Err(ToothError::Position { .. })
        ));
    }

    #[test]
    fn orders_by_quadrant_then_position_not_lexically() {
        let mut teeth = vec![
            ToothNumber::parse("21").unwrap(),
            ToothNumber::parse("11").unwrap(),
            ToothNumber::parse("18").unwrap(),
        ];
        teeth.sort();
        let rendered: Vec<String> = teeth.iter().map(ToothNumber::to_string).collect();
        assert_eq!(rendered, vec!["11", "18", "21"]);
    }

    #[test]
    fn wire_form_round_trips_through_json() {
        let tooth = ToothNumber::parse("48").unwrap();
        let json = serde_json::to_string(&tooth).unwrap();
        assert_eq!(json, "\"48\"");
        let back: ToothNumber = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tooth);
    }

    #[test]
    fn deserialization_rejects_invalid_designation() {
        let result: Result<ToothNumber, _> = serde_json::from_str("\"99\"");
        assert!(result.is_err());
    }
}
