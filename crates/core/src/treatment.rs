//! Treatment-type classification.
//!
//! A heuristic label for what a tooth's treatment journey was mostly about,
//! inferred from procedure names. Presentation metadata only: it is never
//! used for billing or clinical decisions.

use serde::{Serialize, Serializer};
use std::fmt;

/// The inferred dominant treatment category of a tooth's group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreatmentKind {
    RootCanal,
    Extraction,
    Restorative,
    Prosthetic,
    Periodontal,
    General,
}

/// Keyword table in priority order: the first category with any matching
/// keyword wins, so a group containing both an extraction and a filling is
/// labelled an extraction.
const KEYWORDS: &[(TreatmentKind, &[&str])] = &[
    (
        TreatmentKind::RootCanal,
        &["root canal", "pulpectomy", "pulpotomy", "endodontic"],
    ),
    (TreatmentKind::Extraction, &["extraction", "surgical removal"]),
    (
        TreatmentKind::Restorative,
        &["filling", "restoration", "composite", "amalgam"],
    ),
    (
        TreatmentKind::Prosthetic,
        &["crown", "bridge", "veneer", "denture", "implant"],
    ),
    (
        TreatmentKind::Periodontal,
        &["scaling", "root planing", "gum", "periodontal", "cleaning"],
    ),
];

impl TreatmentKind {
    /// Classifies a set of procedure names into a single label.
    ///
    /// Matching is case-insensitive substring search against the priority
    /// table above; no match yields [`TreatmentKind::General`]. Deterministic
    /// for any input order, since priority is decided by the table, not the
    /// names.
    pub fn classify<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let names: Vec<String> = names.into_iter().map(str::to_lowercase).collect();

        for (kind, keywords) in KEYWORDS {
            if names
                .iter()
                .any(|name| keywords.iter().any(|kw| name.contains(kw)))
            {
                return *kind;
            }
        }

        Self::General
    }

    /// The human-readable label shown in the journey view.
    pub fn label(&self) -> &'static str {
        match self {
            Self::RootCanal => "Root Canal Treatment",
            Self::Extraction => "Extraction",
            Self::Restorative => "Restorative Treatment",
            Self::Prosthetic => "Prosthetic Treatment",
            Self::Periodontal => "Periodontal Treatment",
            Self::General => "General Treatment",
        }
    }
}

impl fmt::Display for TreatmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for TreatmentKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}
