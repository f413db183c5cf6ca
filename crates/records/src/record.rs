//! Wire models for individual clinical records.
//!
//! Decoding is strict (`deny_unknown_fields`) so a drifting feed schema shows
//! up as a boundary error instead of silently dropping data. The two
//! presentation-only tag enums ([`Severity`], [`AttachmentKind`]) are the
//! exception: an unrecognised tag degrades to its catch-all variant with a
//! warning, because a new tag in the feed must not make a patient's history
//! unreadable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use chairside_types::ToothNumber;

/// Severity of an observed condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Low,
    Moderate,
    High,
    /// The feed sent a severity this engine does not know.
    Unknown,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::Unknown => "unknown",
        }
    }

    fn from_tag(tag: &str) -> Self {
        match tag {
            "low" => Self::Low,
            "moderate" => Self::Moderate,
            "high" => Self::High,
            other => {
                tracing::warn!(severity = other, "unrecognised severity tag in feed");
                Self::Unknown
            }
        }
    }
}

/// Lifecycle status of a procedure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcedureStatus {
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

/// Type tag of a file attachment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachmentKind {
    Before,
    After,
    Radiograph,
    TestResult,
    Other,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Radiograph => "radiograph",
            Self::TestResult => "test_result",
            Self::Other => "other",
        }
    }

    fn from_tag(tag: &str) -> Self {
        match tag {
            "before" => Self::Before,
            "after" => Self::After,
            "radiograph" => Self::Radiograph,
            "test_result" => Self::TestResult,
            "other" => Self::Other,
            unrecognised => {
                tracing::warn!(kind = unrecognised, "unrecognised attachment kind in feed");
                Self::Other
            }
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from_tag(&tag))
    }
}

impl Serialize for AttachmentKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AttachmentKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from_tag(&tag))
    }
}

/// A clinical finding recorded against one or more teeth.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Observation {
    /// Opaque identifier from the surrounding CRUD layer.
    pub id: String,

    /// The teeth this finding concerns. Validated non-empty at the feed
    /// boundary.
    pub teeth: Vec<ToothNumber>,

    /// Condition category, e.g. "caries", "pulpitis".
    pub condition: String,

    pub severity: Severity,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// When the finding was recorded.
    pub recorded_at: DateTime<Utc>,

    /// Identifiers of attachments uploaded against this observation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachment_ids: Vec<String>,
}

/// A clinical intervention planned or performed on one or more teeth.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Procedure {
    pub id: String,

    /// The teeth the intervention targets. Validated non-empty at the feed
    /// boundary.
    pub teeth: Vec<ToothNumber>,

    /// Human-readable name, e.g. "Root Canal - Pulpectomy".
    pub name: String,

    /// Short procedure code, e.g. "D3310".
    pub code: String,

    pub status: ProcedureStatus,

    /// The date the procedure was scheduled for. Absent on procedures that
    /// were recorded without a booking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// The observation that motivated this procedure, if the clinician linked
    /// one. Link precedence: a linked procedure always joins its
    /// observation's visit, regardless of dates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation_id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachment_ids: Vec<String>,
}

impl Procedure {
    /// The date this procedure clusters on when it has no observation link:
    /// the scheduled date, falling back to the completion date.
    pub fn record_date(&self) -> Option<DateTime<Utc>> {
        self.scheduled_at.or(self.completed_at)
    }
}

/// A file reference (photograph, radiograph, document).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Attachment {
    pub id: String,

    pub kind: AttachmentKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    /// When the file was captured, if known. Plays no role in visit
    /// clustering — attachments join visits through their owning record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taken_at: Option<DateTime<Utc>>,

    /// Retrievable location (URL or storage path).
    pub location: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_severity_degrades_instead_of_failing() {
        let severity: Severity = serde_json::from_str("\"catastrophic\"").expect("decode");
        assert_eq!(severity, Severity::Unknown);
    }

    #[test]
    fn unknown_attachment_kind_maps_to_other() {
        let kind: AttachmentKind = serde_json::from_str("\"panoramic\"").expect("decode");
        assert_eq!(kind, AttachmentKind::Other);
    }

    #[test]
    fn procedure_status_is_a_closed_set() {
        let result: Result<ProcedureStatus, _> = serde_json::from_str("\"abandoned\"");
        assert!(result.is_err());
    }

    #[test]
    fn observation_rejects_unknown_fields() {
        let json = r#"{
            "id": "obs-1",
            "teeth": ["16"],
            "condition": "caries",
            "severity": "high",
            "recorded_at": "2025-12-01T09:30:00Z",
            "billing_code": "X99"
        }"#;
        let result: Result<Observation, _> = serde_json::from_str(json);
        assert!(result.is_err(), "unexpected field should be rejected");
    }

    #[test]
    fn procedure_record_date_prefers_scheduled_date() {
        let json = r#"{
            "id": "proc-1",
            "teeth": ["16"],
            "name": "Composite Filling",
            "code": "D2391",
            "status": "completed",
            "scheduled_at": "2025-12-01T10:00:00Z",
            "completed_at": "2025-12-03T16:00:00Z"
        }"#;
        let procedure: Procedure = serde_json::from_str(json).expect("decode");
        assert_eq!(
            procedure.record_date(),
            procedure.scheduled_at,
            "scheduled date wins when both are present"
        );
    }
}
