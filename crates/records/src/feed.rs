//! Per-patient feed payload.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use chairside_types::PatientRef;

use crate::record::{Attachment, Observation, Procedure};
use crate::RecordError;

/// The full, unfiltered set of one patient's clinical records, as returned by
/// the external clinical-record feed in a single call (no pagination).
///
/// Records reference attachments by identifier; the attachments themselves
/// arrive in the top-level `attachments` list and are resolved during visit
/// aggregation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordFeed {
    pub patient: PatientRef,

    #[serde(default)]
    pub observations: Vec<Observation>,

    #[serde(default)]
    pub procedures: Vec<Procedure>,

    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl RecordFeed {
    /// Decodes and validates a feed payload.
    ///
    /// Beyond strict JSON decoding, this enforces the structural invariants
    /// the aggregation engine relies on: every observation and procedure
    /// names at least one tooth, and record identifiers are unique within
    /// their kind.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidJson`] on malformed JSON or schema
    /// drift, [`RecordError::ObservationWithoutTooth`] /
    /// [`RecordError::ProcedureWithoutTooth`] for records with no anatomical
    /// site, and [`RecordError::DuplicateId`] for repeated identifiers.
    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        let feed: Self = serde_json::from_str(json)?;
        feed.validate()?;
        Ok(feed)
    }

    fn validate(&self) -> Result<(), RecordError> {
        let mut seen = HashSet::new();

        for observation in &self.observations {
            if observation.teeth.is_empty() {
                return Err(RecordError::ObservationWithoutTooth(observation.id.clone()));
            }
            if !seen.insert(&observation.id) {
                return Err(RecordError::DuplicateId(observation.id.clone()));
            }
        }

        seen.clear();
        for procedure in &self.procedures {
            if procedure.teeth.is_empty() {
                return Err(RecordError::ProcedureWithoutTooth(procedure.id.clone()));
            }
            if !seen.insert(&procedure.id) {
                return Err(RecordError::DuplicateId(procedure.id.clone()));
            }
        }

        seen.clear();
        for attachment in &self.attachments {
            if !seen.insert(&attachment.id) {
                return Err(RecordError::DuplicateId(attachment.id.clone()));
            }
        }

        Ok(())
    }

    /// Looks up an attachment by identifier.
    pub fn attachment(&self, id: &str) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.id == id)
    }

    /// Looks up an observation by identifier.
    pub fn observation(&self, id: &str) -> Option<&Observation> {
        self.observations.iter().find(|o| o.id == id)
    }
}
