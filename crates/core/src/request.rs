//! Case-study request building.
//!
//! Converts a selection into the bounded payload sent to the external
//! generator: the distinct observation and procedure identifiers reachable
//! from the selected visits, the selected images, and the optional title and
//! chief complaint. Validation happens here, before any external call — an
//! empty or degenerate selection never reaches the generator.

use serde::Serialize;
use std::collections::BTreeSet;

use chairside_types::PatientRef;

use crate::error::{EngineError, EngineResult};
use crate::journey::TreatmentJourney;
use crate::selection::Selection;

/// The validated payload for one generation call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CaseStudyRequest {
    pub patient: PatientRef,

    /// Distinct observation ids from the selected visits, in chronological
    /// first-appearance order.
    pub observation_ids: Vec<String>,

    /// Distinct procedure ids from the selected visits, in chronological
    /// first-appearance order.
    pub procedure_ids: Vec<String>,

    /// The images the clinician picked to display alongside the narrative.
    pub attachment_ids: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chief_complaint: Option<String>,
}

impl CaseStudyRequest {
    /// Builds a request from the current selection.
    ///
    /// Walks the journey's visits in chronological order, keeping those in
    /// the selection, and collects their record identifiers de-duplicated.
    /// Title and chief complaint are trimmed; blank strings become `None`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoSelection`] if no visits are selected, or if
    /// the selected visits dereference to no observations or procedures at
    /// all (degenerate data).
    pub fn build(
        journey: &TreatmentJourney,
        selection: &Selection,
        title: Option<String>,
        chief_complaint: Option<String>,
    ) -> EngineResult<Self> {
        if selection.is_empty() {
            return Err(EngineError::NoSelection);
        }

        let mut observation_ids = Vec::new();
        let mut procedure_ids = Vec::new();
        let mut seen = BTreeSet::new();

        for visit in journey.visits() {
            if !selection.contains_visit(&visit.id) {
                continue;
            }
            for id in visit.observation_ids() {
                if seen.insert(id.to_string()) {
                    observation_ids.push(id.to_string());
                }
            }
            for id in visit.procedure_ids() {
                if seen.insert(id.to_string()) {
                    procedure_ids.push(id.to_string());
                }
            }
        }

        if observation_ids.is_empty() && procedure_ids.is_empty() {
            return Err(EngineError::NoSelection);
        }

        Ok(Self {
            patient: journey.patient(),
            observation_ids,
            procedure_ids,
            attachment_ids: selection.images().map(str::to_string).collect(),
            title: normalise(title),
            chief_complaint: normalise(chief_complaint),
        })
    }
}

fn normalise(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}
