//! Selection state.
//!
//! Transient UI state: which visits and which images the clinician has picked
//! for the case study. Modelled as an immutable value replaced on every
//! mutation, so the cascade rule is a pure, unit-testable reducer —
//! `(selection, action) -> new selection` — and actions applied in issue
//! order cannot interleave.
//!
//! The one asymmetric rule: deselecting a visit drags its attachments out of
//! the image selection (cascade-on-deselect), but selecting an image never
//! pulls its visit in.

use std::collections::BTreeSet;

use chairside_types::ToothNumber;

use crate::journey::TreatmentJourney;
use crate::visit::{Visit, VisitId};

/// A user-issued selection mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionAction {
    /// Flip one visit in or out of the selection. Removal cascades to the
    /// visit's attachments.
    ToggleVisit(VisitId),

    /// Flip one image in or out of the selection, independently of its visit.
    ToggleImage(String),

    /// Add every visit of one tooth's group, plus all their attachments.
    SelectGroup(ToothNumber),

    /// Remove every visit of one tooth's group, plus all their attachments.
    DeselectGroup(ToothNumber),
}

/// The set of selected visit and attachment identifiers.
///
/// Created empty when a patient's journey is opened; discarded when the
/// patient context changes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    visits: BTreeSet<VisitId>,
    images: BTreeSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one action and returns the resulting selection, leaving `self`
    /// untouched.
    ///
    /// All actions are idempotent when the target is already in the desired
    /// state; an action naming a visit the journey does not contain is a
    /// logged no-op rather than an error, since a stale id can only come from
    /// a UI out of step with the latest aggregation run.
    pub fn apply(&self, journey: &TreatmentJourney, action: SelectionAction) -> Self {
        let mut next = self.clone();

        match action {
            SelectionAction::ToggleVisit(id) => {
                if next.visits.remove(&id) {
                    if let Some(visit) = journey.visit(&id) {
                        next.remove_visit_images(visit);
                    }
                } else if journey.visit(&id).is_some() {
                    next.visits.insert(id);
                } else {
                    tracing::warn!(visit = %id, "toggle for a visit not in the journey; ignored");
                }
            }
            SelectionAction::ToggleImage(id) => {
                if !next.images.remove(&id) {
                    next.images.insert(id);
                }
            }
            SelectionAction::SelectGroup(tooth) => {
                if let Some(group) = journey.group(tooth) {
                    for visit in group.visits() {
                        next.visits.insert(visit.id.clone());
                        next.images
                            .extend(visit.attachment_ids().map(str::to_string));
                    }
                }
            }
            SelectionAction::DeselectGroup(tooth) => {
                if let Some(group) = journey.group(tooth) {
                    for visit in group.visits() {
                        next.visits.remove(&visit.id);
                        next.remove_visit_images(visit);
                    }
                }
            }
        }

        next
    }

    fn remove_visit_images(&mut self, visit: &Visit) {
        for id in visit.attachment_ids() {
            self.images.remove(id);
        }
    }

    /// Selected visit identifiers, in id order.
    pub fn visits(&self) -> impl Iterator<Item = &VisitId> {
        self.visits.iter()
    }

    /// Selected image (attachment) identifiers, in id order.
    pub fn images(&self) -> impl Iterator<Item = &str> {
        self.images.iter().map(String::as_str)
    }

    pub fn contains_visit(&self, id: &VisitId) -> bool {
        self.visits.contains(id)
    }

    pub fn contains_image(&self, id: &str) -> bool {
        self.images.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    pub fn visit_count(&self) -> usize {
        self.visits.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chairside_records::{Attachment, AttachmentKind, Observation, Severity};
    use chairside_types::PatientRef;
    use chrono::{DateTime, TimeZone, Utc};
    use uuid::Uuid;

    fn date(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, d, 9, 0, 0).unwrap()
    }

    fn attachment(id: &str) -> Attachment {
        Attachment {
            id: id.to_string(),
            kind: AttachmentKind::Before,
            caption: None,
            taken_at: None,
            location: format!("files/{id}.jpg"),
        }
    }

    fn visit_with_images(id: &str, d: u32, tooth: &str, images: &[&str]) -> Visit {
        Visit {
            id: VisitId::from(id),
            date: date(d),
            observations: vec![Observation {
                id: format!("obs-{id}"),
                teeth: vec![ToothNumber::parse(tooth).unwrap()],
                condition: "caries".to_string(),
                severity: Severity::Low,
                notes: None,
                recorded_at: date(d),
                attachment_ids: images.iter().map(|s| s.to_string()).collect(),
            }],
            procedures: vec![],
            attachments: images.iter().map(|id| attachment(id)).collect(),
        }
    }

    fn journey(visits: Vec<Visit>) -> TreatmentJourney {
        TreatmentJourney::build(PatientRef::new(Uuid::new_v4()), visits)
    }

    #[test]
    fn deselecting_a_visit_cascades_to_its_images() {
        // Scenario: select V1, toggle image A1, then deselect V1.
        let j = journey(vec![visit_with_images("v1", 1, "16", &["a1", "a2"])]);
        let v1 = VisitId::from("v1");

        let s = Selection::new()
            .apply(&j, SelectionAction::ToggleVisit(v1.clone()))
            .apply(&j, SelectionAction::ToggleImage("a1".to_string()));
        assert!(s.contains_visit(&v1));
        assert!(s.contains_image("a1"));

        let s = s.apply(&j, SelectionAction::ToggleVisit(v1.clone()));
        assert!(!s.contains_visit(&v1));
        assert!(!s.contains_image("a1"), "cascade must remove the image");
    }

    #[test]
    fn selecting_an_image_never_selects_its_visit() {
        let j = journey(vec![visit_with_images("v1", 1, "16", &["a1"])]);

        let s = Selection::new().apply(&j, SelectionAction::ToggleImage("a1".to_string()));
        assert!(s.contains_image("a1"));
        assert!(s.is_empty(), "no visit may be auto-selected");
    }

    #[test]
    fn select_group_takes_every_visit_and_image() {
        let j = journey(vec![
            visit_with_images("v1", 1, "16", &["a1"]),
            visit_with_images("v2", 5, "16", &["a2"]),
        ]);
        let tooth = ToothNumber::parse("16").unwrap();

        let s = Selection::new().apply(&j, SelectionAction::SelectGroup(tooth));
        assert_eq!(s.visit_count(), 2);
        assert!(s.contains_image("a1") && s.contains_image("a2"));

        let s = s.apply(&j, SelectionAction::DeselectGroup(tooth));
        assert!(s.is_empty());
        assert!(!s.contains_image("a1") && !s.contains_image("a2"));
    }

    #[test]
    fn group_operations_are_idempotent() {
        let j = journey(vec![visit_with_images("v1", 1, "16", &["a1"])]);
        let tooth = ToothNumber::parse("16").unwrap();

        let once = Selection::new().apply(&j, SelectionAction::SelectGroup(tooth));
        let twice = once.apply(&j, SelectionAction::SelectGroup(tooth));
        assert_eq!(once, twice);
    }

    #[test]
    fn toggling_twice_restores_the_previous_selection() {
        let j = journey(vec![visit_with_images("v1", 1, "16", &["a1"])]);
        let v1 = VisitId::from("v1");

        let start = Selection::new();
        let round_trip = start
            .apply(&j, SelectionAction::ToggleVisit(v1.clone()))
            .apply(&j, SelectionAction::ToggleVisit(v1));
        assert_eq!(start, round_trip);
    }

    #[test]
    fn unknown_visit_toggle_is_a_no_op() {
        let j = journey(vec![visit_with_images("v1", 1, "16", &[])]);

        let s = Selection::new().apply(&j, SelectionAction::ToggleVisit(VisitId::from("ghost")));
        assert!(s.is_empty());
    }

    #[test]
    fn apply_does_not_mutate_the_input_selection() {
        let j = journey(vec![visit_with_images("v1", 1, "16", &[])]);
        let original = Selection::new();

        let _ = original.apply(&j, SelectionAction::ToggleVisit(VisitId::from("v1")));
        assert!(original.is_empty(), "reducer must copy, not mutate");
    }
}
