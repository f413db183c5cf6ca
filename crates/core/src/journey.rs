//! Per-tooth treatment journey.
//!
//! Re-keys the visit list by anatomical site: every visit joins the group of
//! every tooth its records mention, so a visit spanning several teeth appears
//! in several groups (by shared reference, never by copy). Groups iterate in
//! canonical FDI order.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use chairside_types::{PatientRef, ToothNumber};

use crate::treatment::TreatmentKind;
use crate::visit::{Visit, VisitId};

/// All visits that touch one tooth, in ascending date order, with the
/// summary shown at the head of the journey view.
#[derive(Clone, Debug)]
pub struct ToothTreatmentGroup {
    tooth: ToothNumber,
    visits: Vec<Arc<Visit>>,
    first_visit: DateTime<Utc>,
    last_visit: DateTime<Utc>,
    treatment: TreatmentKind,
}

impl ToothTreatmentGroup {
    pub fn tooth(&self) -> ToothNumber {
        self.tooth
    }

    /// Visits in ascending date order. Shared with every other group the
    /// same visits belong to.
    pub fn visits(&self) -> &[Arc<Visit>] {
        &self.visits
    }

    pub fn visit_count(&self) -> usize {
        self.visits.len()
    }

    /// Date of the earliest visit in the group.
    pub fn first_visit(&self) -> DateTime<Utc> {
        self.first_visit
    }

    /// Date of the latest visit in the group.
    pub fn last_visit(&self) -> DateTime<Utc> {
        self.last_visit
    }

    /// The inferred dominant treatment category. Presentation metadata only.
    pub fn treatment(&self) -> TreatmentKind {
        self.treatment
    }

    pub fn summary(&self) -> GroupSummary {
        GroupSummary {
            tooth: self.tooth,
            visit_count: self.visits.len(),
            first_visit: self.first_visit,
            last_visit: self.last_visit,
            treatment: self.treatment,
        }
    }
}

/// Renderable summary of one tooth's group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub tooth: ToothNumber,
    pub visit_count: usize,
    pub first_visit: DateTime<Utc>,
    pub last_visit: DateTime<Utc>,
    pub treatment: TreatmentKind,
}

/// The full per-tooth view of one patient's treatment history.
///
/// Derived wholesale from a visit list; rebuilt (never patched) whenever the
/// underlying records change.
#[derive(Clone, Debug)]
pub struct TreatmentJourney {
    patient: PatientRef,
    visits: Vec<Arc<Visit>>,
    groups: BTreeMap<ToothNumber, ToothTreatmentGroup>,
}

impl TreatmentJourney {
    /// Builds the per-tooth index from an aggregated visit list.
    pub fn build(patient: PatientRef, visits: Vec<Visit>) -> Self {
        let mut visits: Vec<Arc<Visit>> = visits.into_iter().map(Arc::new).collect();
        visits.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

        let mut grouped: BTreeMap<ToothNumber, Vec<Arc<Visit>>> = BTreeMap::new();
        for visit in &visits {
            for tooth in visit.teeth() {
                grouped.entry(tooth).or_default().push(Arc::clone(visit));
            }
        }

        let groups = grouped
            .into_iter()
            .filter_map(|(tooth, group_visits)| {
                let (first, last) = match (group_visits.first(), group_visits.last()) {
                    (Some(first), Some(last)) => (first.date, last.date),
                    _ => return None,
                };

                let treatment = TreatmentKind::classify(
                    group_visits
                        .iter()
                        .flat_map(|v| v.procedures.iter())
                        .map(|p| p.name.as_str()),
                );

                Some((
                    tooth,
                    ToothTreatmentGroup {
                        tooth,
                        visits: group_visits,
                        first_visit: first,
                        last_visit: last,
                        treatment,
                    },
                ))
            })
            .collect();

        Self {
            patient,
            visits,
            groups,
        }
    }

    pub fn patient(&self) -> PatientRef {
        self.patient
    }

    /// All visits in ascending date order.
    pub fn visits(&self) -> &[Arc<Visit>] {
        &self.visits
    }

    pub fn visit(&self, id: &VisitId) -> Option<&Arc<Visit>> {
        self.visits.iter().find(|v| &v.id == id)
    }

    /// Groups in canonical FDI order (quadrant, then position).
    pub fn groups(&self) -> impl Iterator<Item = &ToothTreatmentGroup> {
        self.groups.values()
    }

    pub fn group(&self, tooth: ToothNumber) -> Option<&ToothTreatmentGroup> {
        self.groups.get(&tooth)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}
