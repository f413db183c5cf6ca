//! Generated case-study structure.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of narrative sections a generated case study contains.
///
/// Wire names are stable: they appear in generator responses and in the
/// per-section regeneration endpoint path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    PreTreatmentSummary,
    InitialDiagnosis,
    TreatmentGoals,
    TreatmentSummary,
    ProceduresPerformed,
    OutcomeSummary,
    SuccessMetrics,
    FullNarrative,
}

impl SectionKind {
    pub const ALL: [SectionKind; 8] = [
        SectionKind::PreTreatmentSummary,
        SectionKind::InitialDiagnosis,
        SectionKind::TreatmentGoals,
        SectionKind::TreatmentSummary,
        SectionKind::ProceduresPerformed,
        SectionKind::OutcomeSummary,
        SectionKind::SuccessMetrics,
        SectionKind::FullNarrative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreTreatmentSummary => "pre_treatment_summary",
            Self::InitialDiagnosis => "initial_diagnosis",
            Self::TreatmentGoals => "treatment_goals",
            Self::TreatmentSummary => "treatment_summary",
            Self::ProceduresPerformed => "procedures_performed",
            Self::OutcomeSummary => "outcome_summary",
            Self::SuccessMetrics => "success_metrics",
            Self::FullNarrative => "full_narrative",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The eight narrative sections of a case study.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseStudySections {
    pub pre_treatment_summary: String,
    pub initial_diagnosis: String,
    pub treatment_goals: String,
    pub treatment_summary: String,
    pub procedures_performed: String,
    pub outcome_summary: String,
    pub success_metrics: String,
    pub full_narrative: String,
}

impl CaseStudySections {
    pub fn section(&self, kind: SectionKind) -> &str {
        match kind {
            SectionKind::PreTreatmentSummary => &self.pre_treatment_summary,
            SectionKind::InitialDiagnosis => &self.initial_diagnosis,
            SectionKind::TreatmentGoals => &self.treatment_goals,
            SectionKind::TreatmentSummary => &self.treatment_summary,
            SectionKind::ProceduresPerformed => &self.procedures_performed,
            SectionKind::OutcomeSummary => &self.outcome_summary,
            SectionKind::SuccessMetrics => &self.success_metrics,
            SectionKind::FullNarrative => &self.full_narrative,
        }
    }

    pub fn set_section(&mut self, kind: SectionKind, content: String) {
        let slot = match kind {
            SectionKind::PreTreatmentSummary => &mut self.pre_treatment_summary,
            SectionKind::InitialDiagnosis => &mut self.initial_diagnosis,
            SectionKind::TreatmentGoals => &mut self.treatment_goals,
            SectionKind::TreatmentSummary => &mut self.treatment_summary,
            SectionKind::ProceduresPerformed => &mut self.procedures_performed,
            SectionKind::OutcomeSummary => &mut self.outcome_summary,
            SectionKind::SuccessMetrics => &mut self.success_metrics,
            SectionKind::FullNarrative => &mut self.full_narrative,
        };
        *slot = content;
    }
}

/// Generation metadata reported by the external service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationMeta {
    /// Name of the model that produced the text.
    pub model: String,
    pub total_tokens: u64,
    pub estimated_cost_usd: f64,
}

/// A successfully generated case study.
///
/// Created only by a successful generation call; a later regeneration
/// replaces one named section and leaves the rest untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneratedCaseStudy {
    /// The external service's identifier for this case study, used to
    /// address per-section regeneration.
    pub id: String,

    pub sections: CaseStudySections,

    pub meta: GenerationMeta,

    /// The image selection carried through from the originating request, for
    /// display alongside the narrative.
    #[serde(default)]
    pub attachment_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_kinds_have_stable_wire_names() {
        let json = serde_json::to_string(&SectionKind::PreTreatmentSummary).unwrap();
        assert_eq!(json, "\"pre_treatment_summary\"");
        let back: SectionKind = serde_json::from_str("\"outcome_summary\"").unwrap();
        assert_eq!(back, SectionKind::OutcomeSummary);
    }

    #[test]
    fn set_section_replaces_exactly_one_section() {
        let mut sections = CaseStudySections::default();
        sections.set_section(SectionKind::TreatmentGoals, "restore function".to_string());

        for kind in SectionKind::ALL {
            let expected = if kind == SectionKind::TreatmentGoals {
                "restore function"
            } else {
                ""
            };
            assert_eq!(sections.section(kind), expected, "section {kind}");
        }
    }
}
