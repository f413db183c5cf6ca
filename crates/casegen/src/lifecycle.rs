//! Generation lifecycle.
//!
//! Drives one session's calls to the generator collaborator:
//!
//! ```text
//! Idle -> Requesting -> Succeeded | Failed
//! Succeeded -> RegeneratingSection -> Succeeded | Failed
//! ```
//!
//! At most one call is in flight at a time; a dispatch while
//! `Requesting`/`RegeneratingSection` is rejected outright. A failure never
//! discards previously generated content — the prior case study stays
//! available while the error is surfaced.

use tracing::{info, warn};

use chairside_core::CaseStudyRequest;

use crate::generator::{CaseStudyGenerator, GeneratorError, RegeneratedSection};
use crate::section::{GeneratedCaseStudy, GenerationMeta, SectionKind};

/// Where the controller currently is in the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationPhase {
    Idle,
    Requesting,
    Succeeded,
    Failed,
    RegeneratingSection,
}

impl GenerationPhase {
    /// A call is in flight; no new dispatch may start.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Requesting | Self::RegeneratingSection)
    }
}

impl Default for GenerationPhase {
    fn default() -> Self {
        Self::Idle
    }
}

/// Rejections issued by the controller itself, before any external call.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("a generation call is already in flight")]
    Busy,

    #[error("no generated case study exists to regenerate a section of")]
    NothingToRegenerate,
}

/// Running totals of what this session has spent on generation.
///
/// Regenerations count too: replaced text still cost tokens.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct CostLedger {
    calls: u32,
    total_tokens: u64,
    total_cost_usd: f64,
}

impl CostLedger {
    fn record(&mut self, meta: &GenerationMeta) {
        self.calls += 1;
        self.total_tokens += meta.total_tokens;
        self.total_cost_usd += meta.estimated_cost_usd;
    }

    pub fn calls(&self) -> u32 {
        self.calls
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    pub fn total_cost_usd(&self) -> f64 {
        self.total_cost_usd
    }
}

/// State machine for one patient-journey session's generation calls.
#[derive(Debug, Default)]
pub struct GenerationLifecycle {
    phase: GenerationPhase,
    result: Option<GeneratedCaseStudy>,
    last_error: Option<String>,
    ledger: CostLedger,
}

impl GenerationLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one top-level generation call through the state machine.
    ///
    /// The generator's outcome — success or any [`GeneratorError`] — lands in
    /// the controller's state; only a guard rejection is returned as an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Busy`] if a call is already in flight. The
    /// in-flight call's eventual transition is unaffected.
    pub async fn dispatch<G: CaseStudyGenerator>(
        &mut self,
        generator: &G,
        request: &CaseStudyRequest,
    ) -> Result<(), LifecycleError> {
        self.begin()?;
        let outcome = generator.generate(request).await;
        self.complete(outcome);
        Ok(())
    }

    /// Runs one per-section regeneration call through the state machine.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Busy`] if a call is in flight, or
    /// [`LifecycleError::NothingToRegenerate`] if no case study has been
    /// generated yet.
    pub async fn regenerate<G: CaseStudyGenerator>(
        &mut self,
        generator: &G,
        section: SectionKind,
    ) -> Result<(), LifecycleError> {
        let case_study_id = self.begin_regeneration()?;
        let outcome = generator.regenerate_section(&case_study_id, section).await;
        self.complete_regeneration(section, outcome);
        Ok(())
    }

    /// Guard + transition into `Requesting`.
    pub fn begin(&mut self) -> Result<(), LifecycleError> {
        if self.phase.is_busy() {
            return Err(LifecycleError::Busy);
        }
        self.phase = GenerationPhase::Requesting;
        Ok(())
    }

    /// Records the outcome of the call opened by [`begin`](Self::begin).
    pub fn complete(&mut self, outcome: Result<GeneratedCaseStudy, GeneratorError>) {
        if self.phase != GenerationPhase::Requesting {
            warn!(phase = ?self.phase, "completion arrived outside a requesting phase; ignored");
            return;
        }

        match outcome {
            Ok(study) => {
                info!(
                    case_study = %study.id,
                    tokens = study.meta.total_tokens,
                    cost_usd = study.meta.estimated_cost_usd,
                    "generation succeeded"
                );
                self.ledger.record(&study.meta);
                self.result = Some(study);
                self.last_error = None;
                self.phase = GenerationPhase::Succeeded;
            }
            Err(err) => {
                warn!(error = %err, "generation failed; prior result retained");
                self.last_error = Some(err.to_string());
                self.phase = GenerationPhase::Failed;
            }
        }
    }

    /// Guard + transition into `RegeneratingSection`; returns the case-study
    /// id the regeneration call must address.
    pub fn begin_regeneration(&mut self) -> Result<String, LifecycleError> {
        if self.phase.is_busy() {
            return Err(LifecycleError::Busy);
        }
        let study = self
            .result
            .as_ref()
            .ok_or(LifecycleError::NothingToRegenerate)?;

        let id = study.id.clone();
        self.phase = GenerationPhase::RegeneratingSection;
        Ok(id)
    }

    /// Records the outcome of a regeneration call: on success the named
    /// section is replaced and every other section is left untouched.
    pub fn complete_regeneration(
        &mut self,
        section: SectionKind,
        outcome: Result<RegeneratedSection, GeneratorError>,
    ) {
        if self.phase != GenerationPhase::RegeneratingSection {
            warn!(phase = ?self.phase, "regeneration completion outside a regenerating phase; ignored");
            return;
        }

        match (outcome, self.result.as_mut()) {
            (Ok(regenerated), Some(study)) => {
                info!(case_study = %study.id, section = %section, "section regenerated");
                study.sections.set_section(section, regenerated.content);
                self.ledger.record(&regenerated.meta);
                self.last_error = None;
                self.phase = GenerationPhase::Succeeded;
            }
            (Ok(_), None) => {
                // begin_regeneration guarantees a result; losing it mid-call
                // is a programming error, not a user-visible failure.
                warn!("regeneration completed with no case study to apply it to");
                self.phase = GenerationPhase::Failed;
            }
            (Err(err), _) => {
                warn!(error = %err, section = %section, "section regeneration failed");
                self.last_error = Some(err.to_string());
                self.phase = GenerationPhase::Failed;
            }
        }
    }

    /// Clears the session for a new patient context.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn phase(&self) -> GenerationPhase {
        self.phase
    }

    /// The latest successfully generated case study, if any. Retained across
    /// later failures.
    pub fn result(&self) -> Option<&GeneratedCaseStudy> {
        self.result.as_ref()
    }

    /// Human-readable message of the most recent failure.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn ledger(&self) -> &CostLedger {
        &self.ledger
    }
}
