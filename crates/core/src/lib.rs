//! # Chairside Core
//!
//! The treatment-journey aggregation engine:
//! - Visit aggregation: clustering raw observations and procedures into
//!   discrete clinical visits by time proximity
//! - Tooth grouping: re-keying visits into per-tooth treatment groups in
//!   canonical FDI order
//! - Treatment-type classification of each group
//! - Selection state (pure reducer with cascade-on-deselect)
//! - Case-study request building with validation
//!
//! Everything here is synchronous and pure: derived structures are recomputed
//! wholesale from the latest records, never patched incrementally, because
//! clustering boundaries can shift when new records arrive.
//!
//! **No external-call concerns**: the generator collaborator and its
//! lifecycle live in `chairside-casegen`.

pub mod config;
pub mod error;
pub mod journey;
pub mod request;
pub mod selection;
pub mod treatment;
pub mod visit;

pub use config::{ClusterWindow, EngineConfig};
pub use error::{EngineError, EngineResult};
pub use journey::{GroupSummary, ToothTreatmentGroup, TreatmentJourney};
pub use request::CaseStudyRequest;
pub use selection::{Selection, SelectionAction};
pub use treatment::TreatmentKind;
pub use visit::{aggregate_visits, Visit, VisitId};
