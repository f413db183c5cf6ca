//! Case-study generation boundary.
//!
//! This crate owns everything on the far side of a validated
//! [`CaseStudyRequest`](chairside_core::CaseStudyRequest): the generator
//! collaborator trait and its HTTP implementation, the generation lifecycle
//! state machine with its at-most-one-in-flight guard, and the session cost
//! ledger.
//!
//! Aggregation stays pure in `chairside-core`; every failure of the external
//! generator is caught here and converted into lifecycle state, never
//! propagated upwards as a panic or an unhandled error.

mod generator;
mod lifecycle;
mod section;

pub use generator::{
    CaseStudyGenerator, GeneratorConfig, GeneratorError, HttpGenerator, RegeneratedSection,
};
pub use lifecycle::{CostLedger, GenerationLifecycle, GenerationPhase, LifecycleError};
pub use section::{CaseStudySections, GeneratedCaseStudy, GenerationMeta, SectionKind};
