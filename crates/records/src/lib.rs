//! Clinical-record feed boundary.
//!
//! This crate is responsible for translating the per-patient payload of the
//! external clinical-record feed into closed, explicitly-typed records
//! (observation, procedure, attachment). Everything downstream of this crate
//! works on validated types only; malformed or unrecognised shapes are
//! rejected here and never reach the pure aggregation functions.
//!
//! All record types are read-only inputs to the engine — they are created by
//! the surrounding CRUD layer and never mutated or persisted by Chairside.

mod feed;
mod record;

pub use feed::RecordFeed;
pub use record::{
    Attachment, AttachmentKind, Observation, Procedure, ProcedureStatus, Severity,
};

use thiserror::Error;

/// Errors returned by the record-feed boundary.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("invalid record feed JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("observation {0} references no tooth")]
    ObservationWithoutTooth(String),

    #[error("procedure {0} references no tooth")]
    ProcedureWithoutTooth(String),

    #[error("duplicate record identifier {0} in feed")]
    DuplicateId(String),
}
