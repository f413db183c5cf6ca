//! Validated domain primitives shared across the Chairside engine crates.
//!
//! Everything in this crate is a small value type with its invariants enforced
//! at construction time, so downstream crates can lean on the type system
//! instead of re-validating inputs at every call site.

mod patient;
mod tooth;

pub use patient::PatientRef;
pub use tooth::{ToothError, ToothNumber};
