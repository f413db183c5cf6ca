//! Patient references.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Reference to the patient a set of clinical records belongs to.
///
/// Every aggregation and request-building call takes the patient explicitly;
/// the engine never relies on an ambient "currently viewed patient" context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientRef(Uuid);

impl PatientRef {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for PatientRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_a_bare_uuid() {
        let id = Uuid::new_v4();
        let patient = PatientRef::new(id);
        let json = serde_json::to_string(&patient).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }
}
