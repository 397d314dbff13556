use std::fmt;

use serde::{Deserialize, Serialize};

use super::expr::Clause;

/// A fact recording that a device has been assigned to an anchor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub anchor_id: String,
}

impl Placement {
    pub fn new(device_id: impl Into<String>, anchor_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            anchor_id: anchor_id.into(),
        }
    }

    /// Exact, case-sensitive match on both ids. Clauses with a missing id
    /// never match.
    #[must_use]
    pub fn satisfies(&self, clause: &Clause) -> bool {
        clause.is_complete()
            && self.device_id == clause.device_id
            && self.anchor_id == clause.anchor_id
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.device_id, self.anchor_id)
    }
}
