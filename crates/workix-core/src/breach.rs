//! # Breach Kinds
//!
//! A work order carries two independent SLA clocks. The response clock stops
//! when the order is acknowledged; the resolution clock stops when it is
//! completed. Each clock breaches, escalates, and records violations on its
//! own track.

use serde::{Deserialize, Serialize};

use crate::error::WorkixError;

/// Which SLA target a violation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    /// The order was not acknowledged before `response_due_at`.
    Response,
    /// The order was not completed before `resolution_due_at`.
    Resolution,
}

impl ViolationType {
    /// Both kinds, response first.
    pub const ALL: [ViolationType; 2] = [ViolationType::Response, ViolationType::Resolution];

    /// The persisted string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Response => "response",
            Self::Resolution => "resolution",
        }
    }
}

impl std::fmt::Display for ViolationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ViolationType {
    type Err = WorkixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "response" => Ok(Self::Response),
            "resolution" => Ok(Self::Resolution),
            other => Err(WorkixError::Validation(format!(
                "unknown violation type {other:?}"
            ))),
        }
    }
}
