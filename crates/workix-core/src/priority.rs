//! # Work Order Priority
//!
//! The single priority enum shared by work orders, SLA policies, and
//! escalation notifications. Serialized in lowercase to match the
//! persisted column values (`low`, `medium`, `high`, `critical`).

use serde::{Deserialize, Serialize};

use crate::error::WorkixError;

/// Priority of a work order, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Routine work with relaxed targets.
    Low,
    /// Default priority.
    Medium,
    /// Degraded service.
    High,
    /// Safety or outage; tightest targets.
    Critical,
}

impl Priority {
    /// All priorities in ascending order.
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Critical,
    ];

    /// The persisted string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// One step more urgent, saturating at `Critical`.
    pub fn raised(&self) -> Priority {
        match self {
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High | Self::Critical => Self::Critical,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = WorkixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(WorkixError::Validation(format!(
                "unknown priority {other:?}; expected low, medium, high or critical"
            ))),
        }
    }
}
