//! # Work Order Status
//!
//! The status enum and its transition table. Every status change in the
//! engine is checked against [`WorkOrderStatus::can_transition_to`].

use serde::{Deserialize, Serialize};

use workix_core::WorkixError;

/// Lifecycle status of a work order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    /// Created, not yet seen by a technician. Initial state.
    Pending,
    /// A technician has accepted the order. Stops the response clock.
    Acknowledged,
    /// Work has started.
    InProgress,
    /// Work is paused (waiting on parts, access, vendor).
    OnHold,
    /// Work is done. Terminal; stops the resolution clock.
    Completed,
    /// Abandoned. Terminal.
    Cancelled,
}

impl WorkOrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [WorkOrderStatus; 6] = [
        Self::Pending,
        Self::Acknowledged,
        Self::InProgress,
        Self::OnHold,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Whether this status is terminal (no further transitions, no SLA evaluation).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// The statuses directly reachable from this one.
    pub fn allowed_targets(&self) -> &'static [WorkOrderStatus] {
        match self {
            Self::Pending => &[Self::Acknowledged, Self::Cancelled],
            Self::Acknowledged => &[Self::InProgress, Self::Cancelled],
            Self::InProgress => &[Self::Completed, Self::OnHold, Self::Cancelled],
            Self::OnHold => &[Self::InProgress, Self::Cancelled],
            Self::Completed | Self::Cancelled => &[],
        }
    }

    /// Whether `target` is a valid edge from this status.
    ///
    /// A self-edge is not a transition; callers treat it as a no-op.
    pub fn can_transition_to(&self, target: WorkOrderStatus) -> bool {
        self.allowed_targets().contains(&target)
    }

    /// The persisted string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Acknowledged => "acknowledged",
            Self::InProgress => "in_progress",
            Self::OnHold => "on_hold",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkOrderStatus {
    type Err = WorkixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "acknowledged" => Ok(Self::Acknowledged),
            "in_progress" => Ok(Self::InProgress),
            "on_hold" => Ok(Self::OnHold),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(WorkixError::Validation(format!(
                "unknown work order status {other:?}"
            ))),
        }
    }
}
