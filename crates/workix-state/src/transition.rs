//! # Transition Planning
//!
//! [`plan_transition`] validates a requested status change against the
//! transition table and computes everything the store must commit:
//! the new status, the milestone stamps to fill, and the activity entry.
//! It never mutates the work order; the caller commits the resulting
//! [`StatusChange`] with a compare-and-set on the status it was planned from.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use workix_core::{Timestamp, WorkOrderId};

use crate::activity::ActivityEntry;
use crate::status::WorkOrderStatus;
use crate::work_order::WorkOrder;

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors from status transition planning.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The requested edge is not in the transition table.
    #[error("invalid transition for {work_order_id}: {from} -> {to}")]
    InvalidTransition {
        work_order_id: WorkOrderId,
        from: WorkOrderStatus,
        to: WorkOrderStatus,
    },
}

// ─── Stamps ──────────────────────────────────────────────────────────

/// Milestone timestamps a transition fills in.
///
/// A field is `Some` only when the target status owns that milestone and
/// the work order does not have it yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionStamps {
    pub acknowledged_at: Option<Timestamp>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
}

impl TransitionStamps {
    fn for_target(order: &WorkOrder, target: WorkOrderStatus, at: Timestamp) -> Self {
        let mut stamps = Self::default();
        match target {
            WorkOrderStatus::Acknowledged if order.acknowledged_at.is_none() => {
                stamps.acknowledged_at = Some(at);
            }
            WorkOrderStatus::InProgress if order.started_at.is_none() => {
                stamps.started_at = Some(at);
            }
            WorkOrderStatus::Completed if order.completed_at.is_none() => {
                stamps.completed_at = Some(at);
            }
            _ => {}
        }
        stamps
    }

    pub fn is_empty(&self) -> bool {
        self.acknowledged_at.is_none() && self.started_at.is_none() && self.completed_at.is_none()
    }
}

// ─── Plan ────────────────────────────────────────────────────────────

/// A validated status change, ready to commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub work_order_id: WorkOrderId,
    pub from: WorkOrderStatus,
    pub to: WorkOrderStatus,
    pub at: Timestamp,
    pub stamps: TransitionStamps,
    pub activity: ActivityEntry,
}

/// Outcome of planning a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionPlan {
    /// The work order is already in the requested status. Nothing to write.
    Unchanged,
    /// A status change to commit.
    Apply(StatusChange),
}

/// Validate `order.status -> target` and build the change to commit.
///
/// Requesting the current status yields [`TransitionPlan::Unchanged`], so a
/// re-submitted transition succeeds without writing a second activity entry.
pub fn plan_transition(
    order: &WorkOrder,
    target: WorkOrderStatus,
    at: Timestamp,
    actor: Option<&str>,
) -> Result<TransitionPlan, TransitionError> {
    let from = order.status;
    if from == target {
        return Ok(TransitionPlan::Unchanged);
    }
    if !from.can_transition_to(target) {
        return Err(TransitionError::InvalidTransition {
            work_order_id: order.id,
            from,
            to: target,
        });
    }

    Ok(TransitionPlan::Apply(StatusChange {
        work_order_id: order.id,
        from,
        to: target,
        at,
        stamps: TransitionStamps::for_target(order, target, at),
        activity: ActivityEntry::status_change(order.id, from, target, actor, at),
    }))
}

// ─── Tests ───────────────────────────────────────────────────────────
