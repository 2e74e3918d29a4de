//! # Activity Log
//!
//! Immutable entries appended to a work order's history. A status change
//! writes exactly one entry, committed together with the status update.

use serde::{Deserialize, Serialize};

use workix_core::{ActivityId, Timestamp, WorkOrderId};

use crate::status::WorkOrderStatus;

/// Kind of activity-log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    /// The work order was registered with the engine.
    Created,
    /// The status moved along a transition edge.
    StatusChange,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::StatusChange => "status_change",
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a work order's activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: ActivityId,
    pub work_order_id: WorkOrderId,
    pub activity_type: ActivityType,
    pub from_status: Option<WorkOrderStatus>,
    pub to_status: Option<WorkOrderStatus>,
    pub description: String,
    /// User who caused the entry; `None` for system actions.
    pub actor: Option<String>,
    pub created_at: Timestamp,
}

impl ActivityEntry {
    /// The entry written when a work order is registered.
    pub fn created(
        work_order_id: WorkOrderId,
        title: &str,
        actor: Option<&str>,
        at: Timestamp,
    ) -> Self {
        Self {
            id: ActivityId::new(),
            work_order_id,
            activity_type: ActivityType::Created,
            from_status: None,
            to_status: Some(WorkOrderStatus::Pending),
            description: format!("Work order created: {title}"),
            actor: actor.map(str::to_owned),
            created_at: at,
        }
    }

    /// The entry written for a status transition.
    pub fn status_change(
        work_order_id: WorkOrderId,
        from: WorkOrderStatus,
        to: WorkOrderStatus,
        actor: Option<&str>,
        at: Timestamp,
    ) -> Self {
        Self {
            id: ActivityId::new(),
            work_order_id,
            activity_type: ActivityType::StatusChange,
            from_status: Some(from),
            to_status: Some(to),
            description: format!("Status changed from {from} to {to}"),
            actor: actor.map(str::to_owned),
            created_at: at,
        }
    }
}
