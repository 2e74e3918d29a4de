//! # Work Order Record
//!
//! The lifecycle and SLA fields of a work order. Location, assignee, and
//! asset fields belong to other parts of the platform and are not modelled.

use serde::{Deserialize, Serialize};

use workix_core::{PolicyId, Priority, Timestamp, ViolationType, WorkOrderId};

use crate::status::WorkOrderStatus;
use crate::transition::StatusChange;

// ─── SLA Assignment ──────────────────────────────────────────────────

/// The policy resolved for a work order and the deadlines frozen from it.
///
/// Written once by policy resolution and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaAssignment {
    pub policy_id: PolicyId,
    pub response_due_at: Timestamp,
    pub resolution_due_at: Timestamp,
    /// When the policy was resolved.
    pub resolved_at: Timestamp,
}

// ─── Escalation Levels ───────────────────────────────────────────────

/// Highest escalation level reached on each SLA clock.
///
/// Both counters start at 0 and only move upwards, through the store's
/// compare-and-bump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationLevels {
    pub response: u32,
    pub resolution: u32,
}

impl EscalationLevels {
    /// The level reached on the given clock.
    pub fn get(&self, kind: ViolationType) -> u32 {
        match kind {
            ViolationType::Response => self.response,
            ViolationType::Resolution => self.resolution,
        }
    }

    /// Copy with one clock's level replaced.
    pub fn with(mut self, kind: ViolationType, level: u32) -> Self {
        match kind {
            ViolationType::Response => self.response = level,
            ViolationType::Resolution => self.resolution = level,
        }
        self
    }

    /// The overall escalation level of the work order.
    pub fn max(&self) -> u32 {
        self.response.max(self.resolution)
    }
}

// ─── Work Order ──────────────────────────────────────────────────────

/// A work order as seen by the lifecycle and SLA engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: WorkOrderId,
    /// Human-facing number (e.g. `WO-1042`), if the caller assigns one.
    pub number: Option<String>,
    pub title: String,
    pub priority: Priority,
    pub status: WorkOrderStatus,
    pub created_at: Timestamp,
    pub acknowledged_at: Option<Timestamp>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    /// `None` until a policy has been resolved.
    pub sla: Option<SlaAssignment>,
    pub escalation: EscalationLevels,
    pub updated_at: Timestamp,
}

impl WorkOrder {
    /// A new pending work order with no SLA assignment.
    pub fn new(title: impl Into<String>, priority: Priority, created_at: Timestamp) -> Self {
        Self {
            id: WorkOrderId::new(),
            number: None,
            title: title.into(),
            priority,
            status: WorkOrderStatus::Pending,
            created_at,
            acknowledged_at: None,
            started_at: None,
            completed_at: None,
            sla: None,
            escalation: EscalationLevels::default(),
            updated_at: created_at,
        }
    }

    /// Set the human-facing number.
    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// The overall escalation level (highest across both clocks).
    pub fn escalation_level(&self) -> u32 {
        self.escalation.max()
    }

    /// A label for log lines and notification text: the number when set,
    /// otherwise the id.
    pub fn label(&self) -> String {
        match &self.number {
            Some(number) => number.clone(),
            None => self.id.to_string(),
        }
    }

    /// Apply a planned status change in place.
    ///
    /// Milestone stamps already present are kept; a stamp is only written
    /// into an empty slot.
    pub fn apply(&mut self, change: &StatusChange) {
        self.status = change.to;
        let stamps = &change.stamps;
        if self.acknowledged_at.is_none() {
            self.acknowledged_at = stamps.acknowledged_at;
        }
        if self.started_at.is_none() {
            self.started_at = stamps.started_at;
        }
        if self.completed_at.is_none() {
            self.completed_at = stamps.completed_at;
        }
        self.updated_at = change.at;
    }
}
