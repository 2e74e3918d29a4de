//! # Persistence Port
//!
//! The engine never talks to a database directly. Every component receives
//! an `Arc<dyn WorkOrderStore>` at construction.
//!
//! ## Atomicity contract
//!
//! - `compare_and_set_status` writes the new status, fills empty milestone
//!   stamps, and appends the activity entry in one atomic step, only if the
//!   current status equals `change.from`.
//! - `compare_and_bump_escalation_level` raises one clock's level only if
//!   it still equals `expected` and the work order is not terminal.
//! - `insert_violation_if_absent` inserts only if no row exists for the
//!   `(work_order_id, violation_type, escalation_level)` triple and the work
//!   order is not terminal, checked in the same atomic step.
//! - `freeze_sla` writes the assignment only if none exists yet.
//! - `insert_policy` refuses to change a policy an open work order
//!   references. Re-inserting an identical policy is a no-op.
//!
//! Adapters: [`memory::MemoryStore`] (single write lock) and
//! [`postgres::PgStore`] (conditional `UPDATE`s and row locks).

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use workix_core::{PolicyId, ViolationType, WorkOrderId};
use workix_sla::{SlaPolicy, SlaViolation, ViolationFilter};
use workix_state::{ActivityEntry, SlaAssignment, StatusChange, WorkOrder};

use crate::notify::Notification;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors from a store adapter.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row could not be mapped back to a domain value.
    #[error("corrupt {table} row: {reason}")]
    Corrupt { table: &'static str, reason: String },

    #[error("{0} already exists")]
    Duplicate(WorkOrderId),

    /// An open work order still runs on this policy; it cannot be changed.
    #[error("{0} is referenced by an open work order")]
    PolicyInUse(PolicyId),
}

/// Result of a compare-and-set write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasOutcome {
    /// The guard held; carries the work order as written.
    Applied(WorkOrder),
    /// The guard failed or the work order does not exist. Nothing written.
    Conflict,
}

/// Result of an idempotent violation insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(SlaViolation),
    /// A row for the triple already existed; it is returned unchanged.
    Existing(SlaViolation),
    /// The work order is terminal or gone. Nothing written.
    WorkOrderClosed,
}

#[async_trait]
pub trait WorkOrderStore: Send + Sync {
    /// Insert a new work order together with its `created` activity entry.
    async fn insert_work_order(
        &self,
        order: &WorkOrder,
        created: &ActivityEntry,
    ) -> Result<(), StoreError>;

    async fn get_work_order(&self, id: WorkOrderId) -> Result<Option<WorkOrder>, StoreError>;

    /// Every non-terminal work order.
    async fn load_open_work_orders(&self) -> Result<Vec<WorkOrder>, StoreError>;

    /// Every work order, terminal or not.
    async fn list_work_orders(&self) -> Result<Vec<WorkOrder>, StoreError>;

    /// Insert or replace a policy. Fails with [`StoreError::PolicyInUse`]
    /// if the stored version differs and an open work order references it.
    async fn insert_policy(&self, policy: &SlaPolicy) -> Result<(), StoreError>;

    async fn get_policy(&self, id: PolicyId) -> Result<Option<SlaPolicy>, StoreError>;

    async fn list_policies(&self) -> Result<Vec<SlaPolicy>, StoreError>;

    /// Write the SLA assignment if the work order has none and is open.
    async fn freeze_sla(
        &self,
        id: WorkOrderId,
        assignment: SlaAssignment,
    ) -> Result<CasOutcome, StoreError>;

    async fn compare_and_set_status(&self, change: &StatusChange) -> Result<CasOutcome, StoreError>;

    async fn compare_and_bump_escalation_level(
        &self,
        id: WorkOrderId,
        kind: ViolationType,
        expected: u32,
        new_level: u32,
    ) -> Result<CasOutcome, StoreError>;

    async fn insert_violation_if_absent(
        &self,
        violation: &SlaViolation,
    ) -> Result<InsertOutcome, StoreError>;

    /// Violations matching `filter`, oldest first.
    async fn list_violations(
        &self,
        filter: &ViolationFilter,
    ) -> Result<Vec<SlaViolation>, StoreError>;

    async fn violations_for(&self, id: WorkOrderId) -> Result<Vec<SlaViolation>, StoreError> {
        self.list_violations(&ViolationFilter::for_work_order(id))
            .await
    }

    /// Activity log of a work order, oldest first.
    async fn activities_for(&self, id: WorkOrderId) -> Result<Vec<ActivityEntry>, StoreError>;

    async fn insert_notification(&self, notification: &Notification) -> Result<(), StoreError>;
}
