//! In-memory store.
//!
//! All state sits behind one `parking_lot::RwLock`. Every conditional write
//! runs its guard check and mutation under a single write guard, which is
//! what makes the compare-and-set operations atomic. The lock is never held
//! across an `.await`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use workix_core::{PolicyId, ViolationType, WorkOrderId};
use workix_sla::{SlaPolicy, SlaViolation, ViolationFilter, ViolationKey};
use workix_state::{ActivityEntry, SlaAssignment, StatusChange, WorkOrder};

use super::{CasOutcome, InsertOutcome, StoreError, WorkOrderStore};
use crate::notify::Notification;

#[derive(Debug, Default)]
struct Inner {
    work_orders: HashMap<WorkOrderId, WorkOrder>,
    policies: BTreeMap<PolicyId, SlaPolicy>,
    violations: BTreeMap<ViolationKey, SlaViolation>,
    activities: Vec<ActivityEntry>,
    notifications: Vec<Notification>,
}

/// Thread-safe, cloneable in-memory [`WorkOrderStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notification persisted so far, in insertion order.
    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.read().notifications.clone()
    }

    pub fn violation_count(&self) -> usize {
        self.inner.read().violations.len()
    }
}

#[async_trait]
impl WorkOrderStore for MemoryStore {
    async fn insert_work_order(
        &self,
        order: &WorkOrder,
        created: &ActivityEntry,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        if inner.work_orders.contains_key(&order.id) {
            return Err(StoreError::Duplicate(order.id));
        }
        inner.work_orders.insert(order.id, order.clone());
        inner.activities.push(created.clone());
        Ok(())
    }

    async fn get_work_order(&self, id: WorkOrderId) -> Result<Option<WorkOrder>, StoreError> {
        Ok(self.inner.read().work_orders.get(&id).cloned())
    }

    async fn load_open_work_orders(&self) -> Result<Vec<WorkOrder>, StoreError> {
        let inner = self.inner.read();
        let mut open: Vec<WorkOrder> = inner
            .work_orders
            .values()
            .filter(|wo| !wo.is_terminal())
            .cloned()
            .collect();
        open.sort_by_key(|wo| (wo.created_at, wo.id));
        Ok(open)
    }

    async fn list_work_orders(&self) -> Result<Vec<WorkOrder>, StoreError> {
        let mut all: Vec<WorkOrder> = self.inner.read().work_orders.values().cloned().collect();
        all.sort_by_key(|wo| (wo.created_at, wo.id));
        Ok(all)
    }

    async fn insert_policy(&self, policy: &SlaPolicy) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        if let Some(existing) = inner.policies.get(&policy.id) {
            if existing == policy {
                return Ok(());
            }
            let in_use = inner.work_orders.values().any(|wo| {
                !wo.is_terminal() && wo.sla.is_some_and(|sla| sla.policy_id == policy.id)
            });
            if in_use {
                return Err(StoreError::PolicyInUse(policy.id));
            }
        }
        inner.policies.insert(policy.id, policy.clone());
        Ok(())
    }

    async fn get_policy(&self, id: PolicyId) -> Result<Option<SlaPolicy>, StoreError> {
        Ok(self.inner.read().policies.get(&id).cloned())
    }

    async fn list_policies(&self) -> Result<Vec<SlaPolicy>, StoreError> {
        Ok(self.inner.read().policies.values().cloned().collect())
    }

    async fn freeze_sla(
        &self,
        id: WorkOrderId,
        assignment: SlaAssignment,
    ) -> Result<CasOutcome, StoreError> {
        let mut inner = self.inner.write();
        let Some(wo) = inner.work_orders.get_mut(&id) else {
            return Ok(CasOutcome::Conflict);
        };
        if wo.sla.is_some() || wo.is_terminal() {
            return Ok(CasOutcome::Conflict);
        }
        wo.sla = Some(assignment);
        wo.updated_at = assignment.resolved_at;
        Ok(CasOutcome::Applied(wo.clone()))
    }

    async fn compare_and_set_status(&self, change: &StatusChange) -> Result<CasOutcome, StoreError> {
        let mut inner = self.inner.write();
        let Some(wo) = inner.work_orders.get_mut(&change.work_order_id) else {
            return Ok(CasOutcome::Conflict);
        };
        if wo.status != change.from {
            return Ok(CasOutcome::Conflict);
        }
        wo.apply(change);
        let updated = wo.clone();
        inner.activities.push(change.activity.clone());
        Ok(CasOutcome::Applied(updated))
    }

    async fn compare_and_bump_escalation_level(
        &self,
        id: WorkOrderId,
        kind: ViolationType,
        expected: u32,
        new_level: u32,
    ) -> Result<CasOutcome, StoreError> {
        let mut inner = self.inner.write();
        let Some(wo) = inner.work_orders.get_mut(&id) else {
            return Ok(CasOutcome::Conflict);
        };
        if wo.is_terminal() || wo.escalation.get(kind) != expected || new_level <= expected {
            return Ok(CasOutcome::Conflict);
        }
        wo.escalation = wo.escalation.with(kind, new_level);
        Ok(CasOutcome::Applied(wo.clone()))
    }

    async fn insert_violation_if_absent(
        &self,
        violation: &SlaViolation,
    ) -> Result<InsertOutcome, StoreError> {
        let mut inner = self.inner.write();
        let key = violation.key();
        if let Some(existing) = inner.violations.get(&key) {
            return Ok(InsertOutcome::Existing(existing.clone()));
        }
        let open = inner
            .work_orders
            .get(&violation.work_order_id)
            .is_some_and(|wo| !wo.is_terminal());
        if !open {
            return Ok(InsertOutcome::WorkOrderClosed);
        }
        inner.violations.insert(key, violation.clone());
        Ok(InsertOutcome::Inserted(violation.clone()))
    }

    async fn list_violations(
        &self,
        filter: &ViolationFilter,
    ) -> Result<Vec<SlaViolation>, StoreError> {
        let inner = self.inner.read();
        let mut found: Vec<SlaViolation> = inner
            .violations
            .values()
            .filter(|v| filter.matches(v))
            .cloned()
            .collect();
        found.sort_by_key(|v| (v.created_at, v.key()));
        Ok(found)
    }

    async fn activities_for(&self, id: WorkOrderId) -> Result<Vec<ActivityEntry>, StoreError> {
        Ok(self
            .inner
            .read()
            .activities
            .iter()
            .filter(|a| a.work_order_id == id)
            .cloned()
            .collect())
    }

    async fn insert_notification(&self, notification: &Notification) -> Result<(), StoreError> {
        self.inner.write().notifications.push(notification.clone());
        Ok(())
    }
}
