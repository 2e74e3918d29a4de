//! # Policy Resolution
//!
//! Matches a policy for a work order and freezes its deadlines. Runs once
//! per work order; after an assignment exists, later calls return the work
//! order unchanged.

use std::sync::Arc;

use workix_core::WorkOrderId;
use workix_sla::{DeadlineCalculator, PolicyMatcher};
use workix_state::{SlaAssignment, WorkOrder};

use crate::clock::Clock;
use crate::error::EngineError;
use crate::store::{CasOutcome, WorkOrderStore};

pub struct PolicyResolver {
    store: Arc<dyn WorkOrderStore>,
    calculator: DeadlineCalculator,
    clock: Arc<dyn Clock>,
}

impl PolicyResolver {
    pub fn new(
        store: Arc<dyn WorkOrderStore>,
        calculator: DeadlineCalculator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            calculator,
            clock,
        }
    }

    pub fn calculator(&self) -> &DeadlineCalculator {
        &self.calculator
    }

    /// Resolve the policy for `id` and persist its deadlines.
    ///
    /// When no active policy matches, the work order is returned without
    /// an assignment; the sweep retries resolution on later passes.
    pub async fn resolve_policy_and_freeze_deadlines(
        &self,
        id: WorkOrderId,
    ) -> Result<WorkOrder, EngineError> {
        let order = self
            .store
            .get_work_order(id)
            .await?
            .ok_or(EngineError::WorkOrderNotFound(id))?;
        if order.sla.is_some() || order.is_terminal() {
            return Ok(order);
        }

        let now = self.clock.now();
        let matcher = PolicyMatcher::new(self.store.list_policies().await?);
        let policy = match matcher.find(order.priority, now) {
            Ok(policy) => policy,
            Err(e) => {
                tracing::info!(work_order_id = %id, priority = %order.priority, "{e}; no deadlines set");
                return Ok(order);
            }
        };

        let deadlines = self.calculator.compute(order.created_at, policy)?;
        let assignment = SlaAssignment {
            policy_id: policy.id,
            response_due_at: deadlines.response_due_at,
            resolution_due_at: deadlines.resolution_due_at,
            resolved_at: now,
        };

        match self.store.freeze_sla(id, assignment).await? {
            CasOutcome::Applied(updated) => {
                tracing::info!(
                    work_order_id = %id,
                    policy_id = %policy.id,
                    response_due_at = %deadlines.response_due_at,
                    resolution_due_at = %deadlines.resolution_due_at,
                    "SLA deadlines frozen"
                );
                Ok(updated)
            }
            // Resolved concurrently or closed in the meantime.
            CasOutcome::Conflict => self
                .store
                .get_work_order(id)
                .await?
                .ok_or(EngineError::WorkOrderNotFound(id)),
        }
    }
}
