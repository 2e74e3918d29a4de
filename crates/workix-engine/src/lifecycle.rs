//! # Lifecycle Service
//!
//! Applies status transitions through the store's compare-and-set. A lost
//! race re-reads the work order and re-plans, so a concurrent writer that
//! already applied the same target turns the request into a no-op.

use std::sync::Arc;

use workix_core::WorkOrderId;
use workix_state::{plan_transition, TransitionPlan, WorkOrder, WorkOrderStatus};

use crate::clock::Clock;
use crate::error::EngineError;
use crate::store::{CasOutcome, WorkOrderStore};

/// Compare-and-set attempts before reporting contention.
const MAX_CAS_ATTEMPTS: u32 = 3;

pub struct LifecycleService {
    store: Arc<dyn WorkOrderStore>,
    clock: Arc<dyn Clock>,
}

impl LifecycleService {
    pub fn new(store: Arc<dyn WorkOrderStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Move `id` to `target`.
    ///
    /// Requesting the current status succeeds without writing anything.
    /// An edge outside the transition table fails with
    /// [`EngineError::Transition`].
    pub async fn request_transition(
        &self,
        id: WorkOrderId,
        target: WorkOrderStatus,
        actor: Option<&str>,
    ) -> Result<WorkOrder, EngineError> {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let order = self
                .store
                .get_work_order(id)
                .await?
                .ok_or(EngineError::WorkOrderNotFound(id))?;

            let change = match plan_transition(&order, target, self.clock.now(), actor)? {
                TransitionPlan::Unchanged => {
                    tracing::debug!(work_order_id = %id, status = %target, "transition already applied");
                    return Ok(order);
                }
                TransitionPlan::Apply(change) => change,
            };

            match self.store.compare_and_set_status(&change).await? {
                CasOutcome::Applied(updated) => {
                    tracing::info!(
                        work_order_id = %id,
                        from = %change.from,
                        to = %change.to,
                        actor = actor.unwrap_or("system"),
                        "work order status changed"
                    );
                    return Ok(updated);
                }
                CasOutcome::Conflict => {
                    tracing::debug!(work_order_id = %id, attempt, "status changed concurrently, re-reading");
                }
            }
        }
        Err(EngineError::TransitionContention {
            work_order_id: id,
            attempts: MAX_CAS_ATTEMPTS,
        })
    }
}
