//! # Engine Errors
//!
//! [`EngineError`] aggregates the narrow errors of the domain crates and
//! the persistence port. `PolicyNotFound` is deliberately absent: a work
//! order without a matching policy is a normal outcome, not an error.

use thiserror::Error;

use workix_core::{PolicyId, WorkOrderId};
use workix_sla::{CalendarError, PolicyError};
use workix_state::TransitionError;

use crate::config::ConfigError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Requested status edge is not allowed. Not retried.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Calendar(#[from] CalendarError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0} not found")]
    WorkOrderNotFound(WorkOrderId),

    /// A work order references a policy the store no longer has.
    #[error("{work_order_id} references missing {policy_id}")]
    PolicyMissing {
        work_order_id: WorkOrderId,
        policy_id: PolicyId,
    },

    /// The status kept changing under concurrent writers.
    #[error("{work_order_id}: status changed concurrently {attempts} times, giving up")]
    TransitionContention {
        work_order_id: WorkOrderId,
        attempts: u32,
    },

    #[error("notification channel setup failed: {0}")]
    Channel(String),
}
