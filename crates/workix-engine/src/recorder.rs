//! # Violation Recorder
//!
//! The durability boundary of an escalation. Writes are idempotent on the
//! `(work_order_id, violation_type, escalation_level)` triple, so a retried
//! or duplicated call returns the row already stored instead of failing.

use std::sync::Arc;
use std::time::Duration;

use workix_sla::SlaViolation;

use crate::error::EngineError;
use crate::store::{InsertOutcome, StoreError, WorkOrderStore};

/// Store failures retried before giving up on a record.
const RECORD_RETRIES: u32 = 3;

const RECORD_RETRY_DELAY: Duration = Duration::from_millis(50);

pub struct ViolationRecorder {
    store: Arc<dyn WorkOrderStore>,
}

impl ViolationRecorder {
    pub fn new(store: Arc<dyn WorkOrderStore>) -> Self {
        Self { store }
    }

    /// Persist `candidate` unless a violation for its key already exists.
    ///
    /// Store errors are retried a few times; the insert is idempotent, so
    /// a retry after an ambiguous failure cannot duplicate the row.
    pub async fn record(&self, candidate: SlaViolation) -> Result<InsertOutcome, EngineError> {
        let outcome = self.insert_with_retry(&candidate).await?;
        match &outcome {
            InsertOutcome::Inserted(v) => {
                tracing::info!(
                    work_order_id = %v.work_order_id,
                    violation_type = %v.violation_type,
                    level = v.escalation_level,
                    delay_secs = v.delay.as_secs(),
                    "SLA violation recorded"
                );
                metrics::counter!(
                    "workix_sla_violations_recorded_total",
                    "violation_type" => v.violation_type.as_str()
                )
                .increment(1);
            }
            InsertOutcome::Existing(v) => {
                tracing::debug!(
                    violation_id = %v.id,
                    level = v.escalation_level,
                    "violation already recorded"
                );
            }
            InsertOutcome::WorkOrderClosed => {
                tracing::debug!(
                    work_order_id = %candidate.work_order_id,
                    "work order closed before violation could be recorded"
                );
            }
        }
        Ok(outcome)
    }

    async fn insert_with_retry(&self, candidate: &SlaViolation) -> Result<InsertOutcome, StoreError> {
        let mut attempt = 0;
        loop {
            match self.store.insert_violation_if_absent(candidate).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) if attempt < RECORD_RETRIES => {
                    attempt += 1;
                    tracing::warn!(
                        work_order_id = %candidate.work_order_id,
                        attempt,
                        error = %e,
                        "violation insert failed, retrying"
                    );
                    tokio::time::sleep(RECORD_RETRY_DELAY * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
