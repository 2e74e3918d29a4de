//! # Escalation Scheduler
//!
//! A periodic sweep over every open work order. For each one it plans the
//! escalation tiers that are due and fires them in ascending level order:
//!
//! 1. compare-and-bump the clock's level (guarded by the level read and a
//!    non-terminal status),
//! 2. record the violation (idempotent),
//! 3. dispatch notifications (best effort).
//!
//! Before planning new tiers, the sweep records any violation still missing
//! for a level the clock already reached, so a record that failed after its
//! bump is repaired on the next pass. Notifications go out only for the
//! call that actually inserts the row.
//!
//! Several scheduler instances may sweep the same store concurrently; the
//! compare-and-bump guarantees one winner per tier. Work orders are
//! evaluated in parallel up to `max_concurrency`, each in its own task, so
//! one slow or failing work order does not hold up the rest.
//!
//! [`EscalationScheduler::start`] runs the sweep on a fixed interval until
//! [`SchedulerHandle::stop`] is called. A sweep in progress always runs to
//! completion before the task exits.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

use workix_core::{Timestamp, WorkOrderId};
use workix_sla::{
    plan_escalations, unrecorded_escalations, DueEscalation, SlaPolicy, SlaViolation, ViolationKey,
};
use workix_state::WorkOrder;

use crate::clock::Clock;
use crate::error::EngineError;
use crate::notify::NotificationDispatcher;
use crate::recorder::ViolationRecorder;
use crate::resolution::PolicyResolver;
use crate::store::{CasOutcome, InsertOutcome, WorkOrderStore};

/// Counters for one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Open work orders looked at.
    pub evaluated: usize,
    /// Policies resolved during the sweep for previously unmatched orders.
    pub policies_resolved: usize,
    /// Levels bumped by this sweep.
    pub escalations: usize,
    pub violations_recorded: usize,
    /// Work orders skipped because another writer moved them first.
    pub conflicts: usize,
    /// Work orders whose evaluation failed.
    pub failures: usize,
    /// Deliveries that failed after retries.
    pub degraded_deliveries: usize,
}

impl SweepReport {
    fn merge(&mut self, other: &SweepReport) {
        self.evaluated += other.evaluated;
        self.policies_resolved += other.policies_resolved;
        self.escalations += other.escalations;
        self.violations_recorded += other.violations_recorded;
        self.conflicts += other.conflicts;
        self.failures += other.failures;
        self.degraded_deliveries += other.degraded_deliveries;
    }
}

#[derive(Clone)]
pub struct EscalationScheduler {
    store: Arc<dyn WorkOrderStore>,
    clock: Arc<dyn Clock>,
    resolver: Arc<PolicyResolver>,
    recorder: Arc<ViolationRecorder>,
    dispatcher: Arc<NotificationDispatcher>,
    interval: Duration,
    max_concurrency: usize,
}

impl EscalationScheduler {
    pub fn new(
        store: Arc<dyn WorkOrderStore>,
        clock: Arc<dyn Clock>,
        resolver: Arc<PolicyResolver>,
        recorder: Arc<ViolationRecorder>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            store,
            clock,
            resolver,
            recorder,
            dispatcher,
            interval: Duration::from_secs(60),
            max_concurrency: 16,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one sweep over all open work orders.
    ///
    /// Fails only if the open set cannot be loaded. Per-work-order errors
    /// are logged and counted in [`SweepReport::failures`].
    #[tracing::instrument(name = "sweep", skip(self))]
    pub async fn sweep_once(&self) -> Result<SweepReport, EngineError> {
        let now = self.clock.now();
        let orders = self.store.load_open_work_orders().await?;
        tracing::debug!(open = orders.len(), %now, "sweep started");

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks: JoinSet<(WorkOrderId, Result<SweepReport, EngineError>)> = JoinSet::new();
        for order in orders {
            let this = self.clone();
            let semaphore = semaphore.clone();
            tasks.spawn(async move {
                let id = order.id;
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (id, Ok(SweepReport::default()));
                };
                (id, this.evaluate(order, now).await)
            });
        }

        let mut report = SweepReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(partial))) => report.merge(&partial),
                Ok((id, Err(e))) => {
                    report.failures += 1;
                    tracing::error!(work_order_id = %id, error = %e, "escalation evaluation failed");
                }
                Err(e) => {
                    report.failures += 1;
                    tracing::error!(error = %e, "escalation task panicked");
                }
            }
        }

        metrics::counter!("workix_sweeps_total").increment(1);
        tracing::debug!(?report, "sweep finished");
        Ok(report)
    }

    async fn evaluate(&self, order: WorkOrder, now: Timestamp) -> Result<SweepReport, EngineError> {
        let mut report = SweepReport {
            evaluated: 1,
            ..SweepReport::default()
        };

        let mut order = if order.sla.is_none() {
            let resolved = self
                .resolver
                .resolve_policy_and_freeze_deadlines(order.id)
                .await?;
            if resolved.sla.is_none() {
                return Ok(report);
            }
            report.policies_resolved += 1;
            resolved
        } else {
            order
        };
        let Some(sla) = order.sla else {
            return Ok(report);
        };

        let policy = self
            .store
            .get_policy(sla.policy_id)
            .await?
            .ok_or(EngineError::PolicyMissing {
                work_order_id: order.id,
                policy_id: sla.policy_id,
            })?;

        if order.escalation.max() > 0 {
            let recorded: Vec<ViolationKey> = self
                .store
                .violations_for(order.id)
                .await?
                .iter()
                .map(SlaViolation::key)
                .collect();
            for due in unrecorded_escalations(&order, &policy, &recorded, now) {
                tracing::warn!(
                    work_order_id = %order.id,
                    violation_type = %due.kind,
                    level = due.level(),
                    "recording violation missed by an earlier sweep"
                );
                if !self.record_and_notify(&order, &policy, &due, now, &mut report).await? {
                    return Ok(report);
                }
            }
        }

        for due in plan_escalations(&order, &policy, now) {
            let bumped = self
                .store
                .compare_and_bump_escalation_level(order.id, due.kind, due.from_level, due.level())
                .await?;
            order = match bumped {
                CasOutcome::Applied(updated) => updated,
                CasOutcome::Conflict => {
                    report.conflicts += 1;
                    metrics::counter!("workix_escalation_conflicts_total").increment(1);
                    self.log_conflict(order.id).await?;
                    return Ok(report);
                }
            };
            report.escalations += 1;
            tracing::info!(
                work_order_id = %order.id,
                violation_type = %due.kind,
                level = due.level(),
                overdue_secs = due.overdue.as_secs(),
                "escalation level raised"
            );

            if !self.record_and_notify(&order, &policy, &due, now, &mut report).await? {
                return Ok(report);
            }
        }
        Ok(report)
    }

    /// Record the violation for `due` and notify its targets if this call
    /// inserted it. Returns `false` once the work order is closed.
    async fn record_and_notify(
        &self,
        order: &WorkOrder,
        policy: &SlaPolicy,
        due: &DueEscalation,
        now: Timestamp,
        report: &mut SweepReport,
    ) -> Result<bool, EngineError> {
        let candidate = SlaViolation::new(
            ViolationKey {
                work_order_id: order.id,
                violation_type: due.kind,
                escalation_level: due.level(),
            },
            policy.id,
            due.expected_at,
            now,
            due.rule.notify_targets.clone(),
        );
        let violation = match self.recorder.record(candidate).await? {
            InsertOutcome::Inserted(v) => v,
            InsertOutcome::Existing(_) => return Ok(true),
            InsertOutcome::WorkOrderClosed => return Ok(false),
        };
        report.violations_recorded += 1;

        if !due.rule.notify_targets.is_empty() {
            let delivery = self
                .dispatcher
                .dispatch(order, &violation, &due.rule.notify_targets)
                .await;
            report.degraded_deliveries += delivery
                .deliveries
                .iter()
                .flat_map(|d| &d.outcomes)
                .filter(|o| !o.delivered)
                .count();
        }
        Ok(true)
    }

    /// Re-read once after a lost bump, for the log line.
    async fn log_conflict(&self, id: WorkOrderId) -> Result<(), EngineError> {
        match self.store.get_work_order(id).await? {
            None => tracing::debug!(work_order_id = %id, "work order gone, skipping"),
            Some(current) if current.is_terminal() => {
                tracing::debug!(work_order_id = %id, status = %current.status, "work order closed, skipping");
            }
            Some(_) => {
                tracing::warn!(work_order_id = %id, "concurrent escalation, skipping until next sweep");
            }
        }
        Ok(())
    }

    /// Spawn the periodic sweep loop.
    pub fn start(&self) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let this = self.clone();
        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(this.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::info!(interval_secs = this.interval.as_secs(), "escalation scheduler started");
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = this.sweep_once().await {
                            tracing::error!(error = %e, "sweep failed");
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::info!("escalation scheduler stopped");
        });
        SchedulerHandle { shutdown_tx, join }
    }
}

/// Handle to a running scheduler loop.
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal shutdown and wait for the in-flight sweep to drain.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.join.await {
            tracing::error!(error = %e, "scheduler task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}
