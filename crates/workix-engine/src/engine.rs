//! # Engine Facade
//!
//! [`SlaEngine`] wires the lifecycle service, policy resolution, the
//! violation recorder, the notification dispatcher, and the scheduler
//! around one store and one clock. Callers outside the crate normally only
//! need this type.

use std::sync::Arc;
use std::time::Duration;

use workix_core::{Timestamp, WorkOrderId};
use workix_sla::{
    compliance_summary, BusinessCalendar, ComplianceSummary, DeadlineCalculator, SlaPolicy,
    SlaViolation, ViolationFilter,
};
use workix_state::{ActivityEntry, WorkOrder, WorkOrderStatus};

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, EngineConfig};
use crate::error::EngineError;
use crate::lifecycle::LifecycleService;
use crate::notify::{
    ChannelKind, LogChannel, NotificationChannel, NotificationDispatcher, RetryPolicy,
    WebhookChannel,
};
use crate::recorder::ViolationRecorder;
use crate::resolution::PolicyResolver;
use crate::scheduler::{EscalationScheduler, SchedulerHandle, SweepReport};
use crate::store::WorkOrderStore;

pub struct SlaEngine {
    store: Arc<dyn WorkOrderStore>,
    clock: Arc<dyn Clock>,
    lifecycle: LifecycleService,
    resolver: Arc<PolicyResolver>,
    scheduler: EscalationScheduler,
}

impl SlaEngine {
    pub fn builder(store: Arc<dyn WorkOrderStore>) -> SlaEngineBuilder {
        SlaEngineBuilder::new(store)
    }

    /// Build an engine from configuration: calendar, retry budget, sweep
    /// interval, and the enabled channels.
    pub fn from_config(
        store: Arc<dyn WorkOrderStore>,
        config: &EngineConfig,
    ) -> Result<Self, EngineError> {
        let mut channels: Vec<Arc<dyn NotificationChannel>> = Vec::new();
        for name in &config.notifications.channels {
            let kind: ChannelKind = name.parse().map_err(ConfigError::Invalid)?;
            channels.push(Arc::new(LogChannel::new(kind)));
        }
        if let Some(url) = &config.notifications.webhook_url {
            let timeout = Duration::from_secs(config.notifications.webhook_timeout_secs);
            let webhook = WebhookChannel::new(url.clone(), timeout)
                .map_err(|e| EngineError::Channel(e.to_string()))?;
            channels.push(Arc::new(webhook));
        }

        Ok(Self::builder(store)
            .calendar(config.calendar.build()?)
            .channels(channels)
            .retry(config.notifications.retry_policy())
            .interval(config.sweep_interval())
            .max_concurrency(config.scheduler.max_concurrency)
            .build())
    }

    pub fn store(&self) -> &Arc<dyn WorkOrderStore> {
        &self.store
    }

    pub fn scheduler(&self) -> &EscalationScheduler {
        &self.scheduler
    }

    pub fn calculator(&self) -> &DeadlineCalculator {
        self.resolver.calculator()
    }

    /// Validate and store a policy. A policy with the same id is replaced
    /// unless an open work order references it, which fails with
    /// [`StoreError::PolicyInUse`](crate::store::StoreError::PolicyInUse).
    /// Deadlines already frozen on work orders are never touched.
    pub async fn register_policy(&self, policy: &SlaPolicy) -> Result<(), EngineError> {
        policy.validate()?;
        self.store.insert_policy(policy).await?;
        tracing::info!(policy_id = %policy.id, priority = %policy.priority, name = %policy.name, "SLA policy registered");
        Ok(())
    }

    /// Store a new work order with its `created` activity entry, then
    /// resolve its policy and freeze deadlines.
    pub async fn register_work_order(
        &self,
        order: WorkOrder,
        actor: Option<&str>,
    ) -> Result<WorkOrder, EngineError> {
        let created = ActivityEntry::created(order.id, &order.title, actor, order.created_at);
        self.store.insert_work_order(&order, &created).await?;
        tracing::info!(
            work_order_id = %order.id,
            priority = %order.priority,
            "work order registered"
        );
        self.resolver
            .resolve_policy_and_freeze_deadlines(order.id)
            .await
    }

    pub async fn request_transition(
        &self,
        id: WorkOrderId,
        target: WorkOrderStatus,
        actor: Option<&str>,
    ) -> Result<WorkOrder, EngineError> {
        self.lifecycle.request_transition(id, target, actor).await
    }

    pub async fn resolve_policy_and_freeze_deadlines(
        &self,
        id: WorkOrderId,
    ) -> Result<WorkOrder, EngineError> {
        self.resolver.resolve_policy_and_freeze_deadlines(id).await
    }

    pub async fn get_work_order(&self, id: WorkOrderId) -> Result<WorkOrder, EngineError> {
        self.store
            .get_work_order(id)
            .await?
            .ok_or(EngineError::WorkOrderNotFound(id))
    }

    pub async fn sweep_once(&self) -> Result<SweepReport, EngineError> {
        self.scheduler.sweep_once().await
    }

    pub fn start(&self) -> SchedulerHandle {
        self.scheduler.start()
    }

    pub async fn list_violations(
        &self,
        filter: &ViolationFilter,
    ) -> Result<Vec<SlaViolation>, EngineError> {
        Ok(self.store.list_violations(filter).await?)
    }

    pub async fn violations_for(&self, id: WorkOrderId) -> Result<Vec<SlaViolation>, EngineError> {
        Ok(self.store.violations_for(id).await?)
    }

    pub async fn activities_for(&self, id: WorkOrderId) -> Result<Vec<ActivityEntry>, EngineError> {
        Ok(self.store.activities_for(id).await?)
    }

    /// Compliance over every work order in the store.
    pub async fn compliance_summary(&self) -> Result<ComplianceSummary, EngineError> {
        let orders = self.store.list_work_orders().await?;
        let violations = self.store.list_violations(&ViolationFilter::default()).await?;
        Ok(compliance_summary(&orders, &violations))
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }
}

/// Builder for [`SlaEngine`]. Everything but the store has a default:
/// system clock, standard calendar, no channels, default retry budget,
/// 60s sweep interval, concurrency 16.
pub struct SlaEngineBuilder {
    store: Arc<dyn WorkOrderStore>,
    clock: Arc<dyn Clock>,
    calendar: BusinessCalendar,
    channels: Vec<Arc<dyn NotificationChannel>>,
    retry: RetryPolicy,
    interval: Duration,
    max_concurrency: usize,
}

impl SlaEngineBuilder {
    pub fn new(store: Arc<dyn WorkOrderStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            calendar: BusinessCalendar::standard(),
            channels: Vec::new(),
            retry: RetryPolicy::default(),
            interval: Duration::from_secs(60),
            max_concurrency: 16,
        }
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn calendar(mut self, calendar: BusinessCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn channels(mut self, channels: Vec<Arc<dyn NotificationChannel>>) -> Self {
        self.channels = channels;
        self
    }

    pub fn channel(mut self, channel: Arc<dyn NotificationChannel>) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn build(self) -> SlaEngine {
        let resolver = Arc::new(PolicyResolver::new(
            self.store.clone(),
            DeadlineCalculator::new(self.calendar),
            self.clock.clone(),
        ));
        let recorder = Arc::new(ViolationRecorder::new(self.store.clone()));
        let dispatcher = Arc::new(NotificationDispatcher::new(
            self.store.clone(),
            self.channels,
            self.retry,
        ));
        let scheduler = EscalationScheduler::new(
            self.store.clone(),
            self.clock.clone(),
            resolver.clone(),
            recorder,
            dispatcher,
        )
        .with_interval(self.interval)
        .with_max_concurrency(self.max_concurrency);

        SlaEngine {
            lifecycle: LifecycleService::new(self.store.clone(), self.clock.clone()),
            store: self.store,
            clock: self.clock,
            resolver,
            scheduler,
        }
    }
}
