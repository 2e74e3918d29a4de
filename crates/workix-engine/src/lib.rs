//! # workix-engine — SLA Escalation Engine
//!
//! Drives the pure lifecycle and SLA crates against storage and time:
//!
//! - [`store`]: the `WorkOrderStore` persistence port with in-memory and
//!   Postgres adapters. All guarded writes go through it.
//! - [`lifecycle`]: status transitions with compare-and-set retry.
//! - [`resolution`]: policy matching and deadline freezing.
//! - [`scheduler`]: the periodic escalation sweep.
//! - [`recorder`]: idempotent violation persistence.
//! - [`notify`]: notification channels, retry, and dispatch.
//! - [`config`]: YAML and environment configuration.
//!
//! [`SlaEngine`] ties them together.
//!
//! ## Write ordering
//!
//! For each due escalation tier the sweep bumps the level first, records
//! the violation second, and notifies last. The bump is the only guard
//! that decides which of several concurrent sweeps owns a tier.

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod notify;
pub mod recorder;
pub mod resolution;
pub mod scheduler;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, EngineConfig};
pub use engine::{SlaEngine, SlaEngineBuilder};
pub use error::EngineError;
pub use lifecycle::LifecycleService;
pub use notify::{
    ChannelError, ChannelKind, DeliveryReport, LogChannel, Notification, NotificationChannel,
    NotificationDispatcher, RetryPolicy, WebhookChannel,
};
pub use recorder::ViolationRecorder;
pub use resolution::PolicyResolver;
pub use scheduler::{EscalationScheduler, SchedulerHandle, SweepReport};
pub use store::{CasOutcome, InsertOutcome, MemoryStore, PgStore, StoreError, WorkOrderStore};
