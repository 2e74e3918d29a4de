//! # workix-sla — Service-Level Policy Evaluation
//!
//! Everything about SLAs that can be decided without touching storage:
//!
//! - [`policy`]: `SlaPolicy` and its ordered `EscalationRule`s.
//! - [`matcher`]: picks the one active policy for a priority. Ties go to
//!   the lowest `PolicyId`.
//! - [`calendar`]: business-hours arithmetic over a fixed-offset calendar.
//! - [`deadline`]: response and resolution deadlines for a new work order.
//! - [`escalation`]: which breaches exist right now and which rule levels
//!   are due to fire.
//! - [`violation`]: the violation record and its idempotency key.
//! - [`compliance`]: compliant / violated counts over a set of work orders.
//!
//! The crate performs no I/O. The engine crate drives it from the sweep
//! and from policy resolution.

pub mod calendar;
pub mod compliance;
pub mod deadline;
pub mod escalation;
pub mod matcher;
pub mod policy;
pub mod violation;

pub use calendar::{BusinessCalendar, CalendarError};
pub use compliance::{compliance_summary, ComplianceSummary};
pub use deadline::{DeadlineCalculator, SlaDeadlines};
pub use escalation::{breaches, plan_escalations, unrecorded_escalations, Breach, DueEscalation};
pub use matcher::PolicyMatcher;
pub use policy::{EscalationRule, NotifyTarget, PolicyError, SlaPolicy};
pub use violation::{SlaViolation, ViolationFilter, ViolationKey};
