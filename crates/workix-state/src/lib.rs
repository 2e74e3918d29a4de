//! # workix-state — Work Order Lifecycle State Machine
//!
//! Implements the work order lifecycle as an explicit status enum with a
//! transition table validated at the point of mutation.
//!
//! ## States
//!
//! ```text
//! PENDING ──▶ ACKNOWLEDGED ──▶ IN_PROGRESS ──▶ COMPLETED (terminal)
//!    │              │              │   ▲
//!    │              │              ▼   │
//!    │              │            ON_HOLD
//!    │              │              │
//!    └──────────────┴──────────────┴──────▶ CANCELLED (terminal)
//! ```
//!
//! ## Design
//!
//! The lifecycle uses an enum with a validated transition table rather than
//! typestate types: the status arrives at runtime from client requests and
//! from the store, so the check has to happen at runtime anyway.
//! [`plan_transition`] is pure. It validates the edge and produces a
//! [`StatusChange`] (new status, milestone stamps, activity entry) that the
//! persistence layer commits atomically with a compare-and-set on the
//! current status.

pub mod activity;
pub mod status;
pub mod transition;
pub mod work_order;

pub use activity::{ActivityEntry, ActivityType};
pub use status::WorkOrderStatus;
pub use transition::{
    plan_transition, StatusChange, TransitionError, TransitionPlan, TransitionStamps,
};
pub use work_order::{EscalationLevels, SlaAssignment, WorkOrder};
