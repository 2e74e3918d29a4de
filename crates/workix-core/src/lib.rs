//! # workix-core — Foundational Types for the SLA Engine
//!
//! The leaf of the workspace dependency graph. Every other `workix-*` crate
//! depends on it; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `WorkOrderId`, `PolicyId`,
//!    `ViolationId`, `NotificationId`, `ActivityId` are distinct types, so a
//!    policy id can never be passed where a work order id is expected.
//!
//! 2. **Single `Priority` enum.** One definition shared by work orders,
//!    policies, and notifications. Adding a level forces every `match` to
//!    handle it.
//!
//! 3. **UTC-only timestamps.** `Timestamp` is UTC with seconds precision.
//!    Deadlines, transition stamps, and violation records all use it.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `workix-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod breach;
pub mod error;
pub mod identity;
pub mod priority;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use breach::ViolationType;
pub use error::WorkixError;
pub use identity::{ActivityId, NotificationId, PolicyId, ViolationId, WorkOrderId};
pub use priority::Priority;
pub use temporal::Timestamp;
