//! # Breach Detection and Escalation Planning
//!
//! Pure functions the sweep calls for each open work order:
//!
//! - [`breaches`] lists the SLA clocks whose deadline has passed without
//!   the milestone that stops them.
//! - [`plan_escalations`] turns those breaches into the rule levels that
//!   are due and not yet reached, in ascending level order per clock.
//!
//! A deadline is breached when `now` is strictly after it. A rule is due
//! once the time past the deadline reaches its `trigger_after`.

use std::time::Duration;

use workix_core::{Timestamp, ViolationType};
use workix_state::WorkOrder;

use crate::policy::{EscalationRule, SlaPolicy};
use crate::violation::ViolationKey;

/// A passed deadline on one SLA clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breach {
    pub kind: ViolationType,
    /// The deadline that was missed.
    pub expected_at: Timestamp,
    /// Time elapsed since the deadline.
    pub overdue: Duration,
}

/// An escalation tier that should fire now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueEscalation {
    pub kind: ViolationType,
    /// Level the work order's clock is at before this tier fires.
    pub from_level: u32,
    pub rule: EscalationRule,
    pub expected_at: Timestamp,
    pub overdue: Duration,
}

impl DueEscalation {
    pub fn level(&self) -> u32 {
        self.rule.level
    }
}

/// Breached clocks of `order` at `now`.
///
/// Terminal work orders and orders without an SLA assignment have none.
/// The response clock stops at acknowledgement, the resolution clock at
/// completion.
pub fn breaches(order: &WorkOrder, now: Timestamp) -> Vec<Breach> {
    let Some(sla) = order.sla else {
        return Vec::new();
    };
    if order.is_terminal() {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(2);
    if order.acknowledged_at.is_none() && now > sla.response_due_at {
        out.push(Breach {
            kind: ViolationType::Response,
            expected_at: sla.response_due_at,
            overdue: now.saturating_since(sla.response_due_at),
        });
    }
    if order.completed_at.is_none() && now > sla.resolution_due_at {
        out.push(Breach {
            kind: ViolationType::Resolution,
            expected_at: sla.resolution_due_at,
            overdue: now.saturating_since(sla.resolution_due_at),
        });
    }
    out
}

/// Escalation tiers due for `order` at `now`, response clock first, each
/// clock in ascending level order.
///
/// A tier is due when its level is above the clock's current level and its
/// `trigger_after` has elapsed. Several tiers can be due at once when a
/// sweep was missed; the caller fires them in the returned order, so
/// `from_level` of each entry is the level of the entry before it.
pub fn plan_escalations(order: &WorkOrder, policy: &SlaPolicy, now: Timestamp) -> Vec<DueEscalation> {
    let rules = policy.effective_rules();
    let mut due = Vec::new();
    for breach in breaches(order, now) {
        let mut level = order.escalation.get(breach.kind);
        for rule in rules.iter() {
            if rule.level <= level || breach.overdue < rule.trigger_after {
                continue;
            }
            due.push(DueEscalation {
                kind: breach.kind,
                from_level: level,
                rule: rule.clone(),
                expected_at: breach.expected_at,
                overdue: breach.overdue,
            });
            level = rule.level;
        }
    }
    due
}

/// Tiers a clock has already reached whose violation is missing from
/// `recorded`, response clock first, each clock in ascending level order.
///
/// Raising a level and recording its violation are separate writes. When
/// the record fails after the raise, no later plan includes that tier
/// again; this lists what the next sweep still has to record.
pub fn unrecorded_escalations(
    order: &WorkOrder,
    policy: &SlaPolicy,
    recorded: &[ViolationKey],
    now: Timestamp,
) -> Vec<DueEscalation> {
    let Some(sla) = order.sla else {
        return Vec::new();
    };
    if order.is_terminal() {
        return Vec::new();
    }

    let rules = policy.effective_rules();
    let mut missing = Vec::new();
    for kind in ViolationType::ALL {
        let reached = order.escalation.get(kind);
        if reached == 0 {
            continue;
        }
        let expected_at = match kind {
            ViolationType::Response => sla.response_due_at,
            ViolationType::Resolution => sla.resolution_due_at,
        };
        let mut from_level = 0;
        for rule in rules.iter().filter(|r| r.level <= reached) {
            let key = ViolationKey {
                work_order_id: order.id,
                violation_type: kind,
                escalation_level: rule.level,
            };
            if !recorded.contains(&key) {
                missing.push(DueEscalation {
                    kind,
                    from_level,
                    rule: rule.clone(),
                    expected_at,
                    overdue: now.saturating_since(expected_at),
                });
            }
            from_level = rule.level;
        }
    }
    missing
}

// ─── Tests ───────────────────────────────────────────────────────────
