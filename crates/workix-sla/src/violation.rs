//! # SLA Violations
//!
//! Append-only records of a breached SLA clock reaching an escalation
//! level. At most one exists per [`ViolationKey`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use workix_core::temporal::duration_secs;
use workix_core::{PolicyId, Timestamp, ViolationId, ViolationType, WorkOrderId};

use crate::policy::NotifyTarget;

/// Idempotency key of a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViolationKey {
    pub work_order_id: WorkOrderId,
    pub violation_type: ViolationType,
    pub escalation_level: u32,
}

/// A recorded SLA violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaViolation {
    pub id: ViolationId,
    pub work_order_id: WorkOrderId,
    pub sla_policy_id: PolicyId,
    pub violation_type: ViolationType,
    pub escalation_level: u32,
    /// The deadline that was breached.
    pub expected_at: Timestamp,
    /// Sweep time at which the level was found due.
    pub detected_at: Timestamp,
    /// `detected_at - expected_at`.
    #[serde(with = "duration_secs")]
    pub delay: Duration,
    pub notified_targets: Vec<NotifyTarget>,
    pub created_at: Timestamp,
}

impl SlaViolation {
    pub fn new(
        key: ViolationKey,
        sla_policy_id: PolicyId,
        expected_at: Timestamp,
        detected_at: Timestamp,
        notified_targets: Vec<NotifyTarget>,
    ) -> Self {
        Self {
            id: ViolationId::new(),
            work_order_id: key.work_order_id,
            sla_policy_id,
            violation_type: key.violation_type,
            escalation_level: key.escalation_level,
            expected_at,
            detected_at,
            delay: detected_at.saturating_since(expected_at),
            notified_targets,
            created_at: detected_at,
        }
    }

    pub fn key(&self) -> ViolationKey {
        ViolationKey {
            work_order_id: self.work_order_id,
            violation_type: self.violation_type,
            escalation_level: self.escalation_level,
        }
    }

    /// Delay in hours with two decimals, as shown in reports.
    pub fn delay_hours(&self) -> f64 {
        (self.delay.as_secs_f64() / 36.0).round() / 100.0
    }
}

/// Filter for violation listings. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationFilter {
    pub work_order_id: Option<WorkOrderId>,
    pub violation_type: Option<ViolationType>,
    pub escalation_level: Option<u32>,
}

impl ViolationFilter {
    pub fn for_work_order(id: WorkOrderId) -> Self {
        Self {
            work_order_id: Some(id),
            ..Self::default()
        }
    }

    pub fn matches(&self, violation: &SlaViolation) -> bool {
        self.work_order_id.map_or(true, |id| id == violation.work_order_id)
            && self
                .violation_type
                .map_or(true, |t| t == violation.violation_type)
            && self
                .escalation_level
                .map_or(true, |l| l == violation.escalation_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn violation(kind: ViolationType, level: u32) -> SlaViolation {
        SlaViolation::new(
            ViolationKey {
                work_order_id: WorkOrderId::new(),
                violation_type: kind,
                escalation_level: level,
            },
            PolicyId::new(),
            ts("2026-03-02T09:00:00Z"),
            ts("2026-03-02T10:30:00Z"),
            vec![],
        )
    }

    #[test]
    fn test_delay_from_expected_and_detected() {
        let v = violation(ViolationType::Response, 1);
        assert_eq!(v.delay, Duration::from_secs(5400));
        assert_eq!(v.delay_hours(), 1.5);
        assert_eq!(v.created_at, v.detected_at);
    }

    #[test]
    fn test_filter() {
        let v = violation(ViolationType::Resolution, 2);
        assert!(ViolationFilter::default().matches(&v));
        assert!(ViolationFilter::for_work_order(v.work_order_id).matches(&v));
        assert!(!ViolationFilter::for_work_order(WorkOrderId::new()).matches(&v));

        let by_type = ViolationFilter {
            violation_type: Some(ViolationType::Response),
            ..ViolationFilter::default()
        };
        assert!(!by_type.matches(&v));

        let by_level = ViolationFilter {
            escalation_level: Some(2),
            ..ViolationFilter::default()
        };
        assert!(by_level.matches(&v));
    }

    #[test]
    fn test_serialized_delay_is_seconds() {
        let v = violation(ViolationType::Response, 1);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["delay"], 5400);
        assert_eq!(json["violation_type"], "response");
    }
}
