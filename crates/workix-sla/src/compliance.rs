//! # Compliance Summary
//!
//! Share of SLA-tracked work orders with no recorded violation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use workix_core::WorkOrderId;
use workix_state::WorkOrder;

use crate::violation::SlaViolation;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplianceSummary {
    /// Work orders with a resolved policy.
    pub total_with_sla: usize,
    pub compliant: usize,
    pub violated: usize,
    /// `compliant / total_with_sla` as a percentage, two decimals. 100 when
    /// no work order is tracked.
    pub compliance_rate: f64,
}

/// Summarise compliance over `work_orders`.
///
/// Only work orders with an SLA assignment count. A work order is violated
/// if any violation references it, whatever the type or level.
pub fn compliance_summary(work_orders: &[WorkOrder], violations: &[SlaViolation]) -> ComplianceSummary {
    let violated_ids: HashSet<WorkOrderId> = violations.iter().map(|v| v.work_order_id).collect();

    let tracked = work_orders.iter().filter(|wo| wo.sla.is_some());
    let (mut total, mut violated) = (0usize, 0usize);
    for wo in tracked {
        total += 1;
        if violated_ids.contains(&wo.id) {
            violated += 1;
        }
    }
    let compliant = total - violated;
    let compliance_rate = if total == 0 {
        100.0
    } else {
        ((compliant as f64 / total as f64) * 10_000.0).round() / 100.0
    };

    ComplianceSummary {
        total_with_sla: total,
        compliant,
        violated,
        compliance_rate,
    }
}
