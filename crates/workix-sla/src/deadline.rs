//! # Deadline Computation
//!
//! Response and resolution deadlines are computed once, when a policy is
//! resolved for a work order, and frozen on the work order from then on.

use serde::{Deserialize, Serialize};

use workix_core::Timestamp;

use crate::calendar::{BusinessCalendar, CalendarError};
use crate::policy::SlaPolicy;

/// The two deadlines of a work order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaDeadlines {
    pub response_due_at: Timestamp,
    pub resolution_due_at: Timestamp,
}

/// Computes deadlines from a policy, in calendar or business time.
#[derive(Debug, Clone, Default)]
pub struct DeadlineCalculator {
    calendar: BusinessCalendar,
}

impl DeadlineCalculator {
    pub fn new(calendar: BusinessCalendar) -> Self {
        Self { calendar }
    }

    pub fn calendar(&self) -> &BusinessCalendar {
        &self.calendar
    }

    /// Deadlines for a work order created at `created_at` under `policy`.
    ///
    /// With `business_hours_only`, durations only accrue inside the
    /// calendar's windows. Given `response_time <= resolution_time`, the
    /// result always has `response_due_at <= resolution_due_at`.
    pub fn compute(
        &self,
        created_at: Timestamp,
        policy: &SlaPolicy,
    ) -> Result<SlaDeadlines, CalendarError> {
        let (response_due_at, resolution_due_at) = if policy.business_hours_only {
            (
                self.calendar
                    .add_business_duration(created_at, policy.response_time)?,
                self.calendar
                    .add_business_duration(created_at, policy.resolution_time)?,
            )
        } else {
            (
                created_at
                    .checked_add(policy.response_time)
                    .ok_or(CalendarError::Overflow)?,
                created_at
                    .checked_add(policy.resolution_time)
                    .ok_or(CalendarError::Overflow)?,
            )
        };
        Ok(SlaDeadlines {
            response_due_at,
            resolution_due_at,
        })
    }
}
