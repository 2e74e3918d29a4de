//! # Escalation Notifications
//!
//! Notifications are a best-effort side effect of a recorded violation.
//! Delivery failures are logged, counted, and persisted on the
//! notification row; they never touch the violation or the work order.

pub mod channel;
pub mod dispatcher;
pub mod retry;

use serde::{Deserialize, Serialize};

use workix_core::{NotificationId, Priority, Timestamp, ViolationId, WorkOrderId};
use workix_sla::NotifyTarget;

pub use channel::{ChannelError, ChannelKind, LogChannel, NotificationChannel, WebhookChannel};
pub use dispatcher::{DeliveryReport, NotificationDispatcher, TargetDelivery};
pub use retry::RetryPolicy;

/// Category of a notification. Only SLA escalations are produced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    SlaViolation,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SlaViolation => "sla_violation",
        }
    }
}

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationReference {
    pub work_order_id: WorkOrderId,
    pub violation_id: ViolationId,
}

/// Result of delivering one notification over one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelOutcome {
    pub channel: String,
    pub delivered: bool,
    /// Attempts made, including the first.
    pub attempts: u32,
    pub error: Option<String>,
}

/// A notification addressed to one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub notification_type: NotificationType,
    pub target: NotifyTarget,
    pub title: String,
    pub message: String,
    pub priority: Priority,
    pub reference: NotificationReference,
    pub sent_via: Vec<ChannelOutcome>,
    pub created_at: Timestamp,
}

/// Notification priority for an escalation level.
///
/// Level 1 keeps the work order's priority, level 2 raises it one step,
/// level 3 and above are always critical.
pub fn escalation_priority(work_order_priority: Priority, level: u32) -> Priority {
    match level {
        0 | 1 => work_order_priority,
        2 => work_order_priority.raised(),
        _ => Priority::Critical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escalation_priority() {
        assert_eq!(escalation_priority(Priority::Low, 1), Priority::Low);
        assert_eq!(escalation_priority(Priority::Low, 2), Priority::Medium);
        assert_eq!(escalation_priority(Priority::High, 2), Priority::Critical);
        assert_eq!(escalation_priority(Priority::Low, 3), Priority::Critical);
    }

    #[test]
    fn test_webhook_payload_shape() {
        let notification = Notification {
            id: NotificationId::new(),
            notification_type: NotificationType::SlaViolation,
            target: NotifyTarget::Role("supervisor".to_string()),
            title: "SLA response breach: WO-9 (level 1)".to_string(),
            message: String::new(),
            priority: Priority::High,
            reference: NotificationReference {
                work_order_id: WorkOrderId::new(),
                violation_id: ViolationId::new(),
            },
            sent_via: Vec::new(),
            created_at: Timestamp::parse("2026-03-02T09:01:00Z").unwrap(),
        };
        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["notification_type"], "sla_violation");
        assert_eq!(json["target"], serde_json::json!({"kind": "role", "id": "supervisor"}));
        assert_eq!(json["priority"], "high");
        assert_eq!(json["created_at"], "2026-03-02T09:01:00Z");
    }
}
