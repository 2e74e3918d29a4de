//! Fan-out of escalation notifications.
//!
//! One [`Notification`] per target, delivered over every configured
//! channel with bounded retries. A failing channel or target never stops
//! the others, and nothing here can fail the caller: the outcome is a
//! [`DeliveryReport`].

use std::sync::Arc;

use workix_core::NotificationId;
use workix_sla::{NotifyTarget, SlaViolation};
use workix_state::WorkOrder;

use super::channel::NotificationChannel;
use super::retry::{deliver_with_retry, RetryPolicy};
use super::{
    escalation_priority, ChannelOutcome, Notification, NotificationReference, NotificationType,
};
use crate::store::WorkOrderStore;

/// Delivery outcome for one target.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetDelivery {
    pub target: NotifyTarget,
    pub notification_id: NotificationId,
    pub outcomes: Vec<ChannelOutcome>,
}

/// Delivery outcome for one dispatch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeliveryReport {
    pub deliveries: Vec<TargetDelivery>,
}

impl DeliveryReport {
    /// Whether any channel failed for any target.
    pub fn is_degraded(&self) -> bool {
        self.deliveries
            .iter()
            .flat_map(|d| &d.outcomes)
            .any(|o| !o.delivered)
    }

    pub fn delivered_count(&self) -> usize {
        self.deliveries
            .iter()
            .flat_map(|d| &d.outcomes)
            .filter(|o| o.delivered)
            .count()
    }
}

pub struct NotificationDispatcher {
    store: Arc<dyn WorkOrderStore>,
    channels: Vec<Arc<dyn NotificationChannel>>,
    retry: RetryPolicy,
}

impl NotificationDispatcher {
    pub fn new(
        store: Arc<dyn WorkOrderStore>,
        channels: Vec<Arc<dyn NotificationChannel>>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            channels,
            retry,
        }
    }

    /// Notify `targets` about `violation` on `order`.
    pub async fn dispatch(
        &self,
        order: &WorkOrder,
        violation: &SlaViolation,
        targets: &[NotifyTarget],
    ) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        for target in targets {
            let mut notification = build_notification(order, violation, target.clone());

            for channel in &self.channels {
                let outcome = self.deliver(channel.as_ref(), &notification).await;
                notification.sent_via.push(outcome);
            }

            if let Err(e) = self.store.insert_notification(&notification).await {
                tracing::warn!(
                    notification_id = %notification.id,
                    work_order_id = %order.id,
                    error = %e,
                    "failed to persist notification"
                );
            }

            report.deliveries.push(TargetDelivery {
                target: notification.target,
                notification_id: notification.id,
                outcomes: notification.sent_via,
            });
        }
        report
    }

    async fn deliver(
        &self,
        channel: &dyn NotificationChannel,
        notification: &Notification,
    ) -> ChannelOutcome {
        let name = channel.name().to_string();
        let (result, attempts) =
            deliver_with_retry(self.retry, &name, || channel.deliver(notification)).await;
        match result {
            Ok(()) => ChannelOutcome {
                channel: name,
                delivered: true,
                attempts,
                error: None,
            },
            Err(e) => {
                tracing::warn!(
                    channel = %name,
                    notification_id = %notification.id,
                    target = %notification.target,
                    attempts,
                    error = %e,
                    "notification delivery degraded"
                );
                metrics::counter!(
                    "workix_notification_delivery_failures_total",
                    "channel" => name.clone()
                )
                .increment(1);
                ChannelOutcome {
                    channel: name,
                    delivered: false,
                    attempts,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

fn build_notification(
    order: &WorkOrder,
    violation: &SlaViolation,
    target: NotifyTarget,
) -> Notification {
    let label = order.label();
    let title = format!(
        "SLA {} breach: {} (level {})",
        violation.violation_type, label, violation.escalation_level
    );
    let message = format!(
        "Work order {label} \"{}\" missed its {} deadline of {} by {:.2}h. Escalation level {}.",
        order.title,
        violation.violation_type,
        violation.expected_at,
        violation.delay_hours(),
        violation.escalation_level,
    );
    Notification {
        id: NotificationId::new(),
        notification_type: NotificationType::SlaViolation,
        target,
        title,
        message,
        priority: escalation_priority(order.priority, violation.escalation_level),
        reference: NotificationReference {
            work_order_id: order.id,
            violation_id: violation.id,
        },
        sent_via: Vec::new(),
        created_at: violation.detected_at,
    }
}
