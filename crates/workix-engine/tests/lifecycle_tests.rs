//! # Integration Tests for Work Order Lifecycle
//!
//! Registration, status transitions through the engine, the activity log,
//! and business-hours deadline freezing.

use std::sync::Arc;
use std::time::Duration;

use workix_core::{Priority, Timestamp};
use workix_engine::{EngineError, ManualClock, MemoryStore, SlaEngine, StoreError};
use workix_sla::{BusinessCalendar, SlaPolicy};
use workix_state::{ActivityType, TransitionError, WorkOrder, WorkOrderStatus};

const HOUR: Duration = Duration::from_secs(3600);

fn ts(s: &str) -> Timestamp {
    Timestamp::parse(s).unwrap()
}

/// Helper: engine over a fresh store with the clock at `now`.
fn engine_at(now: &str) -> (SlaEngine, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(ts(now)));
    let engine = SlaEngine::builder(Arc::new(MemoryStore::new()))
        .clock(clock.clone())
        .calendar(BusinessCalendar::standard())
        .build();
    (engine, clock)
}

async fn registered(engine: &SlaEngine, created_at: &str) -> WorkOrder {
    let policy = SlaPolicy::new("Medium", Priority::Medium, 4 * HOUR, 24 * HOUR);
    engine.register_policy(&policy).await.unwrap();
    engine
        .register_work_order(
            WorkOrder::new("Leaking tap", Priority::Medium, ts(created_at)).with_number("WO-1042"),
            Some("front-desk"),
        )
        .await
        .unwrap()
}

// -- Registration ---------------------------------------------------------------

#[tokio::test]
async fn test_register_freezes_deadlines_and_logs_creation() {
    let (engine, _) = engine_at("2026-03-02T08:00:00Z");
    let wo = registered(&engine, "2026-03-02T08:00:00Z").await;

    let sla = wo.sla.unwrap();
    assert_eq!(sla.response_due_at, ts("2026-03-02T12:00:00Z"));
    assert_eq!(sla.resolution_due_at, ts("2026-03-03T08:00:00Z"));
    assert_eq!(wo.status, WorkOrderStatus::Pending);
    assert_eq!(wo.escalation_level(), 0);

    let log = engine.activities_for(wo.id).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].activity_type, ActivityType::Created);
    assert_eq!(log[0].actor.as_deref(), Some("front-desk"));
    assert_eq!(log[0].description, "Work order created: Leaking tap");
}

#[tokio::test]
async fn test_register_duplicate_rejected() {
    let (engine, _) = engine_at("2026-03-02T08:00:00Z");
    let wo = registered(&engine, "2026-03-02T08:00:00Z").await;

    let err = engine.register_work_order(wo, None).await.unwrap_err();
    assert!(matches!(err, EngineError::Store(StoreError::Duplicate(_))));
}

#[tokio::test]
async fn test_business_hours_deadline_skips_weekend() {
    let (engine, _) = engine_at("2026-03-06T15:00:00Z");
    let policy = SlaPolicy::new("High", Priority::High, 8 * HOUR, 10 * HOUR).business_hours_only(true);
    engine.register_policy(&policy).await.unwrap();

    // Friday 15:00 UTC, Mon-Fri 09:00-17:00.
    let wo = engine
        .register_work_order(
            WorkOrder::new("HVAC down", Priority::High, ts("2026-03-06T15:00:00Z")),
            None,
        )
        .await
        .unwrap();
    let sla = wo.sla.unwrap();
    assert_eq!(sla.response_due_at, ts("2026-03-09T15:00:00Z"));
    assert_eq!(sla.resolution_due_at, ts("2026-03-09T17:00:00Z"));
}

#[tokio::test]
async fn test_invalid_policy_rejected_at_registration() {
    let (engine, _) = engine_at("2026-03-02T08:00:00Z");
    let policy = SlaPolicy::new("Broken", Priority::Low, 10 * HOUR, HOUR);
    let err = engine.register_policy(&policy).await.unwrap_err();
    assert!(matches!(err, EngineError::Policy(_)));
}

// -- Transitions ----------------------------------------------------------------

#[tokio::test]
async fn test_full_lifecycle_stamps_milestones() {
    let (engine, clock) = engine_at("2026-03-02T08:00:00Z");
    let wo = registered(&engine, "2026-03-02T08:00:00Z").await;

    clock.set(ts("2026-03-02T08:15:00Z"));
    let wo2 = engine
        .request_transition(wo.id, WorkOrderStatus::Acknowledged, Some("tech-7"))
        .await
        .unwrap();
    assert_eq!(wo2.acknowledged_at, Some(ts("2026-03-02T08:15:00Z")));

    clock.set(ts("2026-03-02T09:00:00Z"));
    engine
        .request_transition(wo.id, WorkOrderStatus::InProgress, Some("tech-7"))
        .await
        .unwrap();
    clock.set(ts("2026-03-02T10:00:00Z"));
    engine
        .request_transition(wo.id, WorkOrderStatus::OnHold, Some("tech-7"))
        .await
        .unwrap();
    clock.set(ts("2026-03-02T11:00:00Z"));
    engine
        .request_transition(wo.id, WorkOrderStatus::InProgress, Some("tech-7"))
        .await
        .unwrap();
    clock.set(ts("2026-03-02T12:30:00Z"));
    let done = engine
        .request_transition(wo.id, WorkOrderStatus::Completed, Some("tech-7"))
        .await
        .unwrap();

    assert_eq!(done.status, WorkOrderStatus::Completed);
    assert_eq!(done.acknowledged_at, Some(ts("2026-03-02T08:15:00Z")));
    // Resuming from hold keeps the first start.
    assert_eq!(done.started_at, Some(ts("2026-03-02T09:00:00Z")));
    assert_eq!(done.completed_at, Some(ts("2026-03-02T12:30:00Z")));

    let log = engine.activities_for(wo.id).await.unwrap();
    assert_eq!(log.len(), 6);
    assert!(log[1..]
        .iter()
        .all(|a| a.activity_type == ActivityType::StatusChange));
    assert_eq!(log[1].from_status, Some(WorkOrderStatus::Pending));
    assert_eq!(log[1].to_status, Some(WorkOrderStatus::Acknowledged));
    assert!(log.windows(2).all(|w| w[0].created_at <= w[1].created_at));
}

#[tokio::test]
async fn test_repeated_transition_is_noop() {
    let (engine, clock) = engine_at("2026-03-02T08:00:00Z");
    let wo = registered(&engine, "2026-03-02T08:00:00Z").await;

    clock.set(ts("2026-03-02T08:10:00Z"));
    let first = engine
        .request_transition(wo.id, WorkOrderStatus::Acknowledged, None)
        .await
        .unwrap();
    clock.set(ts("2026-03-02T08:20:00Z"));
    let second = engine
        .request_transition(wo.id, WorkOrderStatus::Acknowledged, None)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(engine.activities_for(wo.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_disallowed_transition_rejected() {
    let (engine, _) = engine_at("2026-03-02T08:00:00Z");
    let wo = registered(&engine, "2026-03-02T08:00:00Z").await;

    let err = engine
        .request_transition(wo.id, WorkOrderStatus::Completed, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Transition(TransitionError::InvalidTransition {
            from: WorkOrderStatus::Pending,
            to: WorkOrderStatus::Completed,
            ..
        })
    ));
    let current = engine.get_work_order(wo.id).await.unwrap();
    assert_eq!(current.status, WorkOrderStatus::Pending);
    assert_eq!(engine.activities_for(wo.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_terminal_work_order_rejects_transitions() {
    let (engine, _) = engine_at("2026-03-02T08:00:00Z");
    let wo = registered(&engine, "2026-03-02T08:00:00Z").await;
    engine
        .request_transition(wo.id, WorkOrderStatus::Cancelled, None)
        .await
        .unwrap();

    for target in [
        WorkOrderStatus::Pending,
        WorkOrderStatus::Acknowledged,
        WorkOrderStatus::InProgress,
        WorkOrderStatus::Completed,
    ] {
        let result = engine.request_transition(wo.id, target, None).await;
        assert!(matches!(result, Err(EngineError::Transition(_))), "{target}");
    }
}

#[tokio::test]
async fn test_unknown_work_order() {
    let (engine, _) = engine_at("2026-03-02T08:00:00Z");
    let missing = WorkOrder::new("ghost", Priority::Low, ts("2026-03-02T08:00:00Z"));
    let err = engine
        .request_transition(missing.id, WorkOrderStatus::Acknowledged, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::WorkOrderNotFound(id) if id == missing.id));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_identical_transitions_log_once() {
    let (engine, clock) = engine_at("2026-03-02T08:00:00Z");
    let wo = registered(&engine, "2026-03-02T08:00:00Z").await;
    clock.set(ts("2026-03-02T08:05:00Z"));

    let (a, b) = tokio::join!(
        engine.request_transition(wo.id, WorkOrderStatus::Acknowledged, Some("a")),
        engine.request_transition(wo.id, WorkOrderStatus::Acknowledged, Some("b")),
    );
    assert_eq!(a.unwrap().status, WorkOrderStatus::Acknowledged);
    assert_eq!(b.unwrap().status, WorkOrderStatus::Acknowledged);
    assert_eq!(engine.activities_for(wo.id).await.unwrap().len(), 2);
}
