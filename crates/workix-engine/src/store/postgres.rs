//! Postgres store.
//!
//! Runtime-checked `sqlx::query` calls against the schema in
//! `migrations/`. Compare-and-set operations are conditional `UPDATE ...
//! RETURNING` statements: zero returned rows means the guard failed. The
//! violation insert takes a `FOR SHARE` lock on the work order row so a
//! concurrent close cannot slip between the status check and the insert.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use uuid::Uuid;

use workix_core::{
    ActivityId, PolicyId, Priority, Timestamp, ViolationId, ViolationType, WorkOrderId,
};
use workix_sla::{EscalationRule, NotifyTarget, SlaPolicy, SlaViolation, ViolationFilter};
use workix_state::{
    ActivityEntry, ActivityType, EscalationLevels, SlaAssignment, StatusChange, WorkOrder,
    WorkOrderStatus,
};

use super::{CasOutcome, InsertOutcome, StoreError, WorkOrderStore};
use crate::notify::Notification;

const WORK_ORDER_COLUMNS: &str = "id, number, title, priority, status, created_at, \
     acknowledged_at, started_at, completed_at, sla_policy_id, response_due_at, \
     resolution_due_at, sla_resolved_at, response_escalation_level, \
     resolution_escalation_level, updated_at";

const POLICY_COLUMNS: &str = "id, name, description, priority, response_time_secs, \
     resolution_time_secs, business_hours_only, escalation_enabled, escalation_rules, \
     active, effective_from, effective_until";

const VIOLATION_COLUMNS: &str = "id, work_order_id, sla_policy_id, violation_type, \
     escalation_level, expected_at, detected_at, delay_secs, notified_targets, created_at";

/// [`WorkOrderStore`] backed by a Postgres connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to `url` and apply the embedded migrations.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await?;
        tracing::info!("Connected to PostgreSQL");

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        Ok(Self { pool })
    }

    /// Wrap an existing pool. Migrations are the caller's concern.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn dt(ts: Timestamp) -> DateTime<Utc> {
    *ts.as_datetime()
}

fn level_to_db(level: u32) -> i32 {
    i32::try_from(level).unwrap_or_else(|_| {
        tracing::warn!(level, "escalation level exceeds i32::MAX, clamping for DB storage");
        i32::MAX
    })
}

fn secs_to_db(d: Duration) -> i64 {
    i64::try_from(d.as_secs()).unwrap_or(i64::MAX)
}

fn corrupt(table: &'static str, reason: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt {
        table,
        reason: reason.to_string(),
    }
}

fn level_column(kind: ViolationType) -> &'static str {
    match kind {
        ViolationType::Response => "response_escalation_level",
        ViolationType::Resolution => "resolution_escalation_level",
    }
}

// ─── Row Types ───────────────────────────────────────────────────────

#[derive(sqlx::FromRow)]
struct WorkOrderRow {
    id: Uuid,
    number: Option<String>,
    title: String,
    priority: String,
    status: String,
    created_at: DateTime<Utc>,
    acknowledged_at: Option<DateTime<Utc>>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    sla_policy_id: Option<Uuid>,
    response_due_at: Option<DateTime<Utc>>,
    resolution_due_at: Option<DateTime<Utc>>,
    sla_resolved_at: Option<DateTime<Utc>>,
    response_escalation_level: i32,
    resolution_escalation_level: i32,
    updated_at: DateTime<Utc>,
}

impl WorkOrderRow {
    fn into_record(self) -> Result<WorkOrder, StoreError> {
        const TABLE: &str = "work_orders";
        let priority: Priority = self.priority.parse().map_err(|e| corrupt(TABLE, e))?;
        let status: WorkOrderStatus = self.status.parse().map_err(|e| corrupt(TABLE, e))?;
        let sla = match (self.sla_policy_id, self.response_due_at, self.resolution_due_at) {
            (Some(policy_id), Some(response), Some(resolution)) => Some(SlaAssignment {
                policy_id: PolicyId(policy_id),
                response_due_at: Timestamp::from_utc(response),
                resolution_due_at: Timestamp::from_utc(resolution),
                resolved_at: Timestamp::from_utc(self.sla_resolved_at.unwrap_or(self.updated_at)),
            }),
            (None, None, None) => None,
            _ => return Err(corrupt(TABLE, "partial SLA assignment")),
        };
        let level = |v: i32| u32::try_from(v).map_err(|e| corrupt(TABLE, e));
        Ok(WorkOrder {
            id: WorkOrderId(self.id),
            number: self.number,
            title: self.title,
            priority,
            status,
            created_at: Timestamp::from_utc(self.created_at),
            acknowledged_at: self.acknowledged_at.map(Timestamp::from_utc),
            started_at: self.started_at.map(Timestamp::from_utc),
            completed_at: self.completed_at.map(Timestamp::from_utc),
            sla,
            escalation: EscalationLevels {
                response: level(self.response_escalation_level)?,
                resolution: level(self.resolution_escalation_level)?,
            },
            updated_at: Timestamp::from_utc(self.updated_at),
        })
    }
}

#[derive(sqlx::FromRow)]
struct PolicyRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    priority: String,
    response_time_secs: i64,
    resolution_time_secs: i64,
    business_hours_only: bool,
    escalation_enabled: bool,
    escalation_rules: Json<Vec<EscalationRule>>,
    active: bool,
    effective_from: Option<DateTime<Utc>>,
    effective_until: Option<DateTime<Utc>>,
}

impl PolicyRow {
    fn into_record(self) -> Result<SlaPolicy, StoreError> {
        const TABLE: &str = "sla_policies";
        let secs = |v: i64| {
            u64::try_from(v)
                .map(Duration::from_secs)
                .map_err(|e| corrupt(TABLE, e))
        };
        Ok(SlaPolicy {
            id: PolicyId(self.id),
            name: self.name,
            description: self.description,
            priority: self.priority.parse().map_err(|e| corrupt(TABLE, e))?,
            response_time: secs(self.response_time_secs)?,
            resolution_time: secs(self.resolution_time_secs)?,
            business_hours_only: self.business_hours_only,
            escalation_enabled: self.escalation_enabled,
            escalation_rules: self.escalation_rules.0,
            active: self.active,
            effective_from: self.effective_from.map(Timestamp::from_utc),
            effective_until: self.effective_until.map(Timestamp::from_utc),
        })
    }
}

#[derive(sqlx::FromRow)]
struct ViolationRow {
    id: Uuid,
    work_order_id: Uuid,
    sla_policy_id: Uuid,
    violation_type: String,
    escalation_level: i32,
    expected_at: DateTime<Utc>,
    detected_at: DateTime<Utc>,
    delay_secs: i64,
    notified_targets: Json<Vec<NotifyTarget>>,
    created_at: DateTime<Utc>,
}

impl ViolationRow {
    fn into_record(self) -> Result<SlaViolation, StoreError> {
        const TABLE: &str = "sla_violations";
        Ok(SlaViolation {
            id: ViolationId(self.id),
            work_order_id: WorkOrderId(self.work_order_id),
            sla_policy_id: PolicyId(self.sla_policy_id),
            violation_type: self.violation_type.parse().map_err(|e| corrupt(TABLE, e))?,
            escalation_level: u32::try_from(self.escalation_level)
                .map_err(|e| corrupt(TABLE, e))?,
            expected_at: Timestamp::from_utc(self.expected_at),
            detected_at: Timestamp::from_utc(self.detected_at),
            delay: u64::try_from(self.delay_secs)
                .map(Duration::from_secs)
                .map_err(|e| corrupt(TABLE, e))?,
            notified_targets: self.notified_targets.0,
            created_at: Timestamp::from_utc(self.created_at),
        })
    }
}

#[derive(sqlx::FromRow)]
struct ActivityRow {
    id: Uuid,
    work_order_id: Uuid,
    activity_type: String,
    from_status: Option<String>,
    to_status: Option<String>,
    description: String,
    actor: Option<String>,
    created_at: DateTime<Utc>,
}

impl ActivityRow {
    fn into_record(self) -> Result<ActivityEntry, StoreError> {
        const TABLE: &str = "work_order_activities";
        let activity_type = match self.activity_type.as_str() {
            "created" => ActivityType::Created,
            "status_change" => ActivityType::StatusChange,
            other => return Err(corrupt(TABLE, format!("unknown activity type {other:?}"))),
        };
        let status = |s: Option<String>| {
            s.map(|s| s.parse::<WorkOrderStatus>())
                .transpose()
                .map_err(|e| corrupt(TABLE, e))
        };
        Ok(ActivityEntry {
            id: ActivityId(self.id),
            work_order_id: WorkOrderId(self.work_order_id),
            activity_type,
            from_status: status(self.from_status)?,
            to_status: status(self.to_status)?,
            description: self.description,
            actor: self.actor,
            created_at: Timestamp::from_utc(self.created_at),
        })
    }
}

async fn insert_activity<'e, E>(executor: E, entry: &ActivityEntry) -> Result<(), sqlx::Error>
where
    E: sqlx::postgres::PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO work_order_activities (id, work_order_id, activity_type,
         from_status, to_status, description, actor, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(entry.id.0)
    .bind(entry.work_order_id.0)
    .bind(entry.activity_type.as_str())
    .bind(entry.from_status.map(|s| s.as_str()))
    .bind(entry.to_status.map(|s| s.as_str()))
    .bind(&entry.description)
    .bind(&entry.actor)
    .bind(dt(entry.created_at))
    .execute(executor)
    .await?;
    Ok(())
}

fn cas(row: Option<WorkOrderRow>) -> Result<CasOutcome, StoreError> {
    match row {
        Some(row) => Ok(CasOutcome::Applied(row.into_record()?)),
        None => Ok(CasOutcome::Conflict),
    }
}

#[async_trait]
impl WorkOrderStore for PgStore {
    async fn insert_work_order(
        &self,
        order: &WorkOrder,
        created: &ActivityEntry,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let inserted = sqlx::query(
            "INSERT INTO work_orders (id, number, title, priority, status, created_at,
             acknowledged_at, started_at, completed_at, sla_policy_id, response_due_at,
             resolution_due_at, sla_resolved_at, response_escalation_level,
             resolution_escalation_level, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(order.id.0)
        .bind(&order.number)
        .bind(&order.title)
        .bind(order.priority.as_str())
        .bind(order.status.as_str())
        .bind(dt(order.created_at))
        .bind(order.acknowledged_at.map(dt))
        .bind(order.started_at.map(dt))
        .bind(order.completed_at.map(dt))
        .bind(order.sla.map(|s| s.policy_id.0))
        .bind(order.sla.map(|s| dt(s.response_due_at)))
        .bind(order.sla.map(|s| dt(s.resolution_due_at)))
        .bind(order.sla.map(|s| dt(s.resolved_at)))
        .bind(level_to_db(order.escalation.response))
        .bind(level_to_db(order.escalation.resolution))
        .bind(dt(order.updated_at))
        .execute(&mut *tx)
        .await?;
        if inserted.rows_affected() == 0 {
            return Err(StoreError::Duplicate(order.id));
        }
        insert_activity(&mut *tx, created).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_work_order(&self, id: WorkOrderId) -> Result<Option<WorkOrder>, StoreError> {
        let sql = format!("SELECT {WORK_ORDER_COLUMNS} FROM work_orders WHERE id = $1");
        let row = sqlx::query_as::<_, WorkOrderRow>(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.map(WorkOrderRow::into_record).transpose()
    }

    async fn load_open_work_orders(&self) -> Result<Vec<WorkOrder>, StoreError> {
        let sql = format!(
            "SELECT {WORK_ORDER_COLUMNS} FROM work_orders
             WHERE status NOT IN ('completed', 'cancelled')
             ORDER BY created_at, id"
        );
        let rows = sqlx::query_as::<_, WorkOrderRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(WorkOrderRow::into_record).collect()
    }

    async fn list_work_orders(&self) -> Result<Vec<WorkOrder>, StoreError> {
        let sql = format!("SELECT {WORK_ORDER_COLUMNS} FROM work_orders ORDER BY created_at, id");
        let rows = sqlx::query_as::<_, WorkOrderRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(WorkOrderRow::into_record).collect()
    }

    async fn insert_policy(&self, policy: &SlaPolicy) -> Result<(), StoreError> {
        let result = sqlx::query(
            "INSERT INTO sla_policies (id, name, description, priority, response_time_secs,
             resolution_time_secs, business_hours_only, escalation_enabled, escalation_rules,
             active, effective_from, effective_until)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                priority = EXCLUDED.priority,
                response_time_secs = EXCLUDED.response_time_secs,
                resolution_time_secs = EXCLUDED.resolution_time_secs,
                business_hours_only = EXCLUDED.business_hours_only,
                escalation_enabled = EXCLUDED.escalation_enabled,
                escalation_rules = EXCLUDED.escalation_rules,
                active = EXCLUDED.active,
                effective_from = EXCLUDED.effective_from,
                effective_until = EXCLUDED.effective_until
             WHERE NOT EXISTS (
                SELECT 1 FROM work_orders
                WHERE sla_policy_id = EXCLUDED.id
                  AND status NOT IN ('completed', 'cancelled'))",
        )
        .bind(policy.id.0)
        .bind(&policy.name)
        .bind(&policy.description)
        .bind(policy.priority.as_str())
        .bind(secs_to_db(policy.response_time))
        .bind(secs_to_db(policy.resolution_time))
        .bind(policy.business_hours_only)
        .bind(policy.escalation_enabled)
        .bind(Json(&policy.escalation_rules))
        .bind(policy.active)
        .bind(policy.effective_from.map(dt))
        .bind(policy.effective_until.map(dt))
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 1 {
            return Ok(());
        }
        // The update was refused; fine only if nothing would have changed.
        match self.get_policy(policy.id).await? {
            Some(existing) if existing == *policy => Ok(()),
            _ => Err(StoreError::PolicyInUse(policy.id)),
        }
    }

    async fn get_policy(&self, id: PolicyId) -> Result<Option<SlaPolicy>, StoreError> {
        let sql = format!("SELECT {POLICY_COLUMNS} FROM sla_policies WHERE id = $1");
        let row = sqlx::query_as::<_, PolicyRow>(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.map(PolicyRow::into_record).transpose()
    }

    async fn list_policies(&self) -> Result<Vec<SlaPolicy>, StoreError> {
        let sql = format!("SELECT {POLICY_COLUMNS} FROM sla_policies ORDER BY id");
        let rows = sqlx::query_as::<_, PolicyRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(PolicyRow::into_record).collect()
    }

    async fn freeze_sla(
        &self,
        id: WorkOrderId,
        assignment: SlaAssignment,
    ) -> Result<CasOutcome, StoreError> {
        let sql = format!(
            "UPDATE work_orders SET
                sla_policy_id = $2,
                response_due_at = $3,
                resolution_due_at = $4,
                sla_resolved_at = $5,
                updated_at = $5
             WHERE id = $1
               AND sla_policy_id IS NULL
               AND status NOT IN ('completed', 'cancelled')
             RETURNING {WORK_ORDER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, WorkOrderRow>(&sql)
            .bind(id.0)
            .bind(assignment.policy_id.0)
            .bind(dt(assignment.response_due_at))
            .bind(dt(assignment.resolution_due_at))
            .bind(dt(assignment.resolved_at))
            .fetch_optional(&self.pool)
            .await?;
        cas(row)
    }

    async fn compare_and_set_status(&self, change: &StatusChange) -> Result<CasOutcome, StoreError> {
        let sql = format!(
            "UPDATE work_orders SET
                status = $2,
                acknowledged_at = COALESCE(acknowledged_at, $3),
                started_at = COALESCE(started_at, $4),
                completed_at = COALESCE(completed_at, $5),
                updated_at = $6
             WHERE id = $1 AND status = $7
             RETURNING {WORK_ORDER_COLUMNS}"
        );
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, WorkOrderRow>(&sql)
            .bind(change.work_order_id.0)
            .bind(change.to.as_str())
            .bind(change.stamps.acknowledged_at.map(dt))
            .bind(change.stamps.started_at.map(dt))
            .bind(change.stamps.completed_at.map(dt))
            .bind(dt(change.at))
            .bind(change.from.as_str())
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Ok(CasOutcome::Conflict);
        };
        insert_activity(&mut *tx, &change.activity).await?;
        tx.commit().await?;
        Ok(CasOutcome::Applied(row.into_record()?))
    }

    async fn compare_and_bump_escalation_level(
        &self,
        id: WorkOrderId,
        kind: ViolationType,
        expected: u32,
        new_level: u32,
    ) -> Result<CasOutcome, StoreError> {
        if new_level <= expected {
            return Ok(CasOutcome::Conflict);
        }
        let column = level_column(kind);
        let sql = format!(
            "UPDATE work_orders SET {column} = $2
             WHERE id = $1
               AND {column} = $3
               AND status NOT IN ('completed', 'cancelled')
             RETURNING {WORK_ORDER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, WorkOrderRow>(&sql)
            .bind(id.0)
            .bind(level_to_db(new_level))
            .bind(level_to_db(expected))
            .fetch_optional(&self.pool)
            .await?;
        cas(row)
    }

    async fn insert_violation_if_absent(
        &self,
        violation: &SlaViolation,
    ) -> Result<InsertOutcome, StoreError> {
        let select_existing = format!(
            "SELECT {VIOLATION_COLUMNS} FROM sla_violations
             WHERE work_order_id = $1 AND violation_type = $2 AND escalation_level = $3"
        );
        let level = level_to_db(violation.escalation_level);

        let mut tx = self.pool.begin().await?;
        let existing = sqlx::query_as::<_, ViolationRow>(&select_existing)
            .bind(violation.work_order_id.0)
            .bind(violation.violation_type.as_str())
            .bind(level)
            .fetch_optional(&mut *tx)
            .await?;
        if let Some(row) = existing {
            return Ok(InsertOutcome::Existing(row.into_record()?));
        }

        // Held until commit; blocks a concurrent close of this work order.
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM work_orders WHERE id = $1 FOR SHARE")
                .bind(violation.work_order_id.0)
                .fetch_optional(&mut *tx)
                .await?;
        let open = match status {
            Some(s) => !s
                .parse::<WorkOrderStatus>()
                .map_err(|e| corrupt("work_orders", e))?
                .is_terminal(),
            None => false,
        };
        if !open {
            return Ok(InsertOutcome::WorkOrderClosed);
        }

        let insert = format!(
            "INSERT INTO sla_violations ({VIOLATION_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             ON CONFLICT (work_order_id, violation_type, escalation_level) DO NOTHING
             RETURNING {VIOLATION_COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, ViolationRow>(&insert)
            .bind(violation.id.0)
            .bind(violation.work_order_id.0)
            .bind(violation.sla_policy_id.0)
            .bind(violation.violation_type.as_str())
            .bind(level)
            .bind(dt(violation.expected_at))
            .bind(dt(violation.detected_at))
            .bind(secs_to_db(violation.delay))
            .bind(Json(&violation.notified_targets))
            .bind(dt(violation.created_at))
            .fetch_optional(&mut *tx)
            .await?;

        let outcome = match inserted {
            Some(row) => InsertOutcome::Inserted(row.into_record()?),
            // Lost the race to a concurrent insert of the same triple.
            None => {
                let row = sqlx::query_as::<_, ViolationRow>(&select_existing)
                    .bind(violation.work_order_id.0)
                    .bind(violation.violation_type.as_str())
                    .bind(level)
                    .fetch_one(&mut *tx)
                    .await?;
                InsertOutcome::Existing(row.into_record()?)
            }
        };
        tx.commit().await?;
        Ok(outcome)
    }

    async fn list_violations(
        &self,
        filter: &ViolationFilter,
    ) -> Result<Vec<SlaViolation>, StoreError> {
        let sql = format!(
            "SELECT {VIOLATION_COLUMNS} FROM sla_violations
             WHERE ($1::uuid IS NULL OR work_order_id = $1)
               AND ($2::text IS NULL OR violation_type = $2)
               AND ($3::integer IS NULL OR escalation_level = $3)
             ORDER BY created_at, work_order_id,
                      CASE violation_type WHEN 'response' THEN 0 ELSE 1 END,
                      escalation_level"
        );
        let rows = sqlx::query_as::<_, ViolationRow>(&sql)
            .bind(filter.work_order_id.map(|id| id.0))
            .bind(filter.violation_type.map(|t| t.as_str()))
            .bind(filter.escalation_level.map(level_to_db))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(ViolationRow::into_record).collect()
    }

    async fn activities_for(&self, id: WorkOrderId) -> Result<Vec<ActivityEntry>, StoreError> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            "SELECT id, work_order_id, activity_type, from_status, to_status,
             description, actor, created_at
             FROM work_order_activities WHERE work_order_id = $1
             ORDER BY created_at, id",
        )
        .bind(id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ActivityRow::into_record).collect()
    }

    async fn insert_notification(&self, notification: &Notification) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO notifications (id, notification_type, target, title, message,
             priority, work_order_id, violation_id, sent_via, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(notification.id.0)
        .bind(notification.notification_type.as_str())
        .bind(notification.target.to_string())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.priority.as_str())
        .bind(notification.reference.work_order_id.0)
        .bind(notification.reference.violation_id.0)
        .bind(Json(&notification.sent_via))
        .bind(dt(notification.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> WorkOrderRow {
        let at = DateTime::parse_from_rfc3339("2026-03-02T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        WorkOrderRow {
            id: Uuid::new_v4(),
            number: Some("WO-7".to_string()),
            title: "Chiller fault".to_string(),
            priority: "high".to_string(),
            status: "in_progress".to_string(),
            created_at: at,
            acknowledged_at: Some(at),
            started_at: Some(at),
            completed_at: None,
            sla_policy_id: None,
            response_due_at: None,
            resolution_due_at: None,
            sla_resolved_at: None,
            response_escalation_level: 2,
            resolution_escalation_level: 0,
            updated_at: at,
        }
    }

    #[test]
    fn test_work_order_row_maps_to_record() {
        let wo = row().into_record().unwrap();
        assert_eq!(wo.status, WorkOrderStatus::InProgress);
        assert_eq!(wo.priority, Priority::High);
        assert_eq!(wo.escalation_level(), 2);
        assert!(wo.sla.is_none());
    }

    #[test]
    fn test_partial_sla_is_corrupt() {
        let mut r = row();
        r.sla_policy_id = Some(Uuid::new_v4());
        assert!(matches!(
            r.into_record(),
            Err(StoreError::Corrupt { table: "work_orders", .. })
        ));
    }

    #[test]
    fn test_unknown_status_is_corrupt() {
        let mut r = row();
        r.status = "archived".to_string();
        assert!(r.into_record().is_err());
    }

    #[test]
    fn test_negative_level_is_corrupt() {
        let mut r = row();
        r.resolution_escalation_level = -1;
        assert!(r.into_record().is_err());
    }

    #[test]
    fn test_level_columns() {
        assert_eq!(level_column(ViolationType::Response), "response_escalation_level");
        assert_eq!(level_column(ViolationType::Resolution), "resolution_escalation_level");
    }
}
