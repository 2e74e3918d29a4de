//! # SLA Policies
//!
//! A policy binds a priority to response and resolution targets and an
//! ordered list of escalation rules. Policies are authored elsewhere; the
//! engine only reads them, and treats a policy referenced by an open work
//! order as immutable.

use std::borrow::Cow;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use workix_core::temporal::duration_secs;
use workix_core::{PolicyId, Priority, Timestamp};

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors from policy lookup and validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// No active policy covers the priority. Not fatal: the work order
    /// proceeds without deadlines.
    #[error("no active SLA policy for priority {priority}")]
    NotFound { priority: Priority },

    /// Response target is longer than the resolution target.
    #[error(
        "{policy_id}: response time {response_secs}s exceeds resolution time {resolution_secs}s"
    )]
    InvalidTimes {
        policy_id: PolicyId,
        response_secs: u64,
        resolution_secs: u64,
    },

    /// Escalation rules are not a strictly increasing sequence of levels.
    #[error("{policy_id}: invalid escalation rules: {reason}")]
    InvalidRules { policy_id: PolicyId, reason: String },
}

// ─── Notify Targets ──────────────────────────────────────────────────

/// Who an escalation notifies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum NotifyTarget {
    /// Everyone holding a role (e.g. `supervisor`, `facility_manager`).
    Role(String),
    /// One user.
    User(String),
}

impl std::fmt::Display for NotifyTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Role(role) => write!(f, "role:{role}"),
            Self::User(user) => write!(f, "user:{user}"),
        }
    }
}

impl std::str::FromStr for NotifyTarget {
    type Err = workix_core::WorkixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some(("role", id)) if !id.is_empty() => Ok(Self::Role(id.to_string())),
            Some(("user", id)) if !id.is_empty() => Ok(Self::User(id.to_string())),
            _ => Err(workix_core::WorkixError::Validation(format!(
                "notify target must be role:<id> or user:<id>, got {s:?}"
            ))),
        }
    }
}

// ─── Escalation Rules ────────────────────────────────────────────────

/// One escalation tier of a policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationRule {
    /// 1-based tier, strictly increasing within a policy.
    pub level: u32,
    /// Delay after the breached deadline before this tier fires.
    #[serde(with = "duration_secs")]
    pub trigger_after: Duration,
    #[serde(default)]
    pub notify_targets: Vec<NotifyTarget>,
}

impl EscalationRule {
    pub fn new(level: u32, trigger_after: Duration, notify_targets: Vec<NotifyTarget>) -> Self {
        Self {
            level,
            trigger_after,
            notify_targets,
        }
    }

    /// The rule used when a policy defines no tiers or has escalation
    /// disabled: a single level-1 record at the moment of breach, with
    /// nobody to notify.
    pub fn implicit() -> Self {
        Self::new(1, Duration::ZERO, Vec::new())
    }
}

// ─── Policy ──────────────────────────────────────────────────────────

/// A service-level policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaPolicy {
    pub id: PolicyId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub priority: Priority,
    #[serde(with = "duration_secs")]
    pub response_time: Duration,
    #[serde(with = "duration_secs")]
    pub resolution_time: Duration,
    #[serde(default)]
    pub business_hours_only: bool,
    #[serde(default = "default_true")]
    pub escalation_enabled: bool,
    #[serde(default)]
    pub escalation_rules: Vec<EscalationRule>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub effective_from: Option<Timestamp>,
    #[serde(default)]
    pub effective_until: Option<Timestamp>,
}

fn default_true() -> bool {
    true
}

impl SlaPolicy {
    /// An active, calendar-time policy with escalation enabled and no rules.
    pub fn new(
        name: impl Into<String>,
        priority: Priority,
        response_time: Duration,
        resolution_time: Duration,
    ) -> Self {
        Self {
            id: PolicyId::new(),
            name: name.into(),
            description: None,
            priority,
            response_time,
            resolution_time,
            business_hours_only: false,
            escalation_enabled: true,
            escalation_rules: Vec::new(),
            active: true,
            effective_from: None,
            effective_until: None,
        }
    }

    pub fn with_id(mut self, id: PolicyId) -> Self {
        self.id = id;
        self
    }

    pub fn with_rules(mut self, rules: Vec<EscalationRule>) -> Self {
        self.escalation_rules = rules;
        self
    }

    pub fn business_hours_only(mut self, enabled: bool) -> Self {
        self.business_hours_only = enabled;
        self
    }

    /// Check the structural invariants the engine relies on.
    ///
    /// - `response_time <= resolution_time`, so computed deadlines keep
    ///   the same order.
    /// - Rule levels start at 1 or above and strictly increase.
    /// - `trigger_after` never decreases from one level to the next, so a
    ///   higher tier cannot become due before a lower one.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.response_time > self.resolution_time {
            return Err(PolicyError::InvalidTimes {
                policy_id: self.id,
                response_secs: self.response_time.as_secs(),
                resolution_secs: self.resolution_time.as_secs(),
            });
        }

        let mut previous: Option<&EscalationRule> = None;
        for rule in &self.escalation_rules {
            if rule.level == 0 {
                return Err(self.invalid_rules("level 0 is reserved for not escalated"));
            }
            if let Some(prev) = previous {
                if rule.level <= prev.level {
                    return Err(self.invalid_rules(&format!(
                        "level {} follows level {}",
                        rule.level, prev.level
                    )));
                }
                if rule.trigger_after < prev.trigger_after {
                    return Err(self.invalid_rules(&format!(
                        "level {} triggers before level {}",
                        rule.level, prev.level
                    )));
                }
            }
            previous = Some(rule);
        }
        Ok(())
    }

    fn invalid_rules(&self, reason: &str) -> PolicyError {
        PolicyError::InvalidRules {
            policy_id: self.id,
            reason: reason.to_string(),
        }
    }

    /// Whether the policy can be matched at `as_of`.
    pub fn is_active_at(&self, as_of: Timestamp) -> bool {
        if !self.active {
            return false;
        }
        if matches!(self.effective_from, Some(from) if as_of < from) {
            return false;
        }
        if matches!(self.effective_until, Some(until) if as_of >= until) {
            return false;
        }
        true
    }

    /// The rules the sweep actually evaluates.
    ///
    /// With escalation disabled, or no rules configured, a breach still
    /// produces one level-1 violation through [`EscalationRule::implicit`].
    pub fn effective_rules(&self) -> Cow<'_, [EscalationRule]> {
        if self.escalation_enabled && !self.escalation_rules.is_empty() {
            Cow::Borrowed(&self.escalation_rules)
        } else {
            Cow::Owned(vec![EscalationRule::implicit()])
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn critical() -> SlaPolicy {
        SlaPolicy::new("Critical", Priority::Critical, HOUR, 4 * HOUR)
    }

    #[test]
    fn test_valid_policy() {
        let policy = critical().with_rules(vec![
            EscalationRule::new(1, Duration::ZERO, vec![NotifyTarget::Role("supervisor".into())]),
            EscalationRule::new(2, 2 * HOUR, vec![NotifyTarget::Role("manager".into())]),
        ]);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_response_longer_than_resolution_rejected() {
        let policy = SlaPolicy::new("Bad", Priority::Low, 5 * HOUR, HOUR);
        assert!(matches!(
            policy.validate(),
            Err(PolicyError::InvalidTimes { response_secs: 18000, resolution_secs: 3600, .. })
        ));
    }

    #[test]
    fn test_non_increasing_levels_rejected() {
        let policy = critical().with_rules(vec![
            EscalationRule::new(2, Duration::ZERO, vec![]),
            EscalationRule::new(2, HOUR, vec![]),
        ]);
        assert!(matches!(policy.validate(), Err(PolicyError::InvalidRules { .. })));
    }

    #[test]
    fn test_level_zero_rejected() {
        let policy = critical().with_rules(vec![EscalationRule::new(0, Duration::ZERO, vec![])]);
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_decreasing_trigger_rejected() {
        let policy = critical().with_rules(vec![
            EscalationRule::new(1, 2 * HOUR, vec![]),
            EscalationRule::new(2, HOUR, vec![]),
        ]);
        let err = policy.validate().unwrap_err();
        assert!(err.to_string().contains("level 2 triggers before level 1"));
    }

    #[test]
    fn test_effective_window() {
        let mut policy = critical();
        policy.effective_from = Some(Timestamp::parse("2026-01-01T00:00:00Z").unwrap());
        policy.effective_until = Some(Timestamp::parse("2026-07-01T00:00:00Z").unwrap());

        assert!(!policy.is_active_at(Timestamp::parse("2025-12-31T23:59:59Z").unwrap()));
        assert!(policy.is_active_at(Timestamp::parse("2026-01-01T00:00:00Z").unwrap()));
        assert!(!policy.is_active_at(Timestamp::parse("2026-07-01T00:00:00Z").unwrap()));

        policy.active = false;
        assert!(!policy.is_active_at(Timestamp::parse("2026-03-01T00:00:00Z").unwrap()));
    }

    #[test]
    fn test_effective_rules_fall_back_to_implicit() {
        let policy = critical();
        assert_eq!(policy.effective_rules().as_ref(), &[EscalationRule::implicit()]);

        let mut disabled = critical().with_rules(vec![EscalationRule::new(
            1,
            HOUR,
            vec![NotifyTarget::User("u-1".into())],
        )]);
        disabled.escalation_enabled = false;
        assert_eq!(disabled.effective_rules().as_ref(), &[EscalationRule::implicit()]);
    }

    #[test]
    fn test_notify_target_parse_and_display() {
        let target: NotifyTarget = "role:supervisor".parse().unwrap();
        assert_eq!(target, NotifyTarget::Role("supervisor".into()));
        assert_eq!(target.to_string(), "role:supervisor");
        assert!("team:ops".parse::<NotifyTarget>().is_err());
        assert!("user:".parse::<NotifyTarget>().is_err());
    }

    #[test]
    fn test_policy_from_yaml() {
        let yaml = r#"
id: 00000000-0000-0000-0000-000000000001
name: High priority
priority: high
response_time: 7200
resolution_time: 28800
business_hours_only: true
escalation_rules:
  - level: 1
    trigger_after: 0
    notify_targets:
      - kind: role
        id: supervisor
  - level: 2
    trigger_after: 3600
"#;
        let policy: SlaPolicy = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(policy.priority, Priority::High);
        assert_eq!(policy.resolution_time, 8 * HOUR);
        assert!(policy.active);
        assert!(policy.escalation_enabled);
        assert_eq!(policy.escalation_rules.len(), 2);
        assert!(policy.escalation_rules[1].notify_targets.is_empty());
        assert!(policy.validate().is_ok());
    }
}
