//! # Policy Matching
//!
//! Selects the single SLA policy for a work order's priority.
//!
//! Policies are held in a `BTreeMap` keyed by `PolicyId`, so iteration
//! order is the tie-break: when several active policies share a priority,
//! the one with the lowest id wins, independent of insertion order.

use std::collections::BTreeMap;

use workix_core::{PolicyId, Priority, Timestamp};

use crate::policy::{PolicyError, SlaPolicy};

/// Deterministic priority → policy lookup.
#[derive(Debug, Clone, Default)]
pub struct PolicyMatcher {
    policies: BTreeMap<PolicyId, SlaPolicy>,
}

impl PolicyMatcher {
    pub fn new(policies: impl IntoIterator<Item = SlaPolicy>) -> Self {
        Self {
            policies: policies.into_iter().map(|p| (p.id, p)).collect(),
        }
    }

    /// Add or replace a policy.
    pub fn insert(&mut self, policy: SlaPolicy) {
        self.policies.insert(policy.id, policy);
    }

    pub fn get(&self, id: &PolicyId) -> Option<&SlaPolicy> {
        self.policies.get(id)
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// The active policy for `priority` at `as_of`.
    ///
    /// Policies that fail [`SlaPolicy::validate`] are skipped with a
    /// warning. Returns [`PolicyError::NotFound`] when nothing matches.
    pub fn find(&self, priority: Priority, as_of: Timestamp) -> Result<&SlaPolicy, PolicyError> {
        for policy in self.policies.values() {
            if policy.priority != priority || !policy.is_active_at(as_of) {
                continue;
            }
            match policy.validate() {
                Ok(()) => return Ok(policy),
                Err(e) => {
                    tracing::warn!(policy_id = %policy.id, error = %e, "skipping invalid SLA policy");
                }
            }
        }
        Err(PolicyError::NotFound { priority })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    /// A policy id whose UUID ends in `n`.
    fn policy_id(n: u8) -> PolicyId {
        PolicyId::parse(&format!("00000000-0000-0000-0000-0000000000{n:02x}")).unwrap()
    }

    fn now() -> Timestamp {
        Timestamp::parse("2026-03-02T10:00:00Z").unwrap()
    }

    fn policy(n: u8, priority: Priority) -> SlaPolicy {
        SlaPolicy::new(format!("p{n}"), priority, HOUR, 4 * HOUR).with_id(policy_id(n))
    }

    #[test]
    fn test_matches_priority() {
        let matcher = PolicyMatcher::new([policy(1, Priority::Low), policy(2, Priority::Critical)]);
        let found = matcher.find(Priority::Critical, now()).unwrap();
        assert_eq!(found.id, policy_id(2));
    }

    #[test]
    fn test_lowest_id_wins_regardless_of_insertion_order() {
        let a = PolicyMatcher::new([policy(9, Priority::High), policy(3, Priority::High)]);
        let b = PolicyMatcher::new([policy(3, Priority::High), policy(9, Priority::High)]);
        assert_eq!(a.find(Priority::High, now()).unwrap().id, policy_id(3));
        assert_eq!(b.find(Priority::High, now()).unwrap().id, policy_id(3));
    }

    #[test]
    fn test_inactive_policy_skipped() {
        let mut inactive = policy(1, Priority::High);
        inactive.active = false;
        let matcher = PolicyMatcher::new([inactive, policy(5, Priority::High)]);
        assert_eq!(matcher.find(Priority::High, now()).unwrap().id, policy_id(5));
    }

    #[test]
    fn test_invalid_policy_skipped() {
        let mut broken = policy(1, Priority::Medium);
        broken.response_time = 10 * HOUR;
        let matcher = PolicyMatcher::new([broken, policy(2, Priority::Medium)]);
        assert_eq!(matcher.find(Priority::Medium, now()).unwrap().id, policy_id(2));
    }

    #[test]
    fn test_not_found_is_an_error_value() {
        let matcher = PolicyMatcher::new([policy(1, Priority::Low)]);
        assert_eq!(
            matcher.find(Priority::Critical, now()).unwrap_err(),
            PolicyError::NotFound {
                priority: Priority::Critical
            }
        );
        assert!(PolicyMatcher::default().find(Priority::Low, now()).is_err());
    }

    #[test]
    fn test_expired_policy_not_matched() {
        let mut expired = policy(1, Priority::Low);
        expired.effective_until = Some(Timestamp::parse("2026-01-01T00:00:00Z").unwrap());
        let matcher = PolicyMatcher::new([expired]);
        assert!(matcher.find(Priority::Low, now()).is_err());
    }
}
