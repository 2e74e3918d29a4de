//! # Identity Newtypes
//!
//! Newtype wrappers for every identifier the engine handles. These prevent
//! identifier confusion: a `PolicyId` cannot be passed where a
//! `WorkOrderId` is expected.
//!
//! All identifiers are UUIDs. `PolicyId` ordering is significant: when
//! several active policies share a priority, the lowest `PolicyId` wins.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::WorkixError;

/// Unique identifier for a work order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkOrderId(pub Uuid);

/// Unique identifier for an SLA policy.
///
/// Ordered by the underlying UUID bytes. This ordering is the tie-break
/// between active policies of the same priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyId(pub Uuid);

/// Unique identifier for a recorded SLA violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViolationId(pub Uuid);

/// Unique identifier for a notification produced by an escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub Uuid);

/// Unique identifier for a work-order activity-log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(pub Uuid);

impl WorkOrderId {
    /// Generate a new random work order identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Parse from the hyphenated UUID form.
    pub fn parse(s: &str) -> Result<Self, WorkixError> {
        parse_uuid(s, "work order").map(Self)
    }
}

impl PolicyId {
    /// Generate a new random policy identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Parse from the hyphenated UUID form.
    pub fn parse(s: &str) -> Result<Self, WorkixError> {
        parse_uuid(s, "policy").map(Self)
    }
}

impl ViolationId {
    /// Generate a new random violation identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl NotificationId {
    /// Generate a new random notification identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl ActivityId {
    /// Generate a new random activity identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for WorkOrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for PolicyId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for ViolationId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for ActivityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WorkOrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "work-order:{}", self.0)
    }
}

impl std::fmt::Display for PolicyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "policy:{}", self.0)
    }
}

impl std::fmt::Display for ViolationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "violation:{}", self.0)
    }
}

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "notification:{}", self.0)
    }
}

impl std::fmt::Display for ActivityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "activity:{}", self.0)
    }
}

fn parse_uuid(s: &str, kind: &str) -> Result<Uuid, WorkixError> {
    Uuid::parse_str(s.trim())
        .map_err(|e| WorkixError::Validation(format!("invalid {kind} id {s:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        let uuid = Uuid::nil();
        assert_eq!(
            WorkOrderId(uuid).to_string(),
            "work-order:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(
            PolicyId(uuid).to_string(),
            "policy:00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_policy_id_ordering_follows_uuid_bytes() {
        let low = PolicyId(Uuid::from_u128(1));
        let high = PolicyId(Uuid::from_u128(2));
        assert!(low < high);
    }

    #[test]
    fn test_parse_roundtrip() {
        let id = WorkOrderId::new();
        let parsed = WorkOrderId::parse(&id.0.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(PolicyId::parse("not-a-uuid").is_err());
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = PolicyId(Uuid::from_u128(7));
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000007\"");
    }
}
