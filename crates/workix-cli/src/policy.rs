//! # Policy and Deadline Subcommands
//!
//! `policies load` stores policies from a YAML file; `deadlines` computes
//! the response and resolution deadlines a policy would freeze for a work
//! order created at a given time, without touching storage.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use serde::Deserialize;

use workix_core::{Priority, Timestamp};
use workix_engine::EngineConfig;
use workix_sla::{DeadlineCalculator, PolicyMatcher, SlaPolicy};

/// A policy file holds one policy or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum PolicyFile {
    Many(Vec<SlaPolicy>),
    One(SlaPolicy),
}

/// Read and validate every policy in `path`.
pub fn load_policies(path: &Path) -> Result<Vec<SlaPolicy>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let policies = match serde_yaml::from_str::<PolicyFile>(&raw)
        .with_context(|| format!("invalid policy file {}", path.display()))?
    {
        PolicyFile::Many(list) => list,
        PolicyFile::One(policy) => vec![policy],
    };
    for policy in &policies {
        policy
            .validate()
            .with_context(|| format!("policy {:?} is invalid", policy.name))?;
    }
    Ok(policies)
}

/// Arguments for `workix policies`.
#[derive(Args, Debug)]
pub struct PoliciesArgs {
    #[command(subcommand)]
    pub command: PoliciesCommand,
}

#[derive(Subcommand, Debug)]
pub enum PoliciesCommand {
    /// Validate and store policies. Existing ids are replaced.
    Load {
        /// YAML file with one policy or a list.
        #[arg(long)]
        file: PathBuf,
    },
}

/// Arguments for `workix deadlines`.
#[derive(Args, Debug)]
pub struct DeadlinesArgs {
    /// YAML file with one policy or a list.
    #[arg(long)]
    pub policy: PathBuf,

    /// Work order creation time (RFC 3339).
    #[arg(long)]
    pub created_at: String,

    /// Priority to match. Required when the file holds several policies.
    #[arg(long)]
    pub priority: Option<String>,
}

/// Compute deadlines and return them as JSON.
pub fn compute_deadlines(args: &DeadlinesArgs, config: &EngineConfig) -> Result<serde_json::Value> {
    let created_at = Timestamp::parse_lenient(&args.created_at)
        .with_context(|| format!("invalid --created-at {:?}", args.created_at))?;
    let policies = load_policies(&args.policy)?;

    let policy = match (&args.priority, policies.as_slice()) {
        (None, [only]) => only.clone(),
        (None, _) => bail!("{} holds several policies; pass --priority", args.policy.display()),
        (Some(priority), _) => {
            let priority: Priority = priority.parse()?;
            PolicyMatcher::new(policies).find(priority, created_at)?.clone()
        }
    };

    let calculator = DeadlineCalculator::new(config.calendar.build()?);
    let deadlines = calculator.compute(created_at, &policy)?;

    Ok(serde_json::json!({
        "policy_id": policy.id,
        "policy_name": policy.name,
        "priority": policy.priority,
        "business_hours_only": policy.business_hours_only,
        "created_at": created_at,
        "response_due_at": deadlines.response_due_at,
        "resolution_due_at": deadlines.resolution_due_at,
    }))
}

pub fn run_deadlines(args: &DeadlinesArgs, config: &EngineConfig) -> Result<u8> {
    let out = compute_deadlines(args, config)?;
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(0)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const POLICIES: &str = r#"
- id: 00000000-0000-4000-8000-000000000001
  name: High, business hours
  priority: high
  response_time: 28800
  resolution_time: 36000
  business_hours_only: true
  escalation_rules:
    - level: 1
      trigger_after: 0
      notify_targets:
        - kind: role
          id: supervisor
- id: 00000000-0000-4000-8000-000000000002
  name: Critical
  priority: critical
  response_time: 3600
  resolution_time: 14400
"#;

    fn policy_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn args(file: &tempfile::NamedTempFile, created_at: &str, priority: Option<&str>) -> DeadlinesArgs {
        DeadlinesArgs {
            policy: file.path().to_path_buf(),
            created_at: created_at.to_string(),
            priority: priority.map(str::to_string),
        }
    }

    #[test]
    fn test_load_policy_list() {
        let file = policy_file(POLICIES);
        let policies = load_policies(file.path()).unwrap();
        assert_eq!(policies.len(), 2);
        assert!(policies[0].business_hours_only);
        assert!(policies[1].escalation_enabled);
        assert!(policies[1].escalation_rules.is_empty());
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let file = policy_file(
            "id: 00000000-0000-4000-8000-000000000003\nname: Backwards\npriority: low\nresponse_time: 7200\nresolution_time: 3600\n",
        );
        assert!(load_policies(file.path()).is_err());
    }

    #[test]
    fn test_business_hours_deadlines() {
        let file = policy_file(POLICIES);
        let out = compute_deadlines(
            &args(&file, "2026-03-06T15:00:00Z", Some("high")),
            &EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(out["response_due_at"], "2026-03-09T15:00:00Z");
        assert_eq!(out["resolution_due_at"], "2026-03-09T17:00:00Z");
    }

    #[test]
    fn test_calendar_time_deadlines() {
        let file = policy_file(POLICIES);
        let out = compute_deadlines(
            &args(&file, "2026-03-07T23:30:00Z", Some("critical")),
            &EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(out["response_due_at"], "2026-03-08T00:30:00Z");
        assert_eq!(out["resolution_due_at"], "2026-03-08T03:30:00Z");
    }

    #[test]
    fn test_priority_required_for_several_policies() {
        let file = policy_file(POLICIES);
        let err = compute_deadlines(&args(&file, "2026-03-06T15:00:00Z", None), &EngineConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("--priority"));
    }

    #[test]
    fn test_unmatched_priority_fails() {
        let file = policy_file(POLICIES);
        assert!(compute_deadlines(
            &args(&file, "2026-03-06T15:00:00Z", Some("low")),
            &EngineConfig::default()
        )
        .is_err());
    }
}
