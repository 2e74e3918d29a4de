//! # workix-cli — Command-Line Interface for the SLA Engine
//!
//! Provides the `workix` binary.
//!
//! ## Subcommands
//!
//! - `workix run` — Run the escalation scheduler against Postgres until
//!   interrupted.
//! - `workix sweep` — Run a single escalation sweep and print its report.
//! - `workix policies load` — Validate and store policies from YAML.
//! - `workix deadlines` — Compute the deadlines a policy would freeze.
//! - `workix transitions` — Print the lifecycle transition table.
//! - `workix compliance` — Print the compliance summary.
//!
//! ```bash
//! workix --config workix.yaml policies load --file policies.yaml
//! workix --config workix.yaml run
//! workix deadlines --policy policies.yaml --priority high --created-at 2026-03-06T15:00:00Z
//! ```

pub mod engine;
pub mod lifecycle;
pub mod policy;

use std::path::Path;

use anyhow::{Context, Result};

use workix_engine::EngineConfig;

/// Load configuration from `path` if given, otherwise defaults plus the
/// environment.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => EngineConfig::from_env().context("loading configuration from environment"),
    }
}
