//! # Engine Subcommands
//!
//! Everything that needs the store: the long-running scheduler, a single
//! sweep, policy loading, and the compliance report. All of them connect
//! to Postgres through `DATABASE_URL` (or `database_url` in the config).

use std::sync::Arc;

use anyhow::{Context, Result};

use workix_engine::{EngineConfig, PgStore, SlaEngine};

use crate::policy::{load_policies, PoliciesArgs, PoliciesCommand};

async fn connect(config: &EngineConfig) -> Result<SlaEngine> {
    let url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL is not set")?;
    let store = PgStore::connect(url)
        .await
        .context("connecting to PostgreSQL")?;
    Ok(SlaEngine::from_config(Arc::new(store), config)?)
}

/// Run the scheduler until Ctrl-C, then drain the in-flight sweep.
pub async fn run_scheduler(config: &EngineConfig) -> Result<u8> {
    let engine = connect(config).await?;
    let handle = engine.start();
    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    tracing::info!("shutdown requested, draining");
    handle.stop().await;
    Ok(0)
}

pub async fn run_sweep(config: &EngineConfig) -> Result<u8> {
    let engine = connect(config).await?;
    let report = engine.sweep_once().await?;
    let out = serde_json::json!({
        "evaluated": report.evaluated,
        "policies_resolved": report.policies_resolved,
        "escalations": report.escalations,
        "violations_recorded": report.violations_recorded,
        "conflicts": report.conflicts,
        "failures": report.failures,
        "degraded_deliveries": report.degraded_deliveries,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(if report.failures > 0 { 1 } else { 0 })
}

pub async fn run_policies(args: &PoliciesArgs, config: &EngineConfig) -> Result<u8> {
    match &args.command {
        PoliciesCommand::Load { file } => {
            let policies = load_policies(file)?;
            let engine = connect(config).await?;
            for policy in &policies {
                engine.register_policy(policy).await?;
                println!("{} {} ({})", policy.id, policy.name, policy.priority);
            }
            Ok(0)
        }
    }
}

pub async fn run_compliance(config: &EngineConfig) -> Result<u8> {
    let engine = connect(config).await?;
    let summary = engine.compliance_summary().await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(0)
}
