//! # workix CLI entry point
//!
//! Parses command-line arguments, initialises tracing, loads the engine
//! configuration, and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use workix_cli::engine::{run_compliance, run_policies, run_scheduler, run_sweep};
use workix_cli::lifecycle::{run_transitions, TransitionsArgs};
use workix_cli::load_config;
use workix_cli::policy::{run_deadlines, DeadlinesArgs, PoliciesArgs};

/// Work order lifecycle and SLA escalation engine.
#[derive(Parser, Debug)]
#[command(name = "workix", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the escalation scheduler until interrupted.
    Run,

    /// Run one escalation sweep and print the report.
    Sweep,

    /// Policy management.
    Policies(PoliciesArgs),

    /// Compute the deadlines a policy would freeze for a work order.
    Deadlines(DeadlinesArgs),

    /// Print the lifecycle transition table.
    Transitions(TransitionsArgs),

    /// Print the SLA compliance summary.
    Compliance,
}

fn init_tracing(verbose: u8, json: bool) {
    // RUST_LOG wins over -v.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("info"),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<u8> {
    if let Commands::Transitions(args) = &cli.command {
        return run_transitions(args);
    }

    let config = load_config(cli.config.as_deref())?;
    match &cli.command {
        Commands::Run => run_scheduler(&config).await,
        Commands::Sweep => run_sweep(&config).await,
        Commands::Policies(args) => run_policies(args, &config).await,
        Commands::Deadlines(args) => run_deadlines(args, &config),
        Commands::Compliance => run_compliance(&config).await,
        Commands::Transitions(args) => run_transitions(args),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);
    tracing::debug!("workix CLI starting");

    match dispatch(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
