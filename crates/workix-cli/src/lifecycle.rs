//! # Transitions Subcommand
//!
//! Prints the work order transition table, optionally for one status.

use anyhow::Result;
use clap::Args;

use workix_state::WorkOrderStatus;

/// Arguments for `workix transitions`.
#[derive(Args, Debug)]
pub struct TransitionsArgs {
    /// Only show edges leaving this status.
    #[arg(long)]
    pub from: Option<String>,

    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

fn edges(from: Option<WorkOrderStatus>) -> Vec<(WorkOrderStatus, &'static [WorkOrderStatus])> {
    WorkOrderStatus::ALL
        .iter()
        .filter(|s| from.map_or(true, |f| f == **s))
        .map(|s| (*s, s.allowed_targets()))
        .collect()
}

/// One line per status: `pending -> acknowledged, cancelled`.
pub fn render_table(from: Option<WorkOrderStatus>) -> String {
    let mut out = String::new();
    for (status, targets) in edges(from) {
        let targets = if targets.is_empty() {
            "(terminal)".to_string()
        } else {
            targets
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        out.push_str(&format!("{:<13} -> {targets}\n", status.as_str()));
    }
    out
}

pub fn render_json(from: Option<WorkOrderStatus>) -> serde_json::Value {
    edges(from)
        .into_iter()
        .map(|(status, targets)| {
            (
                status.as_str().to_string(),
                serde_json::json!(targets.iter().map(|t| t.as_str()).collect::<Vec<_>>()),
            )
        })
        .collect::<serde_json::Map<_, _>>()
        .into()
}

pub fn run_transitions(args: &TransitionsArgs) -> Result<u8> {
    let from = args
        .from
        .as_deref()
        .map(str::parse::<WorkOrderStatus>)
        .transpose()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&render_json(from))?);
    } else {
        print!("{}", render_table(from));
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_table_lists_every_status() {
        let table = render_table(None);
        assert_eq!(table.lines().count(), WorkOrderStatus::ALL.len());
        assert!(table.contains("pending       -> acknowledged, cancelled"));
        assert!(table.contains("completed     -> (terminal)"));
    }

    #[test]
    fn test_filtered_json() {
        let json = render_json(Some(WorkOrderStatus::InProgress));
        assert_eq!(
            json,
            serde_json::json!({"in_progress": ["completed", "on_hold", "cancelled"]})
        );
    }
}
