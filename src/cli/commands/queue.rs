//! Offline queue commands.

use super::app::{App, block_on};
use crate::cli::QueueCommands;
use crate::clock::format_ms;
use crate::error::{Error, Result};
use crate::model::Collection;
use crate::remote::RemoteError;
use crate::sync::{DrainOutcome, PendingOperation, SkipReason};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct ListOutput<'a> {
    count: usize,
    operations: &'a [PendingOperation],
}

#[derive(Serialize)]
struct ClearOutput {
    cleared: usize,
}

/// Execute queue commands.
pub fn execute(command: &QueueCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let app = App::open(db_path)?;
    match command {
        QueueCommands::List { collection } => list(&app, *collection, json),
        QueueCommands::Drain => drain(&app, json),
        QueueCommands::Clear { yes } => clear(&app, *yes, json),
    }
}

fn list(app: &App, collection: Option<Collection>, json: bool) -> Result<()> {
    let sync = app.coordinator()?;
    let operations: Vec<PendingOperation> = sync
        .queue()
        .iter()
        .into_iter()
        .filter(|op| collection.is_none_or(|c| op.collection == c))
        .collect();

    if json {
        let output = ListOutput {
            count: operations.len(),
            operations: &operations,
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if operations.is_empty() {
        println!("Offline queue is empty.");
        return Ok(());
    }
    println!("{} queued operation(s), oldest first:", operations.len());
    for op in &operations {
        println!(
            "  {} {}  {}",
            op.id.dimmed(),
            format_ms(op.enqueued_at),
            op.describe()
        );
    }
    Ok(())
}

fn drain(app: &App, json: bool) -> Result<()> {
    block_on(async {
        let sync = app.connect().await?;
        app.ensure_connected(&sync)?;

        // Connecting already replays the queue; this catches anything left.
        let outcome = sync.drain_queue().await;
        let remaining = sync.queue().len();

        if json {
            println!("{}", serde_json::to_string(&outcome)?);
        } else {
            match &outcome {
                DrainOutcome::Skipped { skipped } => {
                    let reason = match skipped {
                        SkipReason::Busy => "a sync is running".to_string(),
                        SkipReason::Offline => "offline".to_string(),
                        SkipReason::NotReady(state) => format!("coordinator is {state}"),
                        SkipReason::Pending => "operations still queued".to_string(),
                    };
                    println!("{} {reason}", "Drain skipped:".yellow());
                }
                DrainOutcome::Finished(report) => {
                    println!("Replayed {} operation(s).", report.replayed);
                    if let Some(failed) = &report.failed {
                        println!("{} {} ({})", "Stopped at".red(), failed.id, failed.reason);
                    }
                }
            }
            if remaining > 0 {
                println!("{remaining} operation(s) still queued.");
            }
        }

        if remaining > 0 {
            return Err(Error::Remote(RemoteError::Transient(format!(
                "{remaining} operation(s) could not be replayed"
            ))));
        }
        Ok(())
    })
}

fn clear(app: &App, yes: bool, json: bool) -> Result<()> {
    if !yes {
        return Err(Error::InvalidArgument(
            "clearing drops queued changes for good; pass --yes to confirm".to_string(),
        ));
    }
    let cleared = app.coordinator()?.queue().clear();

    if json {
        println!("{}", serde_json::to_string(&ClearOutput { cleared })?);
    } else {
        println!("Cleared {cleared} queued operation(s).");
    }
    Ok(())
}
