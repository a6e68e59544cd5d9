//! Sync command implementation.
//!
//! Connects, replays the offline queue, then runs one merge pass over both
//! collections. Unlike the mutation commands this fails loudly when the
//! remote cannot be reached.

use super::app::{App, block_on};
use crate::clock::format_ms;
use crate::error::{Error, Result};
use crate::remote::RemoteError;
use crate::sync::{SkipReason, SyncOutcome, SyncState};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct SyncOutput<'a> {
    state: SyncState,
    pending_operations: usize,
    #[serde(flatten)]
    outcome: &'a SyncOutcome,
}

/// Execute the sync command.
///
/// # Errors
///
/// Returns [`Error::Auth`] when credentials are missing or rejected and
/// [`Error::Remote`] when Dropbox is unreachable.
pub fn execute(db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let app = App::open(db_path)?;

    block_on(async {
        let sync = app.connect().await?;
        app.ensure_connected(&sync)?;

        let outcome = sync.sync_data().await;
        let pending_operations = sync.queue().len();

        if json {
            let output = SyncOutput {
                state: sync.state(),
                pending_operations,
                outcome: &outcome,
            };
            println!("{}", serde_json::to_string(&output)?);
        } else {
            print_outcome(&outcome, pending_operations);
        }

        if outcome.is_complete() {
            return Ok(());
        }
        let message = match &outcome {
            SyncOutcome::Skipped { skipped } => format!("sync skipped: {}", describe_skip(skipped)),
            SyncOutcome::Finished { .. } => "one or more collections failed to sync".to_string(),
        };
        Err(Error::Remote(RemoteError::Transient(message)))
    })
}

fn describe_skip(reason: &SkipReason) -> String {
    match reason {
        SkipReason::Busy => "another sync is running".to_string(),
        SkipReason::Offline => "offline".to_string(),
        SkipReason::NotReady(state) => format!("coordinator is {state}"),
        SkipReason::Pending => "queued operations did not replay; see `startsync queue list`".to_string(),
    }
}

fn print_outcome(outcome: &SyncOutcome, pending_operations: usize) {
    match outcome {
        SyncOutcome::Skipped { skipped } => {
            println!("{} {}", "Sync skipped:".yellow(), describe_skip(skipped));
        }
        SyncOutcome::Finished {
            reports,
            last_sync_at,
        } => {
            for report in reports {
                match &report.error {
                    None => {
                        let source = if report.from_cache { " (cached remote)" } else { "" };
                        println!(
                            "  {} {:<10} {} entries, {} from remote{source}",
                            "✓".green(),
                            report.collection.as_str(),
                            report.total,
                            report.stats.taken_remote + report.stats.added_remote,
                        );
                    }
                    Some(error) => println!(
                        "  {} {:<10} {}",
                        "✗".red(),
                        report.collection.as_str(),
                        error
                    ),
                }
            }
            if let Some(at) = last_sync_at {
                println!("Synced at {}", format_ms(*at));
            }
        }
    }

    if pending_operations > 0 {
        println!(
            "{} {pending_operations} operation(s) still queued",
            "Warning:".yellow()
        );
    }
}
