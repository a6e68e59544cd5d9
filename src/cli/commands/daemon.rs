//! Foreground sync loop.
//!
//! Polls connectivity every interval, replays the offline queue when the
//! connection comes back and runs a sync pass when nothing is queued.
//! Stops on Ctrl-C.

use super::app::{App, block_on};
use crate::error::{Error, Result};
use crate::net::HttpProbe;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Timeout of each connectivity probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Execute the daemon command.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or the interval is 0.
pub fn execute(db_path: Option<&PathBuf>, interval: Option<u64>, json: bool) -> Result<()> {
    let app = App::open(db_path)?;
    let interval = match interval {
        Some(0) => {
            return Err(Error::InvalidArgument(
                "interval must be at least 1 second".to_string(),
            ));
        }
        Some(secs) => Duration::from_secs(secs),
        None => app.config.sync_interval(),
    };

    block_on(async {
        let sync = app.coordinator()?;
        let probe = HttpProbe::new(HttpProbe::DEFAULT_URL, PROBE_TIMEOUT);

        if !json {
            println!(
                "Syncing every {}s (db: {}). Press Ctrl-C to stop.",
                interval.as_secs(),
                app.db_path.display()
            );
        }
        if !sync.initialize().await {
            warn!(state = %sync.state(), "Not connected, waiting for the connection to come back");
        }

        sync.run(&probe, interval, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Could not listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await;

        info!(pending = sync.queue().len(), "Daemon stopped");
        if json {
            println!("{}", serde_json::to_string(&sync.session())?);
        }
        Ok(())
    })
}
