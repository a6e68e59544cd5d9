//! Status command implementation.

use super::app::{App, block_on};
use crate::error::Result;
use crate::sync::{check_remote, get_sync_status, print_status};
use std::path::PathBuf;

/// Execute the status command.
///
/// Local state only, unless `remote` asks for a comparison with the
/// Dropbox copies. Connecting may drain the queue and run a pass, so the
/// local side is read after connecting.
pub fn execute(db_path: Option<&PathBuf>, remote: bool, json: bool) -> Result<()> {
    let app = App::open(db_path)?;

    let status = if remote {
        block_on(async {
            let sync = app.connect().await?;
            let now = app.clock.now();
            let mut status = get_sync_status(&app.storage, now)?;
            check_remote(&sync, &mut status, now).await;
            Ok(status)
        })?
    } else {
        get_sync_status(&app.storage, app.clock.now())?
    };

    if json {
        println!("{}", serde_json::to_string(&status)?);
    } else {
        print_status(&status);
    }
    Ok(())
}
