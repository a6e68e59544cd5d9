//! Initialize the local startsync database.
//!
//! Creates the SQLite file (schema is applied on open) and, when using the
//! global location, a default `~/.startsync/config.json` to fill in the
//! Dropbox app key.

use crate::config::{AppConfig, config_path, resolve_db_path, save_config};
use crate::error::{Error, Result};
use crate::storage::SqliteStorage;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

#[derive(Serialize)]
struct InitOutput {
    database: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<PathBuf>,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns [`Error::AlreadyInitialized`] if the database exists and `force`
/// is not set, or an error if the directory or database cannot be created.
pub fn execute(db_path: Option<&PathBuf>, force: bool, json: bool) -> Result<()> {
    let config = AppConfig::resolve()?;
    let path = resolve_db_path(db_path.map(PathBuf::as_path), &config).ok_or_else(|| {
        Error::Config("Could not determine global startsync directory".to_string())
    })?;

    if path.exists() {
        if !force {
            return Err(Error::AlreadyInitialized { path });
        }
        fs::remove_file(&path)?;
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    SqliteStorage::open(&path)?;

    // Only the global layout gets a config file; an explicit --db is
    // usually a scratch or test database.
    let config_written = match (db_path, config_path()) {
        (None, Some(existing)) if !existing.exists() => Some(save_config(&AppConfig::default())?),
        _ => None,
    };

    if json {
        let output = InitOutput {
            database: path,
            config: config_written,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Initialized startsync database");
        println!("  Database: {}", path.display());
        if let Some(config) = &config_written {
            println!("  Config:   {}", config.display());
        }
        println!();
        println!("Next: set DROPBOX_CLIENT_ID (or clientId in the config) and run");
        println!("'startsync auth login <refresh-token>'.");
    }

    Ok(())
}
