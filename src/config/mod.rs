//! Configuration management.
//!
//! startsync keeps everything under one global directory, `~/.startsync/`:
//! - **Database**: `~/.startsync/data/startsync.db` (collections, queue, tokens, log)
//! - **Config**: `~/.startsync/config.json` (app key, remote folder, timings)
//!
//! Environment variables override the config file; command-line flags
//! override both.

mod settings;

pub use settings::{AppConfig, load_config, save_config};

use std::path::{Path, PathBuf};

/// Get the global startsync directory location.
#[must_use]
pub fn global_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".startsync"))
}

/// Path of the JSON config file.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    global_dir().map(|dir| dir.join("config.json"))
}

/// Resolve the database path.
///
/// Priority:
/// 1. If `explicit_path` is provided, use it directly
/// 2. `STARTSYNC_DB` environment variable
/// 3. `dbPath` from the config file
/// 4. Global location: `~/.startsync/data/startsync.db`
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>, config: &AppConfig) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if let Ok(db_path) = std::env::var("STARTSYNC_DB") {
        if !db_path.trim().is_empty() {
            return Some(PathBuf::from(db_path));
        }
    }

    if let Some(path) = &config.db_path {
        return Some(path.clone());
    }

    global_dir().map(|dir| dir.join("data").join("startsync.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_db_path_with_explicit() {
        let explicit = PathBuf::from("/custom/path/db.sqlite");
        let config = AppConfig {
            db_path: Some(PathBuf::from("/from/config.db")),
            ..AppConfig::default()
        };
        assert_eq!(resolve_db_path(Some(&explicit), &config), Some(explicit));
    }

    #[test]
    fn test_resolve_db_path_defaults_to_global() {
        if std::env::var_os("STARTSYNC_DB").is_some() {
            return;
        }
        let path = resolve_db_path(None, &AppConfig::default()).unwrap();
        assert!(path.ends_with("data/startsync.db"));
    }

    #[test]
    fn test_config_path_under_global_dir() {
        let path = config_path().unwrap();
        assert!(path.ends_with(".startsync/config.json"));
    }
}
