//! Config file and environment overrides.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::sync::CoordinatorSettings;

/// Contents of `~/.startsync/config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// Dropbox app key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Dropbox app secret (not needed for PKCE apps).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Remote folder holding the collection files (`""` = app folder root).
    pub remote_root: String,

    pub sync_interval_secs: u64,
    pub auth_timeout_secs: u64,
    pub request_timeout_secs: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            remote_root: String::new(),
            sync_interval_secs: 30,
            auth_timeout_secs: 120,
            request_timeout_secs: 30,
            db_path: None,
        }
    }
}

impl AppConfig {
    /// Config file merged with the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or an override is malformed.
    pub fn resolve() -> Result<Self> {
        load_config()?.with_env(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a non-numeric interval.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(id) = var("DROPBOX_CLIENT_ID") {
            self.client_id = Some(id);
        }
        if let Some(secret) = var("DROPBOX_CLIENT_SECRET") {
            self.client_secret = Some(secret);
        }
        if let Some(root) = var("STARTSYNC_REMOTE_ROOT") {
            self.remote_root = root;
        }
        if let Some(raw) = var("STARTSYNC_SYNC_INTERVAL_SECS") {
            self.sync_interval_secs = raw.trim().parse().map_err(|_| {
                Error::Config(format!("STARTSYNC_SYNC_INTERVAL_SECS must be a number, got '{raw}'"))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.sync_interval_secs == 0 {
            return Err(Error::Config("sync interval must be at least 1 second".into()));
        }
        if !self.remote_root.is_empty() && !self.remote_root.starts_with('/') {
            return Err(Error::Config(format!(
                "remote root must start with '/', got '{}'",
                self.remote_root
            )));
        }
        Ok(())
    }

    #[must_use]
    pub const fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn coordinator_settings(&self) -> CoordinatorSettings {
        CoordinatorSettings {
            remote_root: self.remote_root.clone(),
            auth_timeout: Duration::from_secs(self.auth_timeout_secs),
        }
    }
}

/// Load the config file, or defaults if it does not exist.
///
/// # Errors
///
/// Returns [`Error::Config`] if the file cannot be read or parsed.
pub fn load_config() -> Result<AppConfig> {
    let Some(path) = super::config_path() else {
        return Ok(AppConfig::default());
    };
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    debug!(path = %path.display(), "Loading config");
    let content = fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;
    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse config file: {e}")))
}

/// Save the config file.
///
/// # Errors
///
/// Returns [`Error::Config`] if the file cannot be written.
pub fn save_config(config: &AppConfig) -> Result<PathBuf> {
    let path = super::config_path()
        .ok_or_else(|| Error::Config("Could not determine home directory".into()))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;
    }
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;
    fs::write(&path, content)
        .map_err(|e| Error::Config(format!("Failed to write config file: {e}")))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.sync_interval(), Duration::from_secs(30));
        assert_eq!(
            config.coordinator_settings().auth_timeout,
            Duration::from_secs(120)
        );
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_env_overrides_file() {
        let config = AppConfig {
            client_id: Some("from-file".into()),
            ..AppConfig::default()
        }
        .with_env(env(&[
            ("DROPBOX_CLIENT_ID", "from-env"),
            ("STARTSYNC_SYNC_INTERVAL_SECS", "45"),
            ("STARTSYNC_REMOTE_ROOT", "/startpage"),
            ("DROPBOX_CLIENT_SECRET", ""),
        ]))
        .unwrap();

        assert_eq!(config.client_id.as_deref(), Some("from-env"));
        assert_eq!(config.client_secret, None);
        assert_eq!(config.sync_interval_secs, 45);
        assert_eq!(config.coordinator_settings().remote_root, "/startpage");
    }

    #[test]
    fn test_bad_values_are_config_errors() {
        let err = AppConfig::default()
            .with_env(env(&[("STARTSYNC_SYNC_INTERVAL_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = AppConfig::default()
            .with_env(env(&[("STARTSYNC_REMOTE_ROOT", "no-slash")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_file_format_is_camel_case() {
        let config: AppConfig =
            serde_json::from_str(r#"{"clientId": "k", "syncIntervalSecs": 60}"#).unwrap();
        assert_eq!(config.client_id.as_deref(), Some("k"));
        assert_eq!(config.sync_interval_secs, 60);
        assert_eq!(config.auth_timeout_secs, 120);
    }
}
