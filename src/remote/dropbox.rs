//! Dropbox HTTP API v2 remote store.
//!
//! RPC endpoints (`users/get_current_account`, `files/get_metadata`) live
//! on the API host and take JSON bodies; content endpoints
//! (`files/download`, `files/upload`) live on the content host and take
//! their arguments in the `Dropbox-API-Arg` header.

use serde::Serialize;
use std::time::Duration;
use tracing::{debug, trace};

use super::{Account, Metadata, RemoteError, RemoteStore, UploadMode};
use crate::auth::TokenStore;
use crate::storage::LocalStore;

/// Base URLs of the Dropbox API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropboxEndpoints {
    pub api: String,
    pub content: String,
}

impl Default for DropboxEndpoints {
    fn default() -> Self {
        Self {
            api: "https://api.dropboxapi.com/2".to_string(),
            content: "https://content.dropboxapi.com/2".to_string(),
        }
    }
}

/// Dropbox-backed [`RemoteStore`].
///
/// The bearer token is read from the token store on every request so a
/// refresh performed by the auth provider is picked up immediately.
pub struct DropboxStore<S: LocalStore> {
    client: reqwest::Client,
    endpoints: DropboxEndpoints,
    tokens: TokenStore<S>,
}

#[derive(Serialize)]
struct PathArg<'a> {
    path: &'a str,
}

#[derive(Serialize)]
struct UploadArg<'a> {
    path: &'a str,
    mode: &'a str,
    autorename: bool,
    mute: bool,
}

impl<S: LocalStore> DropboxStore<S> {
    /// Create a store with the given endpoints and per-request timeout.
    #[must_use]
    pub fn new(tokens: TokenStore<S>, endpoints: DropboxEndpoints, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoints,
            tokens,
        }
    }

    fn bearer(&self) -> Result<String, RemoteError> {
        match self.tokens.load() {
            Ok(Some(auth)) => Ok(auth.access_token),
            Ok(None) => Err(RemoteError::Unauthorized),
            Err(e) => Err(RemoteError::Transient(format!("token store: {e}"))),
        }
    }

    async fn check(response: reqwest::Response, path: &str) -> Result<reqwest::Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), path, "Dropbox request failed");
        Err(RemoteError::from_status(status.as_u16(), &body, path))
    }
}

impl<S: LocalStore> RemoteStore for DropboxStore<S> {
    async fn current_account(&self) -> Result<Account, RemoteError> {
        let url = format!("{}/users/get_current_account", self.endpoints.api);
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.bearer()?)
            .send()
            .await?;
        let response = Self::check(response, "").await?;
        Ok(response.json().await?)
    }

    async fn get_metadata(&self, path: &str) -> Result<Metadata, RemoteError> {
        let url = format!("{}/files/get_metadata", self.endpoints.api);
        trace!(path, "get_metadata");
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.bearer()?)
            .json(&PathArg { path })
            .send()
            .await?;
        let response = Self::check(response, path).await?;
        Ok(response.json().await?)
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, RemoteError> {
        let url = format!("{}/files/download", self.endpoints.content);
        trace!(path, "download");
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.bearer()?)
            .header("Dropbox-API-Arg", api_arg(&PathArg { path })?)
            .send()
            .await?;
        let response = Self::check(response, path).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn upload(&self, path: &str, bytes: &[u8], mode: UploadMode) -> Result<Metadata, RemoteError> {
        let url = format!("{}/files/upload", self.endpoints.content);
        let arg = UploadArg {
            path,
            mode: match mode {
                UploadMode::Overwrite => "overwrite",
                UploadMode::CreateIfAbsent => "add",
            },
            autorename: false,
            mute: true,
        };
        trace!(path, size = bytes.len(), ?mode, "upload");
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.bearer()?)
            .header("Dropbox-API-Arg", api_arg(&arg)?)
            .header("Content-Type", "application/octet-stream")
            .body(bytes.to_vec())
            .send()
            .await?;
        let response = Self::check(response, path).await?;
        Ok(response.json().await?)
    }
}

/// Serialize a `Dropbox-API-Arg` header value.
///
/// HTTP headers must be ASCII, so every non-ASCII character is written as a
/// JSON `\uXXXX` escape (surrogate pairs for astral characters).
fn api_arg<T: Serialize>(arg: &T) -> Result<String, RemoteError> {
    let json = serde_json::to_string(arg).map_err(|e| RemoteError::Transient(e.to_string()))?;
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_arg_escapes_non_ascii() {
        let arg = api_arg(&PathArg { path: "/caf\u{e9}.json" }).unwrap();
        assert_eq!(arg, r#"{"path":"/caf\u00e9.json"}"#);
        assert!(arg.is_ascii());
    }

    #[test]
    fn test_api_arg_surrogate_pair() {
        let arg = api_arg(&PathArg { path: "\u{1F600}" }).unwrap();
        assert_eq!(arg, r#"{"path":"\ud83d\ude00"}"#);
    }

    #[test]
    fn test_upload_arg_modes() {
        let arg = api_arg(&UploadArg {
            path: "/favorites.json",
            mode: "add",
            autorename: false,
            mute: true,
        })
        .unwrap();
        assert!(arg.contains(r#""mode":"add""#));
        assert!(arg.contains(r#""autorename":false"#));
    }
}
