//! Connectivity signal.
//!
//! The browser build listens for `online`/`offline` events. Here the
//! daemon polls a [`ConnectivityProbe`] each tick and reports transitions
//! to the coordinator.

use std::future::Future;
use std::time::Duration;

use tracing::trace;

/// Answers whether the remote is currently reachable.
pub trait ConnectivityProbe: Send + Sync {
    fn is_online(&self) -> impl Future<Output = bool> + Send;
}

/// Probe that issues a HEAD request with a short timeout.
///
/// Any HTTP response counts as online; only transport failures count as
/// offline.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpProbe {
    pub const DEFAULT_URL: &'static str = "https://api.dropboxapi.com";

    #[must_use]
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: url.into(),
        }
    }
}

impl ConnectivityProbe for HttpProbe {
    async fn is_online(&self) -> bool {
        let result = self.client.head(&self.url).send().await;
        trace!(url = %self.url, ok = result.is_ok(), "Connectivity probe");
        result.is_ok()
    }
}

/// Probe with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct StaticProbe(pub bool);

impl ConnectivityProbe for StaticProbe {
    async fn is_online(&self) -> bool {
        self.0
    }
}
