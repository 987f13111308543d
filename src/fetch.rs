//! Bounded-timeout JSON retrieval.
//!
//! The [`Fetch`] trait is the seam between the discovery walker and the
//! network. [`HttpFetcher`] is the production implementation: one shared
//! `reqwest::Client`, one GET per call, the same timeout for every call.
//!
//! Failures are split into three kinds so callers can tell an unreachable
//! service from a misbehaving one:
//!
//! | Variant | Cause |
//! |---------|-------|
//! | [`FetchError::Transport`] | connect failure, timeout, body read failure |
//! | [`FetchError::Response`] | non-2xx status |
//! | [`FetchError::Decode`] | body is not valid JSON |

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Failure of a single fetch.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("transport error fetching {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with status {status}")]
    Response { url: String, status: u16 },

    #[error("could not decode JSON body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// The address the failed fetch was aimed at.
    pub fn url(&self) -> &str {
        match self {
            FetchError::Transport { url, .. }
            | FetchError::Response { url, .. }
            | FetchError::Decode { url, .. } => url,
        }
    }
}

/// Retrieves a resource by address and parses it as JSON.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch `url` and return the parsed body exactly as received.
    async fn fetch(&self, url: &str) -> Result<Value, FetchError>;
}

/// [`Fetch`] implementation over HTTP.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher whose every request is bounded by `timeout`.
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
        debug!(url, "fetching");

        let transport = |source: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Response {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport)?;

        serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }
}
