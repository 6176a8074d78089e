//! Remote record sources

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::record::RemoteRecord;
use crate::{LookupError, Result};

const USER_AGENT: &str = concat!("pokeagent/", env!("CARGO_PKG_VERSION"));

/// Where remote records come from
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<RemoteRecord>;
}

/// HTTP GET source. No timeout unless one is configured.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    timeout: Option<Duration>,
}

impl HttpSource {
    pub fn new() -> Self {
        Self::with_timeout(None)
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordSource for HttpSource {
    async fn fetch(&self, url: &str) -> Result<RemoteRecord> {
        debug!("Fetching record: {}", url);

        let mut request = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!("Fetch of {} returned {}", url, status);
            return Err(LookupError::FetchFailed {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body: Value = response.json().await?;
        Ok(RemoteRecord::new(body))
    }
}
