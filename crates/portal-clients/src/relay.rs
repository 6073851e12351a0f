//! Form relay client.

use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use portal_core::{defaults, Error, RelayRequest, RelayResponse, Result};

/// Client for the serverless form relay endpoint.
pub struct FormRelayClient {
    client: Client,
    url: String,
}

impl FormRelayClient {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, Duration::from_secs(defaults::HTTP_TIMEOUT_SECS))
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let url = url.into();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!("Invalid relay URL: {}", url)));
        }
        let client = Client::builder().timeout(timeout).build()?;
        info!(subsystem = "relay", url = %url, "Initializing form relay client");
        Ok(Self { client, url })
    }

    /// Create from `RELAY_URL`. Returns Ok(None) if it is not set.
    pub fn from_env() -> Result<Option<Self>> {
        match std::env::var("RELAY_URL") {
            Ok(url) if !url.trim().is_empty() => Self::new(url.trim()).map(Some),
            _ => Ok(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST the request and return the relay's reply.
    ///
    /// A reply with `success: false` is an error carrying the relay's message.
    #[instrument(skip(self, request), fields(subsystem = "relay", op = "submit", request_type = %request.request_type, file_count = request.files.len()))]
    pub async fn submit(&self, request: &RelayRequest) -> Result<RelayResponse> {
        let start = Instant::now();
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Request(format!("Relay request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Relay returned an error status");
            return Err(Error::Request(format!("Relay returned {}: {}", status, body)));
        }

        let reply: RelayResponse = response
            .json()
            .await
            .map_err(|e| Error::Request(format!("Failed to parse relay response: {}", e)))?;

        debug!(
            success = reply.success,
            duration_ms = start.elapsed().as_millis() as u64,
            "Relay request complete"
        );

        if !reply.success {
            return Err(Error::Request(
                reply
                    .message
                    .unwrap_or_else(|| "Relay rejected the request".to_string()),
            ));
        }
        Ok(reply)
    }
}
