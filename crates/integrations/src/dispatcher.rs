//! Dispatcher — posts assembled payloads to the Frontleaf ingestion API,
//! retrying transient failures with exponential backoff.

use serde::Serialize;
use tracing::{error, info, warn};

use frontleaf_core::config::{EndpointConfig, RetryConfig};
use frontleaf_core::error::{FrontleafError, FrontleafResult};
use frontleaf_core::types::Payload;

/// Outcome of a successful delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub path: &'static str,
    pub status: u16,
    pub attempts: u32,
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: reqwest::Client,
    base_url: String,
    retry: RetryConfig,
}

impl Dispatcher {
    pub fn new(endpoint: &EndpointConfig, retry: RetryConfig) -> FrontleafResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(endpoint.timeout())
            .build()
            .map_err(|e| FrontleafError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: endpoint.base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an endpoint path such as `/event`.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST the payload to its endpoint, retrying up to `max_retries` times.
    pub async fn send(&self, payload: &Payload) -> FrontleafResult<Delivery> {
        let path = payload.endpoint_path();
        let url = self.url_for(path);
        let body = payload.to_json()?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.post_once(&url, &body).await {
                Ok(status) => {
                    metrics::counter!("frontleaf_requests_total", "path" => path, "outcome" => "success")
                        .increment(1);
                    info!(path, status, attempts = attempt, "Frontleaf delivery succeeded");
                    return Ok(Delivery {
                        path,
                        status,
                        attempts: attempt,
                    });
                }
                Err(e) if e.is_retryable() && attempt <= self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    metrics::counter!("frontleaf_retries_total", "path" => path).increment(1);
                    warn!(
                        path,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Frontleaf delivery failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    metrics::counter!("frontleaf_requests_total", "path" => path, "outcome" => "failure")
                        .increment(1);
                    error!(path, attempts = attempt, error = %e, "Frontleaf delivery failed");
                    return Err(e);
                }
            }
        }
    }

    async fn post_once(&self, url: &str, body: &serde_json::Value) -> FrontleafResult<u16> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| FrontleafError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FrontleafError::Http {
                status: status.as_u16(),
                path: url_path(url),
            });
        }
        Ok(status.as_u16())
    }
}

/// Path component of a URL, for error messages (`/api/track/event`).
fn url_path(url: &str) -> String {
    url::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string())
}
