//! HTTP plumbing underneath the archive client.
//!
//! `Transport` is a single blocking GET returning the response body. Layers
//! compose around it: [`Retrying`] here, [`crate::data::Cached`] in `cache.rs`.

use std::thread;
use std::time::Duration;

use log::{debug, warn};
use reqwest::blocking::Client;
use thiserror::Error;

use crate::domain::ProviderConfig;
use crate::error::{ForecastError, Result};

/// Query parameters, in request order.
pub type Query = [(String, String)];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connect/timeout/protocol failure before a status was received.
    #[error("request to {url} failed: {message}")]
    Connection { url: String, message: String },
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16, body: String },
    #[error("could not read response from {url}: {message}")]
    Body { url: String, message: String },
}

impl TransportError {
    /// Connection failures, rate limiting and gateway-style server errors are
    /// worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Connection { .. } => true,
            TransportError::Status { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            TransportError::Body { .. } => false,
        }
    }
}

pub trait Transport: Send + Sync {
    fn get(&self, url: &str, query: &Query) -> std::result::Result<String, TransportError>;
}

/// Blocking reqwest client.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ForecastError::config("http_client", format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, query: &Query) -> std::result::Result<String, TransportError> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(|e| TransportError::Connection {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        // Read the body either way: the archive explains 4xx errors in JSON.
        let body = resp.text().map_err(|e| TransportError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: body.chars().take(512).collect(),
            });
        }
        Ok(body)
    }
}

/// Retry budget and backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Seconds; retry `n` (1-based) waits `backoff_factor × 2^(n−1)`.
    pub backoff_factor: f64,
}

impl RetryPolicy {
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_factor: config.backoff_factor,
        }
    }

    pub fn delay(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(16) as i32;
        Duration::from_secs_f64(self.backoff_factor * 2f64.powi(exp))
    }
}

/// Retries retryable failures of the inner transport with exponential backoff.
pub struct Retrying<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T> Retrying<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: Transport> Transport for Retrying<T> {
    fn get(&self, url: &str, query: &Query) -> std::result::Result<String, TransportError> {
        let mut retry = 0;
        loop {
            match self.inner.get(url, query) {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && retry < self.policy.max_retries => {
                    retry += 1;
                    let wait = self.policy.delay(retry);
                    warn!(
                        "{e}; retry {retry}/{} in {:.2}s",
                        self.policy.max_retries,
                        wait.as_secs_f64()
                    );
                    thread::sleep(wait);
                }
                Err(e) => {
                    debug!("giving up on {url} after {} attempt(s)", retry + 1);
                    return Err(e);
                }
            }
        }
    }
}
