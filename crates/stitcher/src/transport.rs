//! Retrieval of raw tile data over the network.

use std::future::Future;
use std::time::Duration;

use crate::{Error, FetchError, Result};

/// Retrieves the bytes behind a url
pub trait TileTransport: Send + Sync {
    fn get(&self, url: &str) -> impl Future<Output = std::result::Result<Vec<u8>, FetchError>> + Send;
}

/// Bounded retries with exponential backoff for transient failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: u32) -> Self {
        RetryPolicy {
            max_retries,
            ..Default::default()
        }
    }

    pub fn no_retries() -> Self {
        RetryPolicy::with_max_retries(0)
    }

    /// Delay before the given retry attempt (1 based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(8),
        }
    }
}

/// Runs `op` until it succeeds, fails with a non transient error or the retries are exhausted
pub async fn retry_transient<F, Fut>(policy: &RetryPolicy, url: &str, mut op: F) -> std::result::Result<Vec<u8>, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<Vec<u8>, FetchError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(data) => return Ok(data),
            Err(err) if err.is_transient() && attempt < policy.max_retries => {
                attempt += 1;
                let delay = policy.backoff(attempt);
                log::debug!("Retrying {url} in {}ms (attempt {attempt}/{}): {err}", delay.as_millis(), policy.max_retries);
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Http tile transport using a shared reqwest client
///
/// The client enforces the per request timeout and identifies itself with the configured user agent.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpTransport {
    pub fn new(timeout: Duration, user_agent: &str, retry: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| Error::Runtime(format!("Failed to create http client: {e}")))?;

        Ok(HttpTransport { client, retry })
    }

    async fn get_once(&self, url: &str) -> std::result::Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await.map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(request_error)?;
        log::trace!("Received {} bytes from {url}", bytes.len());
        Ok(bytes.to_vec())
    }
}

fn request_error(err: reqwest::Error) -> FetchError {
    if err.is_builder() {
        FetchError::InvalidUrl(error_chain(&err))
    } else if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(error_chain(&err))
    }
}

/// The error message followed by the messages of its causes
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    message
}

impl TileTransport for HttpTransport {
    async fn get(&self, url: &str) -> std::result::Result<Vec<u8>, FetchError> {
        retry_transient(&self.retry, url, || self.get_once(url)).await
    }
}
