//! JSON fetching with bounded retries
//!
//! Transient server errors (by default 500/502/503/504) and connect/timeout
//! failures are retried with exponential backoff. Everything else fails
//! fast. [`HttpFetcher::fetch_json`] never surfaces an error: a failed fetch
//! is logged and reported as `None`, meaning "no data this cycle".

use crate::config::FetchConfig;
use crate::error::{BotError, Result};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first request
    pub max_retries: u32,
    pub backoff_factor: Duration,
    pub retry_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_factor: Duration::from_millis(200),
            retry_statuses: vec![500, 502, 503, 504],
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_factor: config.backoff_factor(),
            retry_statuses: config.retry_statuses.clone(),
        }
    }

    /// Sleep before retry `n` (1-based): `backoff_factor * 2^(n-1)`
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(31);
        self.backoff_factor.saturating_mul(1u32 << exp)
    }

    pub fn is_retryable(&self, status: StatusCode) -> bool {
        self.retry_statuses.contains(&status.as_u16())
    }

    /// Sum of all backoff sleeps when every retry is used
    pub fn worst_case_delay(&self) -> Duration {
        (1..=self.max_retries).map(|n| self.delay_for(n)).sum()
    }
}

/// Outcome of a single request
enum Attempt {
    Ok(Response),
    Transient(String),
    Failed(BotError),
}

#[derive(Clone)]
pub struct HttpFetcher {
    http: Client,
    policy: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(policy: RetryPolicy, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, policy })
    }

    pub fn from_config(config: &FetchConfig) -> Result<Self> {
        Self::new(RetryPolicy::from_config(config), config.timeout())
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// GET `url` and decode the body as JSON. Failures are logged and
    /// returned as `None`.
    pub async fn fetch_json(
        &self,
        url: &str,
        headers: Option<&HashMap<String, String>>,
        params: Option<&[(String, String)]>,
    ) -> Option<Value> {
        match self.get_json(url, headers, params).await {
            Ok(value) => Some(value),
            Err(e) => {
                error!("Error making request to {}: {}", url, e);
                None
            }
        }
    }

    /// Same as [`fetch_json`](Self::fetch_json) but keeps the error
    pub async fn get_json(
        &self,
        url: &str,
        headers: Option<&HashMap<String, String>>,
        params: Option<&[(String, String)]>,
    ) -> Result<Value> {
        let mut retry = 0;
        loop {
            match self.attempt(url, headers, params).await {
                Attempt::Ok(resp) => {
                    let value = resp.json::<Value>().await.map_err(|e| BotError::Fetch {
                        url: url.to_string(),
                        reason: format!("invalid JSON body: {}", e),
                    })?;
                    debug!("Fetched {} after {} retries", url, retry);
                    return Ok(value);
                }
                Attempt::Transient(reason) if retry < self.policy.max_retries => {
                    retry += 1;
                    let delay = self.policy.delay_for(retry);
                    warn!(
                        "Transient failure from {} ({}), retry {}/{} in {}ms",
                        url,
                        reason,
                        retry,
                        self.policy.max_retries,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Attempt::Transient(reason) => {
                    return Err(BotError::Fetch {
                        url: url.to_string(),
                        reason: format!("gave up after {} retries: {}", retry, reason),
                    });
                }
                Attempt::Failed(e) => return Err(e),
            }
        }
    }

    async fn attempt(
        &self,
        url: &str,
        headers: Option<&HashMap<String, String>>,
        params: Option<&[(String, String)]>,
    ) -> Attempt {
        let mut req = self.http.get(url);
        if let Some(headers) = headers {
            for (name, value) in headers {
                req = req.header(name.as_str(), value.as_str());
            }
        }
        if let Some(params) = params {
            req = req.query(params);
        }

        match req.send().await {
            Ok(resp) => {
                let status = resp.status();
                if status.is_success() {
                    Attempt::Ok(resp)
                } else if self.policy.is_retryable(status) {
                    Attempt::Transient(format!("HTTP {}", status))
                } else {
                    Attempt::Failed(BotError::Fetch {
                        url: url.to_string(),
                        reason: format!("HTTP {}", status),
                    })
                }
            }
            Err(e) if e.is_connect() || e.is_timeout() => Attempt::Transient(e.to_string()),
            Err(e) => Attempt::Failed(BotError::Http(e)),
        }
    }
}
