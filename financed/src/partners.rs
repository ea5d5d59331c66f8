//! A client for the partner directory service.

use crate::breaker::{BreakerConfig, BreakerOpen, CircuitBreaker};
use finance_api::{
    models::{Partner, PartnerId},
    ports::PartnerDirectory,
};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use tracing::{Level, event};

/// Settings for [`PartnerClient`]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PartnersConfig {
    /// The directory's base URL; partners live under `{url}/api/v1/partners/{id}`
    #[serde(default = "default_url")]
    pub url: String,
    /// Timeout for each attempt
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
    /// How many times a lookup is attempted
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    /// The wait before the first retry; later retries wait proportionally longer
    #[serde(default = "default_backoff", with = "humantime_serde")]
    pub backoff: Duration,
    /// Circuit breaker thresholds
    #[serde(flatten)]
    pub breaker: BreakerConfig,
}

fn default_url() -> String {
    "http://localhost:8081".to_owned()
}

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_attempts() -> u32 {
    3
}

fn default_backoff() -> Duration {
    Duration::from_millis(200)
}

impl Default for PartnersConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout: default_timeout(),
            attempts: default_attempts(),
            backoff: default_backoff(),
            breaker: BreakerConfig::default(),
        }
    }
}

/// Errors raised while asking the directory
#[derive(Debug, thiserror::Error)]
pub enum PartnerError {
    /// The request could not be sent or the body could not be read
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The directory answered with an unexpected status
    #[error("unexpected status {0}")]
    Status(StatusCode),
    /// Recent lookups failed and the directory is not being asked
    #[error(transparent)]
    BreakerOpen(#[from] BreakerOpen),
}

/// A [`PartnerDirectory`] that asks the remote service over HTTP.
///
/// Lookups are retried with linear backoff. The breaker sees one outcome per
/// lookup, after the retries are spent.
#[derive(Debug, Clone)]
pub struct PartnerClient {
    client: reqwest::Client,
    base_url: String,
    attempts: u32,
    backoff: Duration,
    breaker: Arc<CircuitBreaker>,
}

impl PartnerClient {
    /// Build a client; fails only if the TLS backend cannot be initialized
    pub fn new(config: PartnersConfig) -> Result<Self, PartnerError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_owned(),
            attempts: config.attempts.max(1),
            backoff: config.backoff,
            breaker: Arc::new(CircuitBreaker::new(config.breaker)),
        })
    }

    /// The breaker guarding this client
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    async fn lookup_once(&self, partner_id: PartnerId) -> Result<Option<Partner>, PartnerError> {
        let url = format!("{}/api/v1/partners/{}", self.base_url, partner_id.0);
        let response = self.client.get(url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => Err(PartnerError::Status(status)),
        }
    }

    async fn lookup(&self, partner_id: PartnerId) -> Result<Option<Partner>, PartnerError> {
        let mut attempt = 1;
        loop {
            match self.lookup_once(partner_id).await {
                Ok(partner) => return Ok(partner),
                Err(err) if attempt < self.attempts => {
                    event!(Level::DEBUG, partner_id = partner_id.0, attempt, err = err.to_string(), "partner lookup failed, retrying");
                    tokio::time::sleep(self.backoff * attempt).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl PartnerDirectory for PartnerClient {
    type Error = PartnerError;

    async fn find_partner(&self, partner_id: PartnerId) -> Result<Option<Partner>, Self::Error> {
        let permit = self.breaker.acquire()?;
        match self.lookup(partner_id).await {
            Ok(partner) => {
                permit.succeed();
                Ok(partner)
            }
            Err(err) => {
                permit.fail();
                Err(err)
            }
        }
    }
}
