//! Outbound delivery
//!
//! Serializes a payload once, signs it, and POSTs it to each subscriber URL
//! with bounded exponential backoff. Only transport-level failures are
//! retried; an HTTP response of any status counts as delivered to the
//! transport and is not re-sent (non-2xx statuses are logged for the
//! operator).

use crate::signature::{WebhookSigner, SIGNATURE_HEADER};
use crate::{Result, WebhookError};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

/// Retry policy for webhook delivery
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_delay: Duration,
    /// Backoff multiplier between attempts
    pub multiplier: f64,
    /// Per-attempt request timeout
    pub request_timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
            multiplier: 2.0,
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    /// Delay to sleep after the given failed attempt (1-indexed): 1s, 2s,
    /// 4s, 8s with the default configuration.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        self.initial_delay
            .mul_f64(self.multiplier.powi(attempt as i32 - 1))
    }
}

/// Delivers signed payloads to the configured subscriber URLs.
pub struct WebhookDispatcher {
    client: Client,
    urls: Vec<String>,
    signer: WebhookSigner,
    retry: RetryConfig,
}

impl WebhookDispatcher {
    pub fn new(urls: Vec<String>, secret: &str, retry: RetryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(retry.request_timeout)
            .build()
            .map_err(|e| WebhookError::InvalidUrl(e.to_string()))?;

        Ok(Self {
            client,
            urls,
            signer: WebhookSigner::new(secret),
            retry,
        })
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn has_subscribers(&self) -> bool {
        !self.urls.is_empty()
    }

    /// Deliver one payload to one URL, retrying transport failures with the
    /// configured backoff. Succeeds on the first response of any status.
    pub async fn deliver<T: Serialize>(&self, payload: &T, url: &str) -> Result<()> {
        let body = serde_json::to_vec(payload)
            .map_err(|e| WebhookError::Serialization(e.to_string()))?;
        self.deliver_bytes(&body, url).await
    }

    async fn deliver_bytes(&self, body: &[u8], url: &str) -> Result<()> {
        let signature = self.signer.header_value(body);

        let mut last_error = String::new();
        for attempt in 1..=self.retry.max_attempts {
            let result = self
                .client
                .post(url)
                .header("Content-Type", "application/json")
                .header(SIGNATURE_HEADER, &signature)
                .body(body.to_vec())
                .send()
                .await;

            match result {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        // Deliberately not a retry trigger; the receiver saw
                        // the request.
                        warn!(url, %status, attempt, "Webhook received non-success response");
                    }
                    info!(url, attempt, "Webhook delivered");
                    return Ok(());
                }
                Err(e) => {
                    warn!(url, attempt, error = %e, "Webhook delivery attempt failed");
                    last_error = e.to_string();
                }
            }

            if attempt < self.retry.max_attempts {
                tokio::time::sleep(self.retry.delay_for_attempt(attempt)).await;
            }
        }

        Err(WebhookError::DeliveryFailed {
            attempts: self.retry.max_attempts,
            last_error,
        })
    }

    /// Deliver one payload to every configured URL, independently; one
    /// URL's failure never affects another's delivery. Returns the per-URL
    /// outcomes in configuration order.
    pub async fn dispatch_all<T: Serialize>(&self, payload: &T) -> Vec<(String, Result<()>)> {
        let body = match serde_json::to_vec(payload) {
            Ok(body) => body,
            Err(e) => {
                let err = WebhookError::Serialization(e.to_string());
                warn!(error = %err, "Failed to serialize webhook payload");
                return self
                    .urls
                    .iter()
                    .map(|url| {
                        (
                            url.clone(),
                            Err(WebhookError::Serialization(e.to_string())),
                        )
                    })
                    .collect();
            }
        };

        let mut outcomes = Vec::with_capacity(self.urls.len());
        for url in &self.urls {
            let outcome = self.deliver_bytes(&body, url).await;
            if let Err(e) = &outcome {
                warn!(url, error = %e, "Webhook delivery failed");
            }
            outcomes.push((url.clone(), outcome));
        }
        outcomes
    }
}
