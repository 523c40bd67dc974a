// =============================================================================
// WebhookSender — stateless HTTP POST with exponential backoff
// =============================================================================
//
// Grounded on the signed-request retry shape of `binance::client::BinanceClient`
// (build a `reqwest::Client` once, issue requests, inspect status), generalized
// per §4.5: unsigned JSON POST, capped exponential backoff between attempts,
// per-attempt timeout. Redirects are followed transparently by the default
// `reqwest::Client` configuration; every exit path drops the response body.
// =============================================================================

use std::time::Duration;

use tracing::{debug, warn};

use crate::types::WebhookPayload;

/// User-Agent sent with every webhook POST (§6.2).
const USER_AGENT: &str = "hedera-network-monitor/1.0";

/// Per-call tuning for [`WebhookSender::send`]. Defaults match §4.5.
#[derive(Debug, Clone, Copy)]
pub struct WebhookConfig {
    pub timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(32),
        }
    }
}

/// Stateless HTTP POST sender with capped exponential backoff.
#[derive(Clone)]
pub struct WebhookSender {
    client: reqwest::Client,
}

impl WebhookSender {
    /// Build a sender. A fresh `reqwest::Client` is constructed here (not
    /// per-attempt) so connection pooling is shared across retries — the
    /// per-attempt `timeout` is instead applied via `RequestBuilder::timeout`.
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .build()
            .expect("failed to build reqwest client");
        Self { client }
    }

    /// POST `payload` as JSON to `url`, retrying on transport failure or a
    /// non-2xx response up to `config.max_retries` additional times, with
    /// backoff `min(initial_backoff * 2^attempt, max_backoff)` between
    /// attempts (§4.5, §8 property 7). Issues at most `max_retries + 1`
    /// requests total (§8 property 6).
    pub async fn send(
        &self,
        url: &str,
        payload: &WebhookPayload,
        config: WebhookConfig,
    ) -> anyhow::Result<()> {
        let body = serde_json::to_vec(payload)?;

        let mut last_err: Option<anyhow::Error> = None;

        for attempt in 0..=config.max_retries {
            let result = self
                .client
                .post(url)
                .header("Content-Type", "application/json")
                .header("User-Agent", USER_AGENT)
                .timeout(config.timeout)
                .body(body.clone())
                .send()
                .await;

            match result {
                Ok(resp) => {
                    let status = resp.status();
                    // Drain and drop the body on every exit path, success or not.
                    let _ = resp.bytes().await;
                    if status.is_success() {
                        debug!(url, attempt, "webhook delivered");
                        return Ok(());
                    }
                    warn!(url, attempt, %status, "webhook returned non-2xx status");
                    last_err = Some(anyhow::anyhow!("webhook {url} returned status {status}"));
                }
                Err(e) => {
                    warn!(url, attempt, error = %e, "webhook request failed");
                    last_err = Some(anyhow::anyhow!(e));
                }
            }

            if attempt < config.max_retries {
                let backoff = Self::backoff_for(attempt, config);
                tokio::time::sleep(backoff).await;
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("webhook {url} failed with no attempts")))
    }

    /// Backoff delay before the attempt following `attempt` (0-indexed).
    fn backoff_for(attempt: u32, config: WebhookConfig) -> Duration {
        let scaled = config
            .initial_backoff
            .checked_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
            .unwrap_or(config.max_backoff);
        scaled.min(config.max_backoff)
    }
}

impl Default for WebhookSender {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_up_to_cap() {
        let config = WebhookConfig {
            timeout: Duration::from_secs(1),
            max_retries: 5,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(100),
        };
        assert_eq!(WebhookSender::backoff_for(0, config), Duration::from_millis(10));
        assert_eq!(WebhookSender::backoff_for(1, config), Duration::from_millis(20));
        assert_eq!(WebhookSender::backoff_for(2, config), Duration::from_millis(40));
        assert_eq!(WebhookSender::backoff_for(3, config), Duration::from_millis(80));
        // Capped at max_backoff from here on.
        assert_eq!(WebhookSender::backoff_for(4, config), Duration::from_millis(100));
        assert_eq!(WebhookSender::backoff_for(10, config), Duration::from_millis(100));
    }

    #[tokio::test]
    async fn send_succeeds_on_first_2xx() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let sender = WebhookSender::new();
        let payload = sample_payload();
        let result = sender
            .send(&format!("{}/hook", server.uri()), &payload, WebhookConfig::default())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn send_exhausts_retries_and_fails() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        let config = WebhookConfig {
            timeout: Duration::from_secs(1),
            max_retries: 2,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
        };

        // max_retries + 1 total attempts expected (§8 property 6).
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(503))
            .expect(config.max_retries as u64 + 1)
            .mount(&server)
            .await;

        let sender = WebhookSender::new();
        let payload = sample_payload();
        let result = sender
            .send(&format!("{}/hook", server.uri()), &payload, config)
            .await;
        assert!(result.is_err());
    }

    fn sample_payload() -> WebhookPayload {
        WebhookPayload {
            rule_id: "r1".to_string(),
            rule_name: "test".to_string(),
            severity: crate::types::Severity::Warning,
            message: "m".to_string(),
            value: 1.0,
            timestamp: 0,
            metric_id: "m".to_string(),
        }
    }
}
