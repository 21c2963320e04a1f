//! Retrying request executor
//!
//! Wraps one gated dispatch in classification-aware retry:
//!
//! | Condition | Action |
//! |-----------|--------|
//! | Transport failure (connect, timeout, body read) | Retry with backoff |
//! | HTTP 408, 429, 500, 502, 503, 504 | Retry with backoff |
//! | Any other error status | Fail immediately (`RequestFailed`) |
//! | 2xx | Return; the caller validates the body |
//!
//! Backoff doubles from the base delay each retry, capped at the max delay.
//! After the last attempt the final failure is wrapped in `RetryExhausted`.
//! Every attempt goes back through the gate.

use crate::client::{CatalogClient, CatalogResponse};
use crate::config::RetryConfig;
use crate::scrape::gate::Gate;
use crate::ScrapeError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How often and how patiently a request is retried
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32 << retry.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Sends catalog requests through the gate, retrying transient failures
#[derive(Debug)]
pub struct Executor {
    client: CatalogClient,
    gate: Arc<Gate>,
    policy: RetryPolicy,

    /// Dispatches issued so far, retries included
    dispatches: AtomicU64,
}

impl Executor {
    pub fn new(client: CatalogClient, gate: Arc<Gate>, policy: RetryPolicy) -> Self {
        Self {
            client,
            gate,
            policy,
            dispatches: AtomicU64::new(0),
        }
    }

    pub fn gate(&self) -> &Arc<Gate> {
        &self.gate
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Total dispatches issued through this executor
    pub fn dispatches(&self) -> u64 {
        self.dispatches.load(Ordering::Relaxed)
    }

    /// Posts `body` to `endpoint`, retrying per the policy
    pub async fn execute(&self, endpoint: &str, body: &str) -> Result<CatalogResponse, ScrapeError> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let outcome = {
                let _permit = self.gate.acquire().await?;
                self.dispatches.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Dispatching {} (attempt {})", endpoint, attempt);
                self.client.post(endpoint, body).await
            };

            let error = match outcome {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() => e,
                Err(e) => return Err(e),
            };

            if attempt >= self.policy.max_attempts {
                tracing::warn!(
                    "Giving up on {} after {} attempts: {}",
                    endpoint,
                    attempt,
                    error
                );
                return Err(ScrapeError::RetryExhausted {
                    attempts: attempt,
                    source: Box::new(error),
                });
            }

            let delay = self.policy.delay_for(attempt);
            tracing::warn!(
                "Retrying {} in {:?} (attempt {}/{}): {}",
                endpoint,
                delay,
                attempt,
                self.policy.max_attempts,
                error
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credentials;
    use crate::client::build_http_client;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
        }
    }

    fn executor_for(base_url: &str) -> Executor {
        let http = build_http_client(Duration::from_secs(5)).unwrap();
        let client = CatalogClient::new(http, base_url, Credentials::new("id", "token")).unwrap();
        Executor::new(client, Arc::new(Gate::new(8, 1000.0).unwrap()), fast_policy())
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
        assert_eq!(policy.delay_for(4), Duration::from_millis(500));
        assert_eq!(policy.delay_for(40), Duration::from_millis(500));
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_succeeds_after_two_503s() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/games"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .up_to_n_times(2)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/games"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&mock_server)
            .await;

        let executor = executor_for(&mock_server.uri());
        let response = executor.execute("games", "fields name;").await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(executor.dispatches(), 3);
        assert_eq!(mock_server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_five_503s_exhaust_retries() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let executor = executor_for(&mock_server.uri());
        let result = executor.execute("games", "fields name;").await;

        match result {
            Err(ScrapeError::RetryExhausted { attempts, source }) => {
                assert_eq!(attempts, 5);
                assert!(matches!(
                    *source,
                    ScrapeError::RetryableStatus { status: 503, .. }
                ));
            }
            other => panic!("expected RetryExhausted, got {:?}", other),
        }
        assert_eq!(executor.dispatches(), 5);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Syntax error"))
            .mount(&mock_server)
            .await;

        let executor = executor_for(&mock_server.uri());
        let result = executor.execute("games", "fields;").await;

        assert!(matches!(
            result,
            Err(ScrapeError::RequestFailed { status: 400, ref body }) if body == "Syntax error"
        ));
        assert_eq!(executor.dispatches(), 1);
    }

    #[tokio::test]
    async fn test_connection_refused_is_retried() {
        let uri = {
            let mock_server = MockServer::start().await;
            mock_server.uri()
        };

        let executor = executor_for(&uri);
        let result = executor.execute("games", "fields name;").await;

        match result {
            Err(ScrapeError::RetryExhausted { attempts, source }) => {
                assert_eq!(attempts, 5);
                assert!(matches!(*source, ScrapeError::TransportFailure { .. }));
            }
            other => panic!("expected RetryExhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_every_attempt_passes_the_gate() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&mock_server)
            .await;

        let http = build_http_client(Duration::from_secs(5)).unwrap();
        let client = CatalogClient::new(http, &mock_server.uri(), Credentials::new("id", "token")).unwrap();
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        };
        // 10 admissions per second: three attempts need at least 200ms
        let executor = Executor::new(client, Arc::new(Gate::new(1, 10.0).unwrap()), policy);

        let start = std::time::Instant::now();
        let result = executor.execute("games", "fields name;").await;

        assert!(matches!(result, Err(ScrapeError::RetryExhausted { attempts: 3, .. })));
        assert!(start.elapsed() >= Duration::from_millis(190));
        assert_eq!(executor.gate().in_flight(), 0);
    }
}
