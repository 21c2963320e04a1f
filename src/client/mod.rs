//! HTTP client for the catalog API
//!
//! This module owns the single point of contact with the remote API:
//! - Building the `reqwest` client with compression and timeouts
//! - Resolving endpoint paths against the configured base URL
//! - Attaching the client ID and bearer token to each request
//! - Classifying the outcome of one dispatch (transport, status)
//!
//! It does not retry and does not throttle; see `scrape::executor` and
//! `scrape::gate` for that.

use crate::auth::{fetch_token, ClientCredentials, Credentials};
use crate::config::ApiConfig;
use crate::ScrapeError;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Statuses worth retrying: timeouts, throttling and transient server errors
pub const RETRYABLE_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Returns true if `status` belongs to the retryable set
pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// A successful (2xx) response from the catalog API
#[derive(Debug, Clone)]
pub struct CatalogResponse {
    pub status: u16,

    /// Content-Type header value, if any
    pub content_type: Option<String>,

    pub body: Vec<u8>,
}

impl CatalogResponse {
    /// Returns true if the Content-Type names JSON (parameters ignored)
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
    }

    /// Body as text, lossily decoded; for error messages
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Builds the HTTP client shared by authentication and catalog requests
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Authenticated client for one catalog API deployment
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: Client,
    base_url: Url,
    credentials: Credentials,
}

impl CatalogClient {
    /// Creates a client; `base_url` gains a trailing `/` if it lacks one so
    /// endpoint paths join beneath it
    pub fn new(http: Client, base_url: &str, credentials: Credentials) -> Result<Self, ScrapeError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    /// Builds a client from the `[api]` config table
    pub fn from_config(config: &ApiConfig, credentials: Credentials) -> Result<Self, ScrapeError> {
        let http = build_http_client(config.request_timeout())?;
        Self::new(http, &config.base_url, credentials)
    }

    /// Exchanges the client credentials for a token, then builds the client
    ///
    /// The token request and catalog requests share one `reqwest` client.
    pub async fn connect(
        config: &ApiConfig,
        credentials: &ClientCredentials,
    ) -> Result<Self, ScrapeError> {
        let http = build_http_client(config.request_timeout())?;
        let token_url = Url::parse(&config.token_url)?;
        let credentials = fetch_token(&http, &token_url, credentials).await?;
        Self::new(http, &config.base_url, credentials)
    }

    /// Resolves an endpoint such as `games/count` to a full URL
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url, ScrapeError> {
        Ok(self.base_url.join(endpoint.trim_start_matches('/'))?)
    }

    /// Sends one POST with an Apicalypse body
    ///
    /// # Returns
    ///
    /// * `Ok(CatalogResponse)` - 2xx response
    /// * `Err(TransportFailure)` - no usable response (connect, timeout, body read)
    /// * `Err(RetryableStatus)` - status in [`RETRYABLE_STATUSES`]
    /// * `Err(RequestFailed)` - any other error status
    pub async fn post(&self, endpoint: &str, body: &str) -> Result<CatalogResponse, ScrapeError> {
        let url = self.endpoint_url(endpoint)?;
        tracing::trace!("POST {}: {}", url, body);

        let response = self
            .http
            .post(url.clone())
            .header("Client-ID", &self.credentials.client_id)
            .header(
                AUTHORIZATION,
                format!("Bearer {}", self.credentials.bearer_token),
            )
            .header(ACCEPT, "application/json")
            .body(body.to_string())
            .send()
            .await
            .map_err(|source| ScrapeError::TransportFailure {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|source| ScrapeError::TransportFailure {
                url: url.to_string(),
                source,
            })?
            .to_vec();

        classify(status, content_type, body)
    }
}

fn classify(
    status: StatusCode,
    content_type: Option<String>,
    body: Vec<u8>,
) -> Result<CatalogResponse, ScrapeError> {
    let code = status.as_u16();

    if status.is_success() {
        return Ok(CatalogResponse {
            status: code,
            content_type,
            body,
        });
    }

    let body = String::from_utf8_lossy(&body).into_owned();
    if is_retryable_status(code) {
        Err(ScrapeError::RetryableStatus { status: code, body })
    } else {
        Err(ScrapeError::RequestFailed { status: code, body })
    }
}
