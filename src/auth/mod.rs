//! Authentication for the catalog API
//!
//! IGDB authenticates through Twitch's OAuth2 client-credentials flow: the
//! client ID and secret are exchanged once per run for a bearer token, which
//! is then sent with every catalog request alongside the client ID.

use crate::ScrapeError;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

/// Environment variable holding the client ID
pub const CLIENT_ID_ENV: &str = "TWITCH_CLIENT_ID";

/// Environment variable holding the client secret
pub const CLIENT_SECRET_ENV: &str = "TWITCH_CLIENT_SECRET";

/// The application credentials exchanged for a token
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// What every catalog request carries: the client ID and a bearer token
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub bearer_token: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, bearer_token: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            bearer_token: bearer_token.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("bearer_token", &"<redacted>")
            .finish()
    }
}

/// Picks the client ID and secret from flags, falling back to the environment
///
/// `env` looks up a variable by name; the binary passes `std::env::var`.
/// Blank values count as missing.
pub fn resolve_credentials<F>(
    client_id: Option<String>,
    client_secret: Option<String>,
    env: F,
) -> Result<ClientCredentials, ScrapeError>
where
    F: Fn(&str) -> Option<String>,
{
    let pick = |flag: Option<String>, var: &str| {
        flag.filter(|v| !v.trim().is_empty())
            .or_else(|| env(var).filter(|v| !v.trim().is_empty()))
    };

    match (
        pick(client_id, CLIENT_ID_ENV),
        pick(client_secret, CLIENT_SECRET_ENV),
    ) {
        (Some(client_id), Some(client_secret)) => Ok(ClientCredentials {
            client_id,
            client_secret,
        }),
        _ => Err(ScrapeError::CredentialMissing),
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Exchanges client credentials for a bearer token
///
/// The token is assumed valid for the whole run; it is never refreshed.
pub async fn fetch_token(
    client: &Client,
    token_url: &Url,
    credentials: &ClientCredentials,
) -> Result<Credentials, ScrapeError> {
    tracing::debug!("Requesting access token from {}", token_url);

    let response = client
        .post(token_url.clone())
        .query(&[
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("grant_type", "client_credentials"),
        ])
        .send()
        .await
        .map_err(|e| ScrapeError::Auth(format!("token request failed: {}", e)))?;

    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| ScrapeError::Auth(format!("failed to read token response: {}", e)))?;

    if !status.is_success() {
        return Err(ScrapeError::Auth(format!(
            "token endpoint returned {}: {}",
            status.as_u16(),
            String::from_utf8_lossy(&body)
        )));
    }

    let token: TokenResponse = serde_json::from_slice(&body)
        .map_err(|e| ScrapeError::Auth(format!("malformed token response: {}", e)))?;

    if let Some(expires_in) = token.expires_in {
        tracing::info!("Obtained access token (expires in {}s)", expires_in);
    } else {
        tracing::info!("Obtained access token");
    }

    Ok(Credentials::new(
        credentials.client_id.clone(),
        token.access_token,
    ))
}
