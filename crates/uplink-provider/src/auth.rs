//! OAuth2 client-credentials token management.

use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use uplink_core::{Error, Result};

/// Tokens are refreshed this long before their reported expiry.
const EXPIRY_BUFFER: Duration = Duration::from_secs(60);

const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

/// Credentials and endpoint for the provider's token exchange.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

/// Lazily acquires and caches a bearer token for its validity lifetime.
pub struct TokenManager {
    http: reqwest::Client,
    config: AuthConfig,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenManager {
    pub fn new(http: reqwest::Client, config: AuthConfig) -> Self {
        Self {
            http,
            config,
            cached: Mutex::new(None),
        }
    }

    /// Returns a cached token if still valid, otherwise fetches a new one.
    pub async fn token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(entry) = cached.as_ref()
            && Instant::now() < entry.expires_at
        {
            return Ok(entry.token.clone());
        }

        let fresh = self.fetch().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    /// Drop the cached token so the next call re-authenticates.
    pub async fn invalidate(&self) {
        let mut cached = self.cached.lock().await;
        *cached = None;
    }

    async fn fetch(&self) -> Result<CachedToken> {
        debug!(token_url = %self.config.token_url, "Fetching access token");

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .map_err(|e| Error::Auth(format!("token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Auth(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Auth(format!("token parse error: {e}")))?;

        let expires_in = parsed.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        let lifetime = Duration::from_secs(expires_in).saturating_sub(EXPIRY_BUFFER);

        Ok(CachedToken {
            token: parsed.access_token,
            expires_at: Instant::now() + lifetime,
        })
    }
}
