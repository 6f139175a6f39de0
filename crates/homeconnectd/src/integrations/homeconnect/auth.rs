//! OAuth2 access tokens via the refresh-token grant.

use std::time::Duration;

use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use tracing::info;

use super::client::ApiError;

/// Tokens are refreshed this long before they expire
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    /// Some grants rotate the refresh token
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    refresh_at: Instant,
}

#[derive(Debug)]
struct TokenState {
    refresh_token: String,
    cached: Option<CachedToken>,
}

/// Hands out access tokens, refreshing them on demand
pub struct TokenManager {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    state: Mutex<TokenState>,
}

impl TokenManager {
    pub fn new(
        http: reqwest::Client,
        token_url: String,
        client_id: String,
        client_secret: String,
        refresh_token: String,
    ) -> Self {
        Self {
            http,
            token_url,
            client_id,
            client_secret,
            state: Mutex::new(TokenState {
                refresh_token,
                cached: None,
            }),
        }
    }

    /// A valid access token, refreshing if the cached one is missing or about to expire
    pub async fn access_token(&self) -> Result<String, ApiError> {
        let mut state = self.state.lock().await;
        if let Some(cached) = &state.cached {
            if Instant::now() < cached.refresh_at {
                return Ok(cached.access_token.clone());
            }
        }

        debug!("Refreshing Home Connect access token");
        let response = self.refresh(&state.refresh_token).await?;
        if let Some(rotated) = &response.refresh_token {
            state.refresh_token = rotated.clone();
        }
        let cached = cache_token(&response, Instant::now());
        let token = cached.access_token.clone();
        state.cached = Some(cached);
        info!("Obtained Home Connect access token");
        Ok(token)
    }

    /// Forget the cached token, e.g. after the API rejected it
    pub async fn invalidate(&self) {
        self.state.lock().await.cached = None;
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, ApiError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response = self.http.post(&self.token_url).form(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Auth(format!("{}: {}", status.as_u16(), body)));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn cache_token(response: &TokenResponse, now: Instant) -> CachedToken {
    let lifetime = Duration::from_secs(response.expires_in.unwrap_or(0));
    CachedToken {
        access_token: response.access_token.clone(),
        refresh_at: now + lifetime.saturating_sub(EXPIRY_MARGIN),
    }
}
