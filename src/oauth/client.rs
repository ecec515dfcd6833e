//! Authenticated HTTP client with a cached client-credentials token.

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::BackendConfig;
use crate::lifecycle::LifecycleContext;

/// Tokens are refreshed this long before they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(10);

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(300);

/// Errors raised while building the client or fetching a token.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("token request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("token endpoint returned status {0}")]
    Status(u16),

    #[error("token request cancelled")]
    Cancelled,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_at: Instant,
}

#[derive(Debug, Clone)]
struct ClientSettings {
    timeout: Duration,
    max_idle_per_host: usize,
}

impl ClientSettings {
    fn build(&self) -> Result<reqwest::Client, AuthError> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .pool_max_idle_per_host(self.max_idle_per_host)
            .build()
            .map_err(AuthError::Build)
    }
}

/// HTTP client pre-configured for OAuth2 client-credentials auth against
/// the backend.
pub struct AuthClient {
    http: ArcSwap<reqwest::Client>,
    settings: ClientSettings,
    client_id: String,
    client_secret: String,
    token_endpoint: String,
    token: Mutex<Option<CachedToken>>,
    ctx: LifecycleContext,
}

impl AuthClient {
    /// Create a client bound to `ctx`; token requests abort once it is
    /// cancelled.
    pub fn new(config: &BackendConfig, ctx: LifecycleContext) -> Result<Self, AuthError> {
        let settings = ClientSettings {
            timeout: config.request_timeout,
            max_idle_per_host: config.max_idle_conns_per_host,
        };
        let http = settings.build()?;

        Ok(Self {
            http: ArcSwap::from_pointee(http),
            settings,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            token_endpoint: config.token_endpoint.clone(),
            token: Mutex::new(None),
            ctx,
        })
    }

    /// The current pooled HTTP client.
    pub fn http(&self) -> Arc<reqwest::Client> {
        self.http.load_full()
    }

    /// Return a valid access token, fetching a new one when needed.
    pub async fn bearer_token(&self) -> Result<String, AuthError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        let fresh = tokio::select! {
            result = self.fetch_token() => result?,
            _ = self.ctx.cancelled() => return Err(AuthError::Cancelled),
        };
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    /// Drop the cached token so the next call fetches a new one.
    pub async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    async fn fetch_token(&self) -> Result<CachedToken, AuthError> {
        let response = self
            .http()
            .post(&self.token_endpoint)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(AuthError::Request)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, endpoint = %self.token_endpoint, "Token request rejected");
            return Err(AuthError::Status(status.as_u16()));
        }

        let body: TokenResponse = response.json().await.map_err(AuthError::Request)?;
        let lifetime = body
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);

        tracing::debug!(expires_in = ?lifetime, "Fetched access token");
        Ok(CachedToken {
            value: body.access_token,
            refresh_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
        })
    }

    /// Release idle pooled connections.
    ///
    /// The pooled client is replaced by a fresh one; requests still holding
    /// the old client finish normally and its pool is dropped with them.
    pub fn close_idle_connections(&self) {
        match self.settings.build() {
            Ok(fresh) => {
                self.http.store(Arc::new(fresh));
                tracing::debug!("Closed idle backend connections");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to rebuild HTTP client, idle connections kept");
            }
        }
    }
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("token_endpoint", &self.token_endpoint)
            .field("client_id", &self.client_id)
            .field("timeout", &self.settings.timeout)
            .finish()
    }
}

/// Closes the client's idle connections when dropped.
///
/// Held for the duration of `Commander::start`, so release happens on every
/// exit path, early failures included.
#[derive(Debug)]
pub struct IdleConnectionGuard {
    client: Arc<AuthClient>,
}

impl IdleConnectionGuard {
    pub fn new(client: Arc<AuthClient>) -> Self {
        Self { client }
    }
}

impl Drop for IdleConnectionGuard {
    fn drop(&mut self) {
        self.client.close_idle_connections();
    }
}
