use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};

use crate::config::{RefreshPolicy, SessionConfig};
use crate::engine::TokenSource;
use crate::error::{Result, SessionError};

/// Bearer credential for catalog and playback calls
#[derive(Clone, Debug)]
pub struct Credential {
    pub token: String,
    pub obtained_at: DateTime<Utc>,
    /// Lifetime reported by the token endpoint, if it sent one
    pub expires_in: Option<chrono::Duration>,
}

impl Credential {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_in
            .and_then(|lifetime| self.obtained_at.checked_add_signed(lifetime))
    }

    pub fn needs_refresh(&self, policy: RefreshPolicy, now: DateTime<Utc>) -> bool {
        match policy {
            RefreshPolicy::Never => false,
            RefreshPolicy::BeforeExpiry { margin } => {
                let Some(expires_at) = self.expires_at() else {
                    return false;
                };
                let margin = chrono::Duration::from_std(margin).unwrap_or(chrono::Duration::zero());
                expires_at - now < margin
            }
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Deserialize)]
struct TokenErrorBody {
    error: String,
}

/// Acquires client-credentials tokens and holds the current one for the session
pub struct CredentialManager {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    policy: RefreshPolicy,
    credential: RwLock<Option<Credential>>,
    /// Serializes refreshes so concurrent callers share one exchange
    refresh: Mutex<()>,
}

impl CredentialManager {
    pub fn new(http: reqwest::Client, config: &SessionConfig) -> Self {
        Self {
            http,
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            policy: config.refresh,
            credential: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    fn basic_auth_header(&self) -> String {
        let pair = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", general_purpose::STANDARD.encode(pair))
    }

    /// Exchange the client credentials for a fresh bearer token.
    ///
    /// A failed exchange leaves any previously held credential untouched.
    pub async fn acquire(&self) -> Result<Credential> {
        crate::log_api_request!("acquire_token", url = %self.token_url);
        let result = self.exchange().await;
        crate::log_api_result!("acquire_token", result);

        let credential = result?;
        *self.credential.write().await = Some(credential.clone());
        tracing::info!(expires_at = ?credential.expires_at(), "Credential acquired");
        Ok(credential)
    }

    async fn exchange(&self) -> Result<Credential> {
        let resp = self
            .http
            .post(&self.token_url)
            .header(AUTHORIZATION, self.basic_auth_header())
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let status_text = status.canonical_reason().unwrap_or("Unknown Status");
            let detail = resp
                .json::<TokenErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| "no error detail".to_string());
            return Err(SessionError::Auth {
                reason: format!("{} - {}", status_text, detail),
            });
        }

        let body: TokenResponse = resp.json().await?;
        Ok(Credential {
            token: body.access_token,
            obtained_at: Utc::now(),
            expires_in: body.expires_in.and_then(token_lifetime),
        })
    }

    pub async fn current(&self) -> Option<Credential> {
        self.credential.read().await.clone()
    }

    pub async fn bearer(&self) -> Result<String> {
        self.current()
            .await
            .map(|c| c.token)
            .ok_or(SessionError::NoCredential)
    }

    /// Re-acquire when the refresh policy says the held credential is stale.
    ///
    /// Returns `Ok(true)` when a new credential replaced the old one. Without a
    /// held credential nothing happens: first acquisition belongs to the caller.
    pub async fn refresh_if_needed(&self) -> Result<bool> {
        if !self.is_stale().await {
            return Ok(false);
        }

        let _refresh = self.refresh.lock().await;
        // Another caller may have refreshed while we waited
        if !self.is_stale().await {
            return Ok(false);
        }

        tracing::info!("Credential expiring soon, refreshing...");
        self.acquire().await?;
        Ok(true)
    }

    async fn is_stale(&self) -> bool {
        match self.credential.read().await.as_ref() {
            Some(credential) => credential.needs_refresh(self.policy, Utc::now()),
            None => false,
        }
    }
}

/// Token lifetime from the endpoint's `expires_in`, if it is usable
fn token_lifetime(secs: i64) -> Option<chrono::Duration> {
    let lifetime = chrono::TimeDelta::try_seconds(secs).filter(|d| *d > chrono::TimeDelta::zero());
    if lifetime.is_none() {
        tracing::warn!(expires_in = secs, "Ignoring invalid token lifetime");
    }
    lifetime
}

#[async_trait]
impl TokenSource for CredentialManager {
    async fn oauth_token(&self) -> Option<String> {
        self.current().await.map(|c| c.token)
    }
}
