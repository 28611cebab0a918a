//! OAuth token refresh over HTTP.
//!
//! [`HttpTokenRefresher`] performs the provider-specific refresh-token
//! exchange against the registry's token endpoint. It never retries: a
//! rejected grant is final until the user re-consents, and retry policy for
//! transient failures belongs to the caller.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::config::ProviderRegistry;
use crate::domain::{Provider, RefreshedToken};

/// Default bound on the refresh round trip.
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(30);

/// Seconds shaved off the provider's `expires_in` so tokens are refreshed
/// slightly before the real deadline.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Errors from the refresh-token exchange.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    /// The provider reported the grant invalid; do not retry, the user must
    /// re-consent.
    #[error("refresh rejected by provider: {0}")]
    Rejected(String),

    /// Network, timeout, or server-side failure; safe to retry at the
    /// caller's discretion.
    #[error("provider unreachable: {0}")]
    Unreachable(String),

    /// The provider has no registry entry.
    #[error("provider not registered: {0}")]
    Unconfigured(Provider),
}

/// Performs the refresh-token exchange for a provider.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Exchanges a refresh token for a new access token.
    async fn refresh(
        &self,
        provider: Provider,
        refresh_token: &str,
    ) -> Result<RefreshedToken, RefreshError>;
}

/// Wire shape of a token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    refresh_token: Option<String>,
    #[allow(dead_code)]
    token_type: Option<String>,
}

/// HTTP implementation of [`TokenRefresher`] backed by reqwest.
pub struct HttpTokenRefresher {
    client: reqwest::Client,
    registry: ProviderRegistry,
}

impl HttpTokenRefresher {
    /// Creates a refresher with the default timeout.
    pub fn new(registry: ProviderRegistry) -> Self {
        Self::with_timeout(registry, DEFAULT_REFRESH_TIMEOUT)
    }

    /// Creates a refresher with a caller-supplied timeout bound.
    ///
    /// A timed-out exchange surfaces as [`RefreshError::Unreachable`].
    pub fn with_timeout(registry: ProviderRegistry, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { client, registry }
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(
        &self,
        provider: Provider,
        refresh_token: &str,
    ) -> Result<RefreshedToken, RefreshError> {
        let entry = self
            .registry
            .get(provider)
            .ok_or(RefreshError::Unconfigured(provider))?;

        let params = [
            ("client_id", entry.oauth.client_id.as_str()),
            ("client_secret", entry.oauth.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(&entry.endpoints.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| RefreshError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%provider, %status, "token refresh failed");
            return Err(classify_failure(status.as_u16(), body));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| RefreshError::Unreachable(format!("parse token response: {}", e)))?;

        tracing::debug!(%provider, expires_in = token.expires_in, "token refreshed");

        Ok(RefreshedToken {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: expires_at_from(Utc::now(), token.expires_in),
        })
    }
}

/// Maps a non-success token endpoint response to a refresh error.
///
/// 4xx means the grant itself was refused (`invalid_grant` lands here);
/// 5xx means the provider had a bad day and the exchange may be retried.
fn classify_failure(status: u16, body: String) -> RefreshError {
    if (400..500).contains(&status) {
        RefreshError::Rejected(format!("{}: {}", status, body))
    } else {
        RefreshError::Unreachable(format!("{}: {}", status, body))
    }
}

/// Computes the absolute expiry for a token lifetime, applying the skew.
fn expires_at_from(now: DateTime<Utc>, expires_in_secs: i64) -> DateTime<Utc> {
    let effective = (expires_in_secs - EXPIRY_SKEW_SECS).max(0);
    now + chrono::Duration::seconds(effective)
}

/// Builds the XOAUTH2 SASL string for IMAP authentication.
///
/// Format: `user={email}\x01auth=Bearer {token}\x01\x01`.
pub fn xoauth2_string(user: &str, access_token: &str) -> String {
    format!("user={}\x01auth=Bearer {}\x01\x01", user, access_token)
}

/// Base64-encoded form of the XOAUTH2 string, as sent on the wire.
pub fn xoauth2_b64(user: &str, access_token: &str) -> String {
    BASE64.encode(xoauth2_string(user, access_token))
}
