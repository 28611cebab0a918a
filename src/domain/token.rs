//! OAuth token record types.
//!
//! A [`TokenRecord`] is the durable form of a user's delegated OAuth grant,
//! one live record per `(user_id, provider)` pair. Records are created on the
//! first successful OAuth exchange and mutated in place on every refresh;
//! they are never deleted automatically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Provider, UserId};

/// A stored OAuth token for one `(user, provider)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Owner of the grant.
    pub user_id: UserId,
    /// Provider that issued the tokens.
    pub provider: Provider,
    /// Short-lived bearer token.
    pub access_token: String,
    /// Long-lived refresh token, absent when the provider withheld one.
    pub refresh_token: Option<String>,
    /// Absolute expiry of the access token.
    pub expires_at: DateTime<Utc>,
    /// Last write time (creation or refresh).
    pub updated_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Whether the access token has expired as of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Result of a successful refresh-token exchange.
///
/// `refresh_token` is `None` when the provider did not rotate the refresh
/// token; the caller reuses the previous one when persisting.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshedToken {
    /// The new access token.
    pub access_token: String,
    /// A rotated refresh token, if the provider issued one.
    pub refresh_token: Option<String>,
    /// Absolute expiry of the new access token.
    pub expires_at: DateTime<Utc>,
}
