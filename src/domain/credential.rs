//! Credential domain types.
//!
//! [`ResolvedCredential`] is the ephemeral output of credential resolution:
//! a connection target plus exactly one authentication method, ready to hand
//! to the mail or calendar transport. It is owned by the request that created
//! it and must never be cached across requests, because tokens mutate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Provider, UserId};

/// Default IMAP port when an explicit fragment omits one.
pub const DEFAULT_IMAP_PORT: u16 = 993;

/// A user's stored mail server configuration, one row per user.
///
/// `provider`, when set, must match a registry entry and determines whether
/// OAuth or password auth applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailConfiguration {
    /// Owner of this configuration.
    pub user_id: UserId,
    /// IMAP server hostname.
    pub host: String,
    /// IMAP server port.
    pub port: u16,
    /// Whether to use implicit TLS.
    pub secure: bool,
    /// Identity provider, if this account uses OAuth.
    pub provider: Option<Provider>,
    /// Last write time.
    pub updated_at: DateTime<Utc>,
}

/// An explicit per-request credential override.
///
/// Every field is optional; present fields win over stored state during
/// resolution. A fragment is considered to carry its own connection target
/// when `host` is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialFragment {
    /// Explicit IMAP host.
    pub host: Option<String>,
    /// Explicit IMAP port (defaults to 993 with an explicit host).
    pub port: Option<u16>,
    /// Explicit TLS flag (defaults to true with an explicit host).
    pub secure: Option<bool>,
    /// Explicit provider.
    pub provider: Option<Provider>,
    /// Explicit login email address.
    pub user: Option<String>,
    /// Explicit password; always wins over stored OAuth state.
    pub password: Option<String>,
}

impl CredentialFragment {
    /// Whether this fragment specifies its own connection target.
    pub fn has_connection(&self) -> bool {
        self.host.is_some()
    }
}

/// OAuth bearer material inside a resolved credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuth2Tokens {
    /// Bearer access token.
    pub access_token: String,
    /// Refresh token, passed along so the transport can surface it on revoke.
    pub refresh_token: Option<String>,
    /// Absolute expiry of the access token.
    pub expires: DateTime<Utc>,
    /// OAuth client id of this application.
    pub client_id: String,
    /// OAuth client secret of this application.
    pub client_secret: String,
}

/// A ready-to-use credential: connection target plus exactly one auth method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "auth", rename_all = "lowercase")]
pub enum ResolvedCredential {
    /// Password (or app-password) authentication.
    Password {
        /// IMAP server hostname.
        host: String,
        /// IMAP server port.
        port: u16,
        /// Whether to use implicit TLS.
        secure: bool,
        /// Login email address.
        user: String,
        /// The password.
        password: String,
    },
    /// OAuth2 bearer authentication.
    OAuth {
        /// IMAP server hostname.
        host: String,
        /// IMAP server port.
        port: u16,
        /// Whether to use implicit TLS.
        secure: bool,
        /// Login email address.
        user: String,
        /// Bearer token material.
        oauth2: OAuth2Tokens,
    },
}

impl ResolvedCredential {
    /// The IMAP host this credential targets.
    pub fn host(&self) -> &str {
        match self {
            ResolvedCredential::Password { host, .. } => host,
            ResolvedCredential::OAuth { host, .. } => host,
        }
    }

    /// The login email address.
    pub fn user(&self) -> &str {
        match self {
            ResolvedCredential::Password { user, .. } => user,
            ResolvedCredential::OAuth { user, .. } => user,
        }
    }

    /// Whether this is the OAuth variant.
    pub fn is_oauth(&self) -> bool {
        matches!(self, ResolvedCredential::OAuth { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_connection_requires_host() {
        let mut fragment = CredentialFragment {
            password: Some("x".to_string()),
            ..Default::default()
        };
        assert!(!fragment.has_connection());

        fragment.host = Some("imap.example.com".to_string());
        assert!(fragment.has_connection());
    }

    #[test]
    fn password_variant_accessors() {
        let cred = ResolvedCredential::Password {
            host: "imap.example.com".to_string(),
            port: 993,
            secure: true,
            user: "a@example.com".to_string(),
            password: "secret".to_string(),
        };
        assert_eq!(cred.host(), "imap.example.com");
        assert_eq!(cred.user(), "a@example.com");
        assert!(!cred.is_oauth());
    }

    #[test]
    fn credential_serialization_tags_auth() {
        let cred = ResolvedCredential::OAuth {
            host: "imap.gmail.com".to_string(),
            port: 993,
            secure: true,
            user: "a@gmail.com".to_string(),
            oauth2: OAuth2Tokens {
                access_token: "at".to_string(),
                refresh_token: Some("rt".to_string()),
                expires: Utc::now(),
                client_id: "cid".to_string(),
                client_secret: "cs".to_string(),
            },
        };

        let json = serde_json::to_string(&cred).unwrap();
        assert!(json.contains("\"auth\":\"oauth\""));

        let back: ResolvedCredential = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cred);
    }
}
