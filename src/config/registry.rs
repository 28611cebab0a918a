//! Provider endpoint registry.
//!
//! The registry is an explicit value constructed at startup and passed to the
//! resolver and refresher; nothing in the crate reads provider metadata from
//! the environment or from globals. OAuth client ids and secrets are injected
//! by the caller, endpoint locations default to each provider's well-known
//! hosts.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::Provider;

/// Google's OAuth token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// Microsoft's OAuth token endpoint (common tenant).
pub const MICROSOFT_TOKEN_URL: &str =
    "https://login.microsoftonline.com/common/oauth2/v2.0/token";
/// Yahoo's OAuth token endpoint.
pub const YAHOO_TOKEN_URL: &str = "https://api.login.yahoo.com/oauth2/get_token";

/// OAuth client identity of this application, one per provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthClient {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
}

impl OAuthClient {
    /// Creates a client identity.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

/// Endpoint metadata for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
    /// IMAP server hostname.
    pub imap_host: String,
    /// IMAP server port.
    pub imap_port: u16,
    /// OAuth token endpoint for refresh exchanges.
    pub token_url: String,
}

impl ProviderEndpoints {
    /// Well-known endpoints for a provider.
    pub fn standard(provider: Provider) -> Self {
        match provider {
            Provider::Google => Self {
                imap_host: "imap.gmail.com".to_string(),
                imap_port: 993,
                token_url: GOOGLE_TOKEN_URL.to_string(),
            },
            Provider::Microsoft => Self {
                imap_host: "outlook.office365.com".to_string(),
                imap_port: 993,
                token_url: MICROSOFT_TOKEN_URL.to_string(),
            },
            Provider::Yahoo => Self {
                imap_host: "imap.mail.yahoo.com".to_string(),
                imap_port: 993,
                token_url: YAHOO_TOKEN_URL.to_string(),
            },
        }
    }
}

/// A registered provider: endpoints plus this application's OAuth client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEntry {
    /// Endpoint metadata.
    pub endpoints: ProviderEndpoints,
    /// OAuth client identity.
    pub oauth: OAuthClient,
}

/// Static mapping from provider to endpoint metadata and client identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderRegistry {
    entries: HashMap<Provider, ProviderEntry>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider with its well-known endpoints.
    pub fn with_provider(mut self, provider: Provider, oauth: OAuthClient) -> Self {
        self.entries.insert(
            provider,
            ProviderEntry {
                endpoints: ProviderEndpoints::standard(provider),
                oauth,
            },
        );
        self
    }

    /// Registers a provider with explicit endpoints.
    pub fn with_entry(mut self, provider: Provider, entry: ProviderEntry) -> Self {
        self.entries.insert(provider, entry);
        self
    }

    /// Looks up a provider's entry.
    pub fn get(&self, provider: Provider) -> Option<&ProviderEntry> {
        self.entries.get(&provider)
    }

    /// Whether the registry knows this provider.
    pub fn contains(&self, provider: Provider) -> bool {
        self.entries.contains_key(&provider)
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whether a hostname belongs to Gmail's infrastructure.
///
/// Used by the sent-folder locator to assume `[Gmail]/Sent Mail` when a
/// listing gave no better answer.
pub fn is_gmail_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host.contains("gmail") || host.contains("googlemail")
}
