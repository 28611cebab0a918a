//! Configuration layer: the explicit provider registry.

mod registry;

pub use registry::{
    is_gmail_host, OAuthClient, ProviderEndpoints, ProviderEntry, ProviderRegistry,
    GOOGLE_TOKEN_URL, MICROSOFT_TOKEN_URL, YAHOO_TOKEN_URL,
};
