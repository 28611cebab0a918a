//! Core identifier types for domain entities.
//!
//! These newtype wrappers provide type safety for entity identifiers,
//! preventing accidental mixing of different ID types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque identifier for an end user of the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Identity provider that issued a user's delegated credentials.
///
/// Each provider has its own token endpoint and IMAP entry point, looked up
/// through the [`ProviderRegistry`](crate::config::ProviderRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Google (Gmail, Google Calendar).
    Google,
    /// Microsoft (Outlook / Office 365).
    Microsoft,
    /// Yahoo Mail.
    Yahoo,
}

impl Provider {
    /// Stable lowercase name used in storage and wire payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Microsoft => "microsoft",
            Provider::Yahoo => "yahoo",
        }
    }

    /// All known providers.
    pub fn all() -> [Provider; 3] {
        [Provider::Google, Provider::Microsoft, Provider::Yahoo]
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown provider name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "google" | "gmail" => Ok(Provider::Google),
            "microsoft" | "outlook" => Ok(Provider::Microsoft),
            "yahoo" => Ok(Provider::Yahoo),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}
