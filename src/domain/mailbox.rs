//! Mailbox listing and message summary types.
//!
//! These are the ephemeral shapes the transport collaborator reports and the
//! mailbox locator consumes. They live for one request only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// RFC 6154 special-use marker for a sent folder.
pub const SPECIAL_USE_SENT: &str = "\\Sent";

/// One entry from the transport's mailbox listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailboxDescriptor {
    /// Full mailbox path as reported by the server.
    pub path: String,
    /// RFC 6154 special-use attribute, e.g. `\Sent`, when the server tags one.
    #[serde(rename = "specialUse")]
    pub special_use: Option<String>,
}

impl MailboxDescriptor {
    /// A plain mailbox with no special-use marker.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            special_use: None,
        }
    }

    /// A mailbox carrying a special-use attribute.
    pub fn with_special_use(path: impl Into<String>, special_use: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            special_use: Some(special_use.into()),
        }
    }

    /// Whether the server tagged this mailbox as the sent folder.
    pub fn is_sent(&self) -> bool {
        self.special_use
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(SPECIAL_USE_SENT))
    }
}

/// Minimal message shape the locator sorts and filters.
///
/// Full message parsing belongs to the transport collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSummary {
    /// Sender address.
    pub from_address: String,
    /// Message subject, if any.
    pub subject: Option<String>,
    /// Message date.
    pub date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn special_use_sent_detection() {
        let sent = MailboxDescriptor::with_special_use("[Gmail]/Sent Mail", "\\Sent");
        assert!(sent.is_sent());

        let trash = MailboxDescriptor::with_special_use("Trash", "\\Trash");
        assert!(!trash.is_sent());

        let plain = MailboxDescriptor::new("INBOX");
        assert!(!plain.is_sent());
    }

    #[test]
    fn special_use_match_is_case_insensitive() {
        let sent = MailboxDescriptor::with_special_use("Sent", "\\sent");
        assert!(sent.is_sent());
    }

    #[test]
    fn descriptor_serde_field_name() {
        let d = MailboxDescriptor::with_special_use("Sent", "\\Sent");
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains("specialUse"));
    }
}
