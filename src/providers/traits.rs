//! External collaborator interfaces.
//!
//! The IMAP transport, profile store, and identity-provider claims are
//! outside this crate; they are consumed through the traits defined here.
//! Provider error strings such as `invalid_grant` are classified into typed
//! errors at this boundary so core logic never string-matches.

use async_trait::async_trait;

use crate::domain::{MailboxDescriptor, MessageSummary, ResolvedCredential, UserId};

/// Result type for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Errors surfaced by the mail transport collaborator.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The server rejected the credential (expired or revoked grant).
    #[error("credential rejected by server: {0}")]
    AuthRejected(String),

    /// Network or connection failure.
    #[error("connection error: {0}")]
    Connection(String),

    /// The requested mailbox does not exist.
    #[error("mailbox not found: {0}")]
    MailboxNotFound(String),

    /// Any other protocol-level failure.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl TransportError {
    /// Classifies a raw provider error message into a typed error.
    ///
    /// Google and Microsoft report revoked or expired grants with
    /// `invalid_grant` / `Invalid Credentials` strings; this adapter is the
    /// single place that knowledge lives.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_ascii_lowercase();
        if lower.contains("invalid_grant")
            || lower.contains("invalid credentials")
            || lower.contains("authenticationfailed")
        {
            TransportError::AuthRejected(message)
        } else {
            TransportError::Protocol(message)
        }
    }

    /// Whether this error means the caller must re-consent.
    pub fn is_credential_rejection(&self) -> bool {
        matches!(self, TransportError::AuthRejected(_))
    }
}

/// An email to hand to the transport for sending.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    /// Recipient addresses.
    pub to: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub body: String,
}

/// The IMAP/SMTP transport collaborator.
///
/// Implementations own connection management and message parsing; this crate
/// only hands them resolved credentials and consumes their listings.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Lists all mailboxes visible to the credential.
    async fn list_mailboxes(
        &self,
        credential: &ResolvedCredential,
    ) -> TransportResult<Vec<MailboxDescriptor>>;

    /// Fetches up to `limit` message summaries from a mailbox.
    ///
    /// With `reverse` set, the newest messages come first.
    async fn fetch_messages(
        &self,
        credential: &ResolvedCredential,
        mailbox: &str,
        limit: usize,
        reverse: bool,
    ) -> TransportResult<Vec<MessageSummary>>;

    /// Sends an email on the user's behalf.
    async fn send_message(
        &self,
        credential: &ResolvedCredential,
        message: &OutgoingMessage,
    ) -> TransportResult<()>;
}

/// Error from the profile store or identity provider.
#[derive(Debug, thiserror::Error)]
#[error("identity lookup failed: {0}")]
pub struct IdentityError(pub String);

/// Sources for a user's own email address.
///
/// The profile store is authoritative; the identity provider's claim is the
/// fallback when the profile lacks an address.
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    /// The email address stored in the user's profile, if any.
    async fn profile_email(&self, user_id: &UserId)
        -> std::result::Result<Option<String>, IdentityError>;

    /// The email claim from the identity provider's session, if any.
    async fn claim_email(&self, user_id: &UserId)
        -> std::result::Result<Option<String>, IdentityError>;
}
