//! External-facing code: collaborator traits and the OAuth token endpoint
//! client.
//!
//! Everything that talks to, or stands in for, a third-party system lives
//! here. The mail transport and identity sources are consumed through traits;
//! the token refresher is the one piece of HTTP this crate performs itself.

mod oauth;
mod traits;

pub use oauth::{
    xoauth2_b64, xoauth2_string, HttpTokenRefresher, RefreshError, TokenRefresher,
    DEFAULT_REFRESH_TIMEOUT,
};
pub use traits::{
    IdentityError, IdentityLookup, MailTransport, OutgoingMessage, TransportError, TransportResult,
};
