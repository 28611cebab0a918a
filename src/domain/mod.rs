//! Domain layer types for the valet credential core.
//!
//! This module contains the core domain types used throughout the crate:
//! users and providers, stored token records and email configurations, the
//! ephemeral resolved credential, and the mailbox listing shapes consumed by
//! the sent-folder locator.

mod credential;
mod mailbox;
mod token;
mod types;

pub use credential::{
    CredentialFragment, EmailConfiguration, OAuth2Tokens, ResolvedCredential, DEFAULT_IMAP_PORT,
};
pub use mailbox::{MailboxDescriptor, MessageSummary, SPECIAL_USE_SENT};
pub use token::{RefreshedToken, TokenRecord};
pub use types::{Provider, UnknownProvider, UserId};
