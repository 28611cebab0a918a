//! Credential lifecycle and sent-mailbox discovery for a mail assistant.
//!
//! The crate resolves a user identity into a ready-to-use mail credential,
//! refreshing expired OAuth tokens along the way, and finds where the
//! server keeps sent mail so the assistant can learn the user's writing
//! voice.
//!
//! The main entry points are [`services::CredentialResolver`] for
//! resolution and [`services::SentMailFetcher`] for sent-mail retrieval,
//! wired together with [`storage::SqliteTokenStore`], an
//! [`providers::HttpTokenRefresher`], and a caller-supplied
//! [`config::ProviderRegistry`].

pub mod config;
pub mod domain;
pub mod providers;
pub mod services;
pub mod storage;

pub use config::ProviderRegistry;
pub use domain::{CredentialFragment, Provider, ResolvedCredential, UserId};
pub use services::{CredentialResolver, ResolveError, SentMailFetcher};
pub use storage::{Database, SqliteTokenStore};
