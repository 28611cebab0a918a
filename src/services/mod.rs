//! Application services: credential resolution and sent-mail discovery.

mod locator;
mod resolver;

pub use locator::{
    locate_sent, sent_candidates, SentMail, SentMailFetcher, SentSource, DEFAULT_INBOX_SCAN_LIMIT,
};
pub use resolver::{
    CredentialResolver, ResolveError, ResolveResult, StoreError, StoreResult, TokenStore,
};
