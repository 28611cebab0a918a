//! Sent-mailbox discovery.
//!
//! IMAP servers disagree about where sent mail lives: some tag the folder
//! with the RFC 6154 `\Sent` attribute, some only expose a localized name,
//! and Gmail hides it under `[Gmail]/Sent Mail`. The locator layers these
//! signals and, when every mailbox route fails, falls back to scanning the
//! inbox for messages the user sent to themselves. Discovery never
//! hard-fails; the worst outcome is an empty listing.

use crate::config::is_gmail_host;
use crate::domain::{MailboxDescriptor, MessageSummary, ResolvedCredential};
use crate::providers::{MailTransport, TransportError};

/// Sent-folder names observed in the wild, best first.
///
/// Compared case-insensitively against full paths and last path segments.
const SENT_NAME_PATTERNS: &[&str] = &[
    "sent",
    "sent items",
    "sent mail",
    "sent messages",
    "envoy\u{e9}s",
    "\u{e9}l\u{e9}ments envoy\u{e9}s",
    "enviados",
    "elementos enviados",
    "gesendet",
    "gesendete elemente",
];

/// Gmail's fixed sent-folder path.
const GMAIL_SENT_PATH: &str = "[Gmail]/Sent Mail";

/// Paths worth trying blind when the mailbox listing itself is unavailable.
const BARE_SENT_GUESSES: &[&str] = &["SENT", "Sent", "Sent Items"];

/// Default number of inbox messages scanned during the sender-filter
/// fallback.
pub const DEFAULT_INBOX_SCAN_LIMIT: usize = 200;

/// Where a sent-mail listing actually came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentSource {
    /// Messages read from a sent mailbox at this path.
    Mailbox(String),
    /// Messages filtered out of the inbox by sender address.
    InboxFiltered,
}

/// Result of a sent-mail fetch: the messages plus where they were found.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMail {
    /// Message summaries, newest first.
    pub messages: Vec<MessageSummary>,
    /// Which discovery route produced them.
    pub source: SentSource,
}

/// Picks the best-guess sent folder for a mailbox listing.
///
/// A server-reported `\Sent` special-use attribute always wins; name
/// patterns, the Gmail default, and finally bare path guesses apply when no
/// mailbox is tagged. Always produces an answer, even for an empty listing.
pub fn locate_sent(mailboxes: &[MailboxDescriptor], host: &str) -> String {
    sent_candidates(mailboxes, host)
        .into_iter()
        .next()
        .unwrap_or_else(|| "INBOX".to_string())
}

/// All plausible sent-folder paths, best first, deduplicated.
///
/// Later candidates are fallbacks for when an earlier one cannot be opened
/// or turns out to be empty. The bare guesses at the tail make the list
/// non-empty even when the listing itself is.
pub fn sent_candidates(mailboxes: &[MailboxDescriptor], host: &str) -> Vec<String> {
    let mut candidates = Vec::new();

    for mailbox in mailboxes {
        if mailbox.is_sent() {
            candidates.push(mailbox.path.clone());
        }
    }

    for pattern in SENT_NAME_PATTERNS {
        for mailbox in mailboxes {
            if name_matches(&mailbox.path, pattern) {
                candidates.push(mailbox.path.clone());
            }
        }
    }

    // Gmail always has this folder even when the listing obscures it.
    if is_gmail_host(host) {
        candidates.push(GMAIL_SENT_PATH.to_string());
    }

    for guess in BARE_SENT_GUESSES {
        candidates.push(guess.to_string());
    }

    dedupe_preserving_order(candidates)
}

/// Whether a mailbox path matches a sent-folder name pattern.
///
/// Matches the full path or its last segment, with both `/` and `.` accepted
/// as hierarchy delimiters.
fn name_matches(path: &str, pattern: &str) -> bool {
    if ci_eq(path, pattern) {
        return true;
    }
    let last = path.rsplit(['/', '.']).next().unwrap_or(path);
    ci_eq(last, pattern)
}

/// Case-insensitive comparison that also folds non-ASCII letters, so
/// `ENVIADOS` matches `enviados` and `Envoyés` matches `envoyés`.
fn ci_eq(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn dedupe_preserving_order(paths: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    paths
        .into_iter()
        .filter(|p| seen.insert(p.to_lowercase()))
        .collect()
}

/// Fetches sent mail through layered discovery over a [`MailTransport`].
pub struct SentMailFetcher<T: MailTransport> {
    transport: T,
    inbox_scan_limit: usize,
}

impl<T: MailTransport> SentMailFetcher<T> {
    /// Creates a fetcher with the default inbox scan limit.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            inbox_scan_limit: DEFAULT_INBOX_SCAN_LIMIT,
        }
    }

    /// Overrides how deep the inbox sender-filter fallback scans.
    pub fn with_inbox_scan_limit(mut self, limit: usize) -> Self {
        self.inbox_scan_limit = limit;
        self
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetches up to `limit` of the user's most recent sent messages.
    ///
    /// Tries every sent-folder candidate in order, then the inbox sender
    /// filter. Transport failures and empty candidates along the way are
    /// logged and absorbed; this method does not fail. The final listing is
    /// sorted newest-first and truncated regardless of which route produced
    /// it, since the inbox fallback over-fetches and mailbox ordering is not
    /// guaranteed by every server.
    pub async fn fetch_sent(
        &self,
        credential: &ResolvedCredential,
        limit: usize,
    ) -> SentMail {
        let candidates = match self.transport.list_mailboxes(credential).await {
            Ok(mailboxes) => sent_candidates(&mailboxes, credential.host()),
            Err(e) => {
                tracing::debug!(error = %e, "mailbox listing failed; falling back to bare path guesses");
                sent_candidates(&[], credential.host())
            }
        };

        for path in &candidates {
            match self.transport.fetch_messages(credential, path, limit, true).await {
                Ok(messages) if messages.is_empty() => {
                    tracing::debug!(mailbox = %path, "sent candidate is empty");
                }
                Ok(mut messages) => {
                    sort_and_truncate(&mut messages, limit);
                    tracing::debug!(mailbox = %path, count = messages.len(), "sent mail located");
                    return SentMail {
                        messages,
                        source: SentSource::Mailbox(path.clone()),
                    };
                }
                Err(TransportError::MailboxNotFound(_)) => {
                    tracing::debug!(mailbox = %path, "sent candidate does not exist");
                }
                Err(e) => {
                    tracing::debug!(mailbox = %path, error = %e, "sent candidate fetch failed");
                }
            }
        }

        self.fetch_from_inbox(credential, limit).await
    }

    /// Last-resort route: scan recent inbox messages and keep the ones the
    /// user sent (self-addressed copies and list echoes).
    async fn fetch_from_inbox(
        &self,
        credential: &ResolvedCredential,
        limit: usize,
    ) -> SentMail {
        let user = credential.user().to_lowercase();
        let mut messages = match self
            .transport
            .fetch_messages(credential, "INBOX", self.inbox_scan_limit, true)
            .await
        {
            Ok(messages) => messages
                .into_iter()
                .filter(|m| m.from_address.to_lowercase().contains(&user))
                .collect(),
            Err(e) => {
                tracing::debug!(error = %e, "inbox fallback failed; returning empty listing");
                Vec::new()
            }
        };

        sort_and_truncate(&mut messages, limit);
        SentMail {
            messages,
            source: SentSource::InboxFiltered,
        }
    }
}

fn sort_and_truncate(messages: &mut Vec<MessageSummary>, limit: usize) {
    messages.sort_by(|a, b| b.date.cmp(&a.date));
    messages.truncate(limit);
}
