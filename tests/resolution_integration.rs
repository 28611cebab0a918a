//! End-to-end resolution and sent-mail discovery against a real sqlite
//! store, with the network-facing collaborators mocked at their traits.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;

use valet::config::{OAuthClient, ProviderRegistry};
use valet::domain::{
    CredentialFragment, EmailConfiguration, MailboxDescriptor, MessageSummary, Provider,
    RefreshedToken, ResolvedCredential, TokenRecord, UserId,
};
use valet::providers::{
    IdentityError, IdentityLookup, MailTransport, OutgoingMessage, RefreshError, TokenRefresher,
    TransportError, TransportResult,
};
use valet::services::{CredentialResolver, ResolveError, SentMailFetcher, SentSource, TokenStore};
use valet::storage::{Database, SqliteTokenStore};

struct StubRefresher {
    calls: AtomicUsize,
    reject: bool,
}

impl StubRefresher {
    fn succeeding() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            reject: false,
        }
    }

    fn rejecting() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            reject: true,
        }
    }
}

#[async_trait]
impl TokenRefresher for StubRefresher {
    async fn refresh(
        &self,
        _provider: Provider,
        _refresh_token: &str,
    ) -> Result<RefreshedToken, RefreshError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reject {
            return Err(RefreshError::Rejected("invalid_grant".to_string()));
        }
        Ok(RefreshedToken {
            access_token: "refreshed-access".to_string(),
            refresh_token: None,
            expires_at: Utc::now() + Duration::hours(1),
        })
    }
}

struct StubIdentity(Option<String>);

#[async_trait]
impl IdentityLookup for StubIdentity {
    async fn profile_email(&self, _user_id: &UserId) -> Result<Option<String>, IdentityError> {
        Ok(self.0.clone())
    }

    async fn claim_email(&self, _user_id: &UserId) -> Result<Option<String>, IdentityError> {
        Ok(None)
    }
}

fn registry() -> ProviderRegistry {
    ProviderRegistry::new()
        .with_provider(Provider::Google, OAuthClient::new("client-id", "client-secret"))
        .with_provider(Provider::Yahoo, OAuthClient::new("y-id", "y-secret"))
}

async fn seeded_store() -> SqliteTokenStore {
    let db = Database::open_in_memory().await.unwrap();
    SqliteTokenStore::new(db)
}

fn google_config(user: &str) -> EmailConfiguration {
    EmailConfiguration {
        user_id: UserId::from(user),
        host: "imap.gmail.com".to_string(),
        port: 993,
        secure: true,
        provider: Some(Provider::Google),
        updated_at: Utc::now(),
    }
}

#[tokio::test]
async fn expired_token_is_refreshed_and_persisted_through_sqlite() {
    let store = seeded_store().await;
    store.upsert_configuration(&google_config("u1")).await.unwrap();
    store
        .upsert_token(&TokenRecord {
            user_id: UserId::from("u1"),
            provider: Provider::Google,
            access_token: "stale-access".to_string(),
            refresh_token: Some("refresh-1".to_string()),
            expires_at: Utc::now() - Duration::minutes(10),
            updated_at: Utc::now() - Duration::hours(2),
        })
        .await
        .unwrap();

    let resolver = CredentialResolver::new(
        store,
        StubRefresher::succeeding(),
        StubIdentity(Some("u1@gmail.com".to_string())),
        registry(),
    );

    let cred = resolver.resolve(&UserId::from("u1"), None).await.unwrap();

    match &cred {
        ResolvedCredential::OAuth { host, user, oauth2, .. } => {
            assert_eq!(host, "imap.gmail.com");
            assert_eq!(user, "u1@gmail.com");
            assert_eq!(oauth2.access_token, "refreshed-access");
            assert_eq!(oauth2.refresh_token, Some("refresh-1".to_string()));
            assert_eq!(oauth2.client_id, "client-id");
        }
        other => panic!("expected oauth credential, got {:?}", other),
    }

    // The refreshed token survives a new lookup against the database.
    let stored = resolver
        .store()
        .get_token(&UserId::from("u1"), Provider::Google)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.access_token, "refreshed-access");
    assert!(stored.expires_at > Utc::now() + Duration::minutes(50));
}

#[tokio::test]
async fn missing_configuration_surfaces_setup_action() {
    let resolver = CredentialResolver::new(
        seeded_store().await,
        StubRefresher::succeeding(),
        StubIdentity(Some("u2@yahoo.com".to_string())),
        registry(),
    );

    let err = resolver
        .resolve(&UserId::from("u2"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::ConfigurationMissing));
    assert_eq!(err.user_action(), Some("set up your email account"));
}

#[tokio::test]
async fn repeated_resolution_with_valid_token_is_stable() {
    let store = seeded_store().await;
    store.upsert_configuration(&google_config("u1")).await.unwrap();
    store
        .upsert_token(&TokenRecord {
            user_id: UserId::from("u1"),
            provider: Provider::Google,
            access_token: "live-access".to_string(),
            refresh_token: Some("refresh-1".to_string()),
            expires_at: Utc::now() + Duration::hours(3),
            updated_at: Utc::now(),
        })
        .await
        .unwrap();

    let resolver = CredentialResolver::new(
        store,
        StubRefresher::rejecting(),
        StubIdentity(Some("u1@gmail.com".to_string())),
        registry(),
    );

    let first = resolver.resolve(&UserId::from("u1"), None).await.unwrap();
    let second = resolver.resolve(&UserId::from("u1"), None).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn explicit_password_fragment_overrides_stored_oauth() {
    let store = seeded_store().await;
    store.upsert_configuration(&google_config("u1")).await.unwrap();
    store
        .upsert_token(&TokenRecord {
            user_id: UserId::from("u1"),
            provider: Provider::Google,
            access_token: "live-access".to_string(),
            refresh_token: None,
            expires_at: Utc::now() + Duration::hours(3),
            updated_at: Utc::now(),
        })
        .await
        .unwrap();

    let resolver = CredentialResolver::new(
        store,
        StubRefresher::rejecting(),
        StubIdentity(Some("u1@gmail.com".to_string())),
        registry(),
    );

    let fragment = CredentialFragment {
        user: Some("override@corp.example.com".to_string()),
        password: Some("app-password".to_string()),
        ..Default::default()
    };
    let cred = resolver
        .resolve(&UserId::from("u1"), Some(fragment))
        .await
        .unwrap();

    match cred {
        ResolvedCredential::Password { user, password, host, .. } => {
            assert_eq!(user, "override@corp.example.com");
            assert_eq!(password, "app-password");
            // Connection still comes from stored configuration.
            assert_eq!(host, "imap.gmail.com");
        }
        other => panic!("expected password credential, got {:?}", other),
    }
}

#[tokio::test]
async fn rejected_refresh_requires_reconnect() {
    let store = seeded_store().await;
    store.upsert_configuration(&google_config("u1")).await.unwrap();
    store
        .upsert_token(&TokenRecord {
            user_id: UserId::from("u1"),
            provider: Provider::Google,
            access_token: "stale".to_string(),
            refresh_token: Some("revoked".to_string()),
            expires_at: Utc::now() - Duration::minutes(1),
            updated_at: Utc::now(),
        })
        .await
        .unwrap();

    let resolver = CredentialResolver::new(
        store,
        StubRefresher::rejecting(),
        StubIdentity(Some("u1@gmail.com".to_string())),
        registry(),
    );

    let err = resolver
        .resolve(&UserId::from("u1"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::CredentialExpired));
    assert_eq!(err.user_action(), Some("reconnect your email account"));
}

struct StubTransport {
    mailboxes: Vec<MailboxDescriptor>,
    messages: Mutex<HashMap<String, Vec<MessageSummary>>>,
}

#[async_trait]
impl MailTransport for StubTransport {
    async fn list_mailboxes(
        &self,
        _credential: &ResolvedCredential,
    ) -> TransportResult<Vec<MailboxDescriptor>> {
        Ok(self.mailboxes.clone())
    }

    async fn fetch_messages(
        &self,
        _credential: &ResolvedCredential,
        mailbox: &str,
        limit: usize,
        _reverse: bool,
    ) -> TransportResult<Vec<MessageSummary>> {
        let messages = self.messages.lock().unwrap();
        messages
            .get(mailbox)
            .map(|m| m.iter().take(limit).cloned().collect())
            .ok_or_else(|| TransportError::MailboxNotFound(mailbox.to_string()))
    }

    async fn send_message(
        &self,
        _credential: &ResolvedCredential,
        _message: &OutgoingMessage,
    ) -> TransportResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn resolved_credential_feeds_sent_mail_discovery() {
    let store = seeded_store().await;
    store.upsert_configuration(&google_config("u1")).await.unwrap();
    store
        .upsert_token(&TokenRecord {
            user_id: UserId::from("u1"),
            provider: Provider::Google,
            access_token: "live".to_string(),
            refresh_token: None,
            expires_at: Utc::now() + Duration::hours(1),
            updated_at: Utc::now(),
        })
        .await
        .unwrap();
    let resolver = CredentialResolver::new(
        store,
        StubRefresher::rejecting(),
        StubIdentity(Some("u1@gmail.com".to_string())),
        registry(),
    );
    let cred = resolver.resolve(&UserId::from("u1"), None).await.unwrap();

    let mut messages = HashMap::new();
    messages.insert(
        "[Gmail]/Sent Mail".to_string(),
        vec![
            MessageSummary {
                from_address: "u1@gmail.com".to_string(),
                subject: Some("older".to_string()),
                date: Utc::now() - Duration::days(2),
            },
            MessageSummary {
                from_address: "u1@gmail.com".to_string(),
                subject: Some("newer".to_string()),
                date: Utc::now() - Duration::hours(1),
            },
        ],
    );
    let transport = StubTransport {
        mailboxes: vec![
            MailboxDescriptor::new("INBOX"),
            MailboxDescriptor::with_special_use("[Gmail]/Sent Mail", "\\Sent"),
        ],
        messages: Mutex::new(messages),
    };

    let fetcher = SentMailFetcher::new(transport);
    let sent = fetcher.fetch_sent(&cred, 10).await;

    assert_eq!(
        sent.source,
        SentSource::Mailbox("[Gmail]/Sent Mail".to_string())
    );
    assert_eq!(sent.messages.len(), 2);
    assert_eq!(sent.messages[0].subject, Some("newer".to_string()));
}

#[tokio::test]
async fn gmail_listing_without_special_use_still_finds_sent_mail() {
    let cred = ResolvedCredential::Password {
        host: "imap.gmail.com".to_string(),
        port: 993,
        secure: true,
        user: "u1@gmail.com".to_string(),
        password: "pw".to_string(),
    };

    let mut messages = HashMap::new();
    messages.insert(
        "[Gmail]/Sent Mail".to_string(),
        vec![MessageSummary {
            from_address: "u1@gmail.com".to_string(),
            subject: None,
            date: Utc::now(),
        }],
    );
    let transport = StubTransport {
        mailboxes: vec![MailboxDescriptor::new("INBOX")],
        messages: Mutex::new(messages),
    };

    let sent = SentMailFetcher::new(transport).fetch_sent(&cred, 10).await;

    assert_eq!(
        sent.source,
        SentSource::Mailbox("[Gmail]/Sent Mail".to_string())
    );
    assert_eq!(sent.messages.len(), 1);
}
