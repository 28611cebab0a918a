//! Credential resolution service.
//!
//! Turns a user identity plus an optional explicit credential fragment into
//! a ready-to-use [`ResolvedCredential`], refreshing expired OAuth tokens on
//! the way. The priority order is load-bearing: an explicit password always
//! overrides stale OAuth state, and a refresh is attempted exactly once per
//! resolution so a revoked grant is never hammered in a loop.

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use crate::config::ProviderRegistry;
use crate::domain::{
    CredentialFragment, EmailConfiguration, OAuth2Tokens, Provider, ResolvedCredential,
    TokenRecord, UserId, DEFAULT_IMAP_PORT,
};
use crate::providers::{IdentityError, IdentityLookup, RefreshError, TokenRefresher};

/// Error from the durable token store.
#[derive(Debug, Error)]
#[error("token store error: {0}")]
pub struct StoreError(pub String);

/// Result type for token store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Durable storage of token records and email configurations.
///
/// `upsert_token` must be atomic on `(user_id, provider)`: concurrent
/// refreshes settle last-write-wins with no partial writes visible.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Gets the token record for `(user, provider)`.
    async fn get_token(
        &self,
        user_id: &UserId,
        provider: Provider,
    ) -> StoreResult<Option<TokenRecord>>;

    /// Inserts or replaces the token record for its `(user, provider)` pair.
    async fn upsert_token(&self, record: &TokenRecord) -> StoreResult<()>;

    /// Gets a user's email configuration.
    async fn get_configuration(&self, user_id: &UserId)
        -> StoreResult<Option<EmailConfiguration>>;

    /// Inserts or replaces a user's email configuration.
    async fn upsert_configuration(&self, config: &EmailConfiguration) -> StoreResult<()>;
}

/// Errors that can occur during credential resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No stored configuration and no explicit host; user-fixable via setup.
    #[error("no email configuration found")]
    ConfigurationMissing,

    /// No email address resolvable from fragment, profile, or claims.
    #[error("no email address could be determined for this user")]
    IdentityMissing,

    /// Neither a password nor a usable OAuth token exists.
    #[error("no stored credential for this account")]
    CredentialMissing,

    /// Refresh impossible or rejected; the user must re-consent.
    #[error("stored credential has expired")]
    CredentialExpired,

    /// Transient provider failure; safe to retry at caller discretion.
    #[error("provider unreachable: {0}")]
    ProviderUnreachable(String),

    /// Token store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Profile or identity-provider lookup failure.
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

impl ResolveError {
    /// User-facing call-to-action for this failure, when one exists.
    ///
    /// Expired or rejected credentials get an explicit prompt rather than a
    /// generic error: silent retries against a revoked grant waste a request
    /// cycle with no chance of success.
    pub fn user_action(&self) -> Option<&'static str> {
        match self {
            ResolveError::ConfigurationMissing => Some("set up your email account"),
            ResolveError::IdentityMissing => Some("add an email address to your profile"),
            ResolveError::CredentialMissing => Some("connect your email account"),
            ResolveError::CredentialExpired => Some("reconnect your email account"),
            _ => None,
        }
    }

    /// Whether retrying the same resolution could succeed without user
    /// intervention.
    pub fn is_transient(&self) -> bool {
        matches!(self, ResolveError::ProviderUnreachable(_))
    }
}

/// Result type for resolution.
pub type ResolveResult<T> = std::result::Result<T, ResolveError>;

/// Resolves user identities into ready-to-use credentials.
///
/// Generic over its three seams: the durable [`TokenStore`], the
/// [`TokenRefresher`], and the [`IdentityLookup`] collaborator. The provider
/// registry is an explicit constructor-injected value.
pub struct CredentialResolver<S, R, I>
where
    S: TokenStore,
    R: TokenRefresher,
    I: IdentityLookup,
{
    store: S,
    refresher: R,
    identity: I,
    registry: ProviderRegistry,
}

impl<S, R, I> CredentialResolver<S, R, I>
where
    S: TokenStore,
    R: TokenRefresher,
    I: IdentityLookup,
{
    /// Creates a new resolver.
    pub fn new(store: S, refresher: R, identity: I, registry: ProviderRegistry) -> Self {
        Self {
            store,
            refresher,
            identity,
            registry,
        }
    }

    /// The underlying token store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolves a credential for `user_id`, honoring the explicit fragment.
    ///
    /// The returned credential is owned by the current request and must not
    /// be cached across requests.
    pub async fn resolve(
        &self,
        user_id: &UserId,
        fragment: Option<CredentialFragment>,
    ) -> ResolveResult<ResolvedCredential> {
        let fragment = fragment.unwrap_or_default();

        // Connection target: a fragment carrying its own host wins wholesale,
        // otherwise the stored configuration applies.
        let (host, port, secure, provider) = if fragment.has_connection() {
            (
                fragment.host.clone().unwrap_or_default(),
                fragment.port.unwrap_or(DEFAULT_IMAP_PORT),
                fragment.secure.unwrap_or(true),
                fragment.provider,
            )
        } else {
            let config = self
                .store
                .get_configuration(user_id)
                .await?
                .ok_or(ResolveError::ConfigurationMissing)?;
            (
                config.host,
                config.port,
                config.secure,
                fragment.provider.or(config.provider),
            )
        };

        let user = self.resolve_user_email(user_id, &fragment).await?;

        // Explicit password is the manual override escape hatch; it beats
        // any stored OAuth state, stale or fresh.
        if let Some(password) = fragment.password {
            tracing::debug!(%user_id, "resolved password credential from explicit fragment");
            return Ok(ResolvedCredential::Password {
                host,
                port,
                secure,
                user,
                password,
            });
        }

        let provider = provider.ok_or(ResolveError::CredentialMissing)?;
        let entry = self
            .registry
            .get(provider)
            .ok_or(ResolveError::ConfigurationMissing)?;
        let (client_id, client_secret) = (
            entry.oauth.client_id.clone(),
            entry.oauth.client_secret.clone(),
        );

        let record = self
            .store
            .get_token(user_id, provider)
            .await?
            .ok_or(ResolveError::CredentialMissing)?;

        let now = Utc::now();
        let oauth2 = if !record.is_expired(now) {
            OAuth2Tokens {
                access_token: record.access_token,
                refresh_token: record.refresh_token,
                expires: record.expires_at,
                client_id,
                client_secret,
            }
        } else {
            self.refresh_and_persist(user_id, provider, record, client_id, client_secret)
                .await?
        };

        tracing::debug!(%user_id, %provider, "resolved oauth credential");
        Ok(ResolvedCredential::OAuth {
            host,
            port,
            secure,
            user,
            oauth2,
        })
    }

    /// Resolves the user's email address: explicit value, then profile,
    /// then the identity provider's own claim.
    async fn resolve_user_email(
        &self,
        user_id: &UserId,
        fragment: &CredentialFragment,
    ) -> ResolveResult<String> {
        if let Some(user) = &fragment.user {
            return Ok(user.clone());
        }
        if let Some(email) = self.identity.profile_email(user_id).await? {
            return Ok(email);
        }
        self.identity
            .claim_email(user_id)
            .await?
            .ok_or(ResolveError::IdentityMissing)
    }

    /// Runs the single refresh attempt and persists the result.
    ///
    /// Refresh, persist, and use are one logical step in that order: if the
    /// persist fails the resolution fails too, even though a usable token
    /// was obtained, so a refreshed token is never silently lost.
    async fn refresh_and_persist(
        &self,
        user_id: &UserId,
        provider: Provider,
        record: TokenRecord,
        client_id: String,
        client_secret: String,
    ) -> ResolveResult<OAuth2Tokens> {
        let refresh_token = record
            .refresh_token
            .clone()
            .ok_or(ResolveError::CredentialExpired)?;

        let refreshed = match self.refresher.refresh(provider, &refresh_token).await {
            Ok(refreshed) => refreshed,
            Err(RefreshError::Rejected(reason)) => {
                tracing::warn!(%user_id, %provider, %reason, "refresh rejected; re-consent required");
                return Err(ResolveError::CredentialExpired);
            }
            Err(RefreshError::Unreachable(reason)) => {
                return Err(ResolveError::ProviderUnreachable(reason));
            }
            Err(RefreshError::Unconfigured(_)) => {
                return Err(ResolveError::ConfigurationMissing);
            }
        };

        // Reuse the old refresh token when the provider did not rotate it.
        let refresh_token = refreshed.refresh_token.clone().or(record.refresh_token);

        let new_record = TokenRecord {
            user_id: user_id.clone(),
            provider,
            access_token: refreshed.access_token.clone(),
            refresh_token: refresh_token.clone(),
            expires_at: refreshed.expires_at,
            updated_at: Utc::now(),
        };
        self.store.upsert_token(&new_record).await?;

        tracing::info!(%user_id, %provider, expires_at = %refreshed.expires_at, "access token refreshed");

        Ok(OAuth2Tokens {
            access_token: refreshed.access_token,
            refresh_token,
            expires: refreshed.expires_at,
            client_id,
            client_secret,
        })
    }
}
