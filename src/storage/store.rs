//! SQLite-backed implementation of the [`TokenStore`] trait.

use async_trait::async_trait;

use crate::domain::{EmailConfiguration, Provider, TokenRecord, UserId};
use crate::services::{StoreError, StoreResult, TokenStore};

use super::database::{Database, DatabaseError};
use super::queries;

/// [`TokenStore`] backed by the sqlite [`Database`].
#[derive(Debug, Clone)]
pub struct SqliteTokenStore {
    db: Database,
}

impl SqliteTokenStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// The underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl From<DatabaseError> for StoreError {
    fn from(e: DatabaseError) -> Self {
        StoreError(e.to_string())
    }
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    async fn get_token(
        &self,
        user_id: &UserId,
        provider: Provider,
    ) -> StoreResult<Option<TokenRecord>> {
        Ok(queries::tokens::get(&self.db, user_id, provider).await?)
    }

    async fn upsert_token(&self, record: &TokenRecord) -> StoreResult<()> {
        Ok(queries::tokens::upsert(&self.db, record).await?)
    }

    async fn get_configuration(
        &self,
        user_id: &UserId,
    ) -> StoreResult<Option<EmailConfiguration>> {
        Ok(queries::configurations::get(&self.db, user_id).await?)
    }

    async fn upsert_configuration(&self, config: &EmailConfiguration) -> StoreResult<()> {
        Ok(queries::configurations::upsert(&self.db, config).await?)
    }
}
