//! OAuth token record operations.
//!
//! All writes are upserts keyed on `(user_id, provider)`. The upsert is a
//! single statement, so concurrent refreshes settle last-write-wins with no
//! partial state visible.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use crate::domain::{Provider, TokenRecord, UserId};
use crate::storage::database::{Database, Result};

use super::parse_timestamp;

/// Inserts or replaces the token record for `(user_id, provider)`.
pub async fn upsert(db: &Database, record: &TokenRecord) -> Result<()> {
    let record = record.clone();

    db.with_conn(move |conn| {
        let now = Utc::now().to_rfc3339();
        conn.execute(
            r#"
            INSERT INTO email_oauth_tokens (
                user_id, provider, access_token, refresh_token, expires_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (user_id, provider) DO UPDATE SET
                access_token = excluded.access_token,
                refresh_token = excluded.refresh_token,
                expires_at = excluded.expires_at,
                updated_at = excluded.updated_at
            "#,
            params![
                record.user_id.0,
                record.provider.as_str(),
                record.access_token,
                record.refresh_token,
                record.expires_at.to_rfc3339(),
                now,
            ],
        )?;
        Ok(())
    })
    .await
}

/// Retrieves the token record for `(user_id, provider)`, if one exists.
pub async fn get(
    db: &Database,
    user_id: &UserId,
    provider: Provider,
) -> Result<Option<TokenRecord>> {
    let user_id = user_id.clone();

    db.with_conn(move |conn| {
        let mut stmt = conn.prepare(
            r#"
            SELECT user_id, provider, access_token, refresh_token, expires_at, updated_at
            FROM email_oauth_tokens
            WHERE user_id = ?1 AND provider = ?2
            "#,
        )?;

        let result = stmt
            .query_row(params![user_id.0, provider.as_str()], row_to_record)
            .optional()?;
        Ok(result)
    })
    .await
}

/// Counts stored token records.
pub async fn count(db: &Database) -> Result<u32> {
    db.with_conn(|conn| {
        let count: u32 =
            conn.query_row("SELECT COUNT(*) FROM email_oauth_tokens", [], |row| {
                row.get(0)
            })?;
        Ok(count)
    })
    .await
}

fn row_to_record(row: &Row<'_>) -> std::result::Result<TokenRecord, rusqlite::Error> {
    let provider_str: String = row.get(1)?;
    let provider: Provider = provider_str.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let expires_at: String = row.get(4)?;
    let updated_at: String = row.get(5)?;

    Ok(TokenRecord {
        user_id: UserId(row.get(0)?),
        provider,
        access_token: row.get(2)?,
        refresh_token: row.get(3)?,
        expires_at: parse_timestamp(4, expires_at)?,
        updated_at: parse_timestamp(5, updated_at)?,
    })
}
