//! Email configuration operations, one row per user.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use crate::domain::{EmailConfiguration, Provider, UserId};
use crate::storage::database::{Database, Result};

use super::parse_timestamp;

/// Inserts or replaces a user's email configuration.
pub async fn upsert(db: &Database, config: &EmailConfiguration) -> Result<()> {
    let config = config.clone();

    db.with_conn(move |conn| {
        let now = Utc::now().to_rfc3339();
        conn.execute(
            r#"
            INSERT INTO email_configurations (
                user_id, host, port, secure, provider, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (user_id) DO UPDATE SET
                host = excluded.host,
                port = excluded.port,
                secure = excluded.secure,
                provider = excluded.provider,
                updated_at = excluded.updated_at
            "#,
            params![
                config.user_id.0,
                config.host,
                config.port,
                config.secure as i32,
                config.provider.map(|p| p.as_str()),
                now,
            ],
        )?;
        Ok(())
    })
    .await
}

/// Retrieves a user's email configuration, if one exists.
pub async fn get(db: &Database, user_id: &UserId) -> Result<Option<EmailConfiguration>> {
    let user_id = user_id.clone();

    db.with_conn(move |conn| {
        let mut stmt = conn.prepare(
            r#"
            SELECT user_id, host, port, secure, provider, updated_at
            FROM email_configurations
            WHERE user_id = ?1
            "#,
        )?;

        let result = stmt.query_row([&user_id.0], row_to_config).optional()?;
        Ok(result)
    })
    .await
}

fn row_to_config(row: &Row<'_>) -> std::result::Result<EmailConfiguration, rusqlite::Error> {
    let provider: Option<String> = row.get(4)?;
    let provider = provider
        .map(|s| {
            s.parse::<Provider>().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    4,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })
        })
        .transpose()?;

    let updated_at: String = row.get(5)?;

    Ok(EmailConfiguration {
        user_id: UserId(row.get(0)?),
        host: row.get(1)?,
        port: row.get::<_, i64>(2)? as u16,
        secure: row.get::<_, i32>(3)? != 0,
        provider,
        updated_at: parse_timestamp(5, updated_at)?,
    })
}
