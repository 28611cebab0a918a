//! Query modules for each stored entity.

pub mod configurations;
pub mod tokens;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;

/// Parses a stored RFC 3339 timestamp column, surfacing a conversion error
/// on malformed data instead of silently substituting a default. Expiry
/// timestamps drive refresh behavior, so they must round-trip exactly.
pub(crate) fn parse_timestamp(
    idx: usize,
    value: String,
) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
