//! SQL schema definitions as const strings.
//!
//! Two tables: durable OAuth token records keyed on `(user_id, provider)`
//! and per-user email configurations.

/// SQL to create the OAuth token table.
///
/// The composite primary key enforces the one-live-record-per-pair
/// invariant; writes go through `INSERT .. ON CONFLICT DO UPDATE`.
pub const CREATE_EMAIL_OAUTH_TOKENS: &str = r#"
CREATE TABLE IF NOT EXISTS email_oauth_tokens (
    user_id TEXT NOT NULL,
    provider TEXT NOT NULL,
    access_token TEXT NOT NULL,
    refresh_token TEXT,
    expires_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (user_id, provider)
)
"#;

/// SQL to create the email configuration table.
pub const CREATE_EMAIL_CONFIGURATIONS: &str = r#"
CREATE TABLE IF NOT EXISTS email_configurations (
    user_id TEXT PRIMARY KEY,
    host TEXT NOT NULL,
    port INTEGER NOT NULL,
    secure INTEGER NOT NULL DEFAULT 1,
    provider TEXT,
    updated_at TEXT NOT NULL
)
"#;

/// All migrations, in order.
pub fn all_migrations() -> Vec<&'static str> {
    vec![CREATE_EMAIL_OAUTH_TOKENS, CREATE_EMAIL_CONFIGURATIONS]
}
