//! SQL DDL for initializing the database schema.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema includes:
/// - `accounts` table (one row per operator, unique username)
/// - `sessions` table (one row per issued token, keyed by the token's SHA-256 digest)
pub const SQLITE_INIT: &str = r#"
-- ---------------------------------------------------------------------------
-- Operator accounts
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY NOT NULL,
    username TEXT NOT NULL,
    password_hash TEXT NOT NULL, -- PHC string
    created_at TEXT NOT NULL, -- RFC3339
    updated_at TEXT NOT NULL, -- RFC3339
    UNIQUE(username)
);

-- ---------------------------------------------------------------------------
-- Session tokens (plaintext tokens are never stored)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS sessions (
    token_digest TEXT PRIMARY KEY NOT NULL,
    account_id INTEGER NOT NULL REFERENCES accounts(id),
    issued_at TEXT NOT NULL, -- RFC3339
    expires_at TEXT NOT NULL, -- RFC3339
    revoked INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
"#;
