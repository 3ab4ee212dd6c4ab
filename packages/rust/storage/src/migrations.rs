//! SQL migration definitions for the records database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Initial schema: accounts, contacts",
            sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Organizations in the system of record
CREATE TABLE IF NOT EXISTS accounts (
    record_id            TEXT PRIMARY KEY,
    external_id          TEXT NOT NULL DEFAULT '',
    owner_id             TEXT NOT NULL DEFAULT '',
    name                 TEXT NOT NULL,
    domain               TEXT NOT NULL DEFAULT '',
    phone                TEXT NOT NULL DEFAULT '',
    enrichment_requested INTEGER NOT NULL DEFAULT 0,
    enrichment_complete  INTEGER NOT NULL DEFAULT 0,
    notes                TEXT,
    created_at           TEXT NOT NULL,
    updated_at           TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_accounts_pending
    ON accounts(enrichment_requested, enrichment_complete);

-- People attached to accounts
CREATE TABLE IF NOT EXISTS contacts (
    id         TEXT PRIMARY KEY,
    account_id TEXT NOT NULL REFERENCES accounts(record_id) ON DELETE CASCADE,
    owner_id   TEXT NOT NULL DEFAULT '',
    name       TEXT NOT NULL,
    title      TEXT NOT NULL DEFAULT '',
    office     TEXT NOT NULL DEFAULT '',
    direct     TEXT NOT NULL DEFAULT '',
    mobile     TEXT NOT NULL DEFAULT '',
    email      TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_contacts_account_id ON contacts(account_id);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
        },
        Migration {
            version: 2,
            description: "Track when an account was last enriched",
            sql: r#"
ALTER TABLE accounts ADD COLUMN enriched_at TEXT;

INSERT INTO schema_migrations (version) VALUES (2);
"#,
        },
    ]
}
