//! SQL schema for the journal SQLite store.
//!
//! Executed at connection startup. Every statement is idempotent, so opening
//! an existing database leaves it untouched.

/// Entries and their six child tables.
///
/// Child rows reference their entry but carry no
/// `ON DELETE CASCADE`: the store deletes children explicitly before the
/// parent, and `foreign_keys = ON` rejects anything else.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS entries (
    entry_id    TEXT PRIMARY KEY,
    original_id TEXT,                -- caller-supplied, NULL if generated
    created_at  TEXT NOT NULL,       -- RFC 3339 UTC
    date        TEXT NOT NULL,       -- YYYY-MM-DD
    text        TEXT NOT NULL,
    question    TEXT NOT NULL DEFAULT '',
    owner_id    TEXT NOT NULL DEFAULT 'default_user'
);

-- Scalar collections: no order column, read back sorted by value.
CREATE TABLE IF NOT EXISTS topics (
    row_id   TEXT PRIMARY KEY,
    entry_id TEXT NOT NULL REFERENCES entries(entry_id),
    topic    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS emotions (
    row_id   TEXT PRIMARY KEY,
    entry_id TEXT NOT NULL REFERENCES entries(entry_id),
    emotion  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS thoughts (
    row_id   TEXT PRIMARY KEY,
    entry_id TEXT NOT NULL REFERENCES entries(entry_id),
    thought  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS goals (
    row_id   TEXT PRIMARY KEY,
    entry_id TEXT NOT NULL REFERENCES entries(entry_id),
    goal     TEXT NOT NULL
);

-- Ordered collections: order_index is rewritten on every reconciliation.
CREATE TABLE IF NOT EXISTS followups (
    row_id      TEXT PRIMARY KEY,
    entry_id    TEXT NOT NULL REFERENCES entries(entry_id),
    question    TEXT NOT NULL,
    order_index INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS qa_chain (
    row_id      TEXT PRIMARY KEY,
    entry_id    TEXT NOT NULL REFERENCES entries(entry_id),
    question    TEXT NOT NULL,
    answer      TEXT NOT NULL,
    created_at  TEXT,                -- RFC 3339 UTC or NULL
    order_index INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS entries_date_idx     ON entries(date);
CREATE INDEX IF NOT EXISTS entries_owner_idx    ON entries(owner_id);
CREATE INDEX IF NOT EXISTS entries_original_idx ON entries(original_id);
CREATE INDEX IF NOT EXISTS topics_entry_idx     ON topics(entry_id);
CREATE INDEX IF NOT EXISTS emotions_entry_idx   ON emotions(entry_id);
CREATE INDEX IF NOT EXISTS thoughts_entry_idx   ON thoughts(entry_id);
CREATE INDEX IF NOT EXISTS goals_entry_idx      ON goals(entry_id);
CREATE INDEX IF NOT EXISTS followups_entry_idx  ON followups(entry_id);
CREATE INDEX IF NOT EXISTS qa_chain_entry_idx   ON qa_chain(entry_id);

PRAGMA user_version = 1;
";

/// Account table for deployments that authenticate users. Only the table is
/// managed here; authentication itself lives outside the store.
pub const USERS_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    last_login    TEXT
);
";
