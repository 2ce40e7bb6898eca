//! Canonical SQLite schema for the notification store.
//!
//! The layout gives each `(message_id, recipient_id)` pair its own row so a
//! flag flip is a single-row `UPDATE` with natural per-key write isolation:
//! - `messages` keeps the immutable message fields plus the global
//!   `is_active` flag owned by the retention sweeper
//! - `message_recipients` is the recipient-state arena; membership is frozen
//!   at creation time and rows are never inserted by read/remove/delete paths
//! - `store_meta` tracks schema version and the last sweep timestamp

/// Migration v1: message and recipient-state tables plus store metadata.
pub const MIGRATION_V1_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS messages (
    message_id TEXT PRIMARY KEY CHECK (message_id LIKE 'nt-%'),
    title TEXT NOT NULL CHECK (length(trim(title)) > 0),
    body TEXT NOT NULL CHECK (length(trim(body)) > 0),
    kind TEXT NOT NULL CHECK (kind IN (
        'announcement', 'assignment', 'role_change', 'account_security', 'welcome'
    )),
    priority TEXT NOT NULL DEFAULT 'normal' CHECK (priority IN ('low', 'normal', 'high')),
    creator TEXT,
    hide_creator INTEGER NOT NULL DEFAULT 0 CHECK (hide_creator IN (0, 1)),
    sole_recipient TEXT,
    targeted_roles TEXT,
    excluded TEXT,
    is_active INTEGER NOT NULL DEFAULT 1 CHECK (is_active IN (0, 1)),
    created_at_us INTEGER NOT NULL,
    expires_at_us INTEGER
);

CREATE TABLE IF NOT EXISTS message_recipients (
    message_id TEXT NOT NULL REFERENCES messages(message_id) ON DELETE CASCADE,
    recipient_id TEXT NOT NULL CHECK (length(trim(recipient_id)) > 0),
    read_in_bell INTEGER NOT NULL DEFAULT 0 CHECK (read_in_bell IN (0, 1)),
    removed_from_bell INTEGER NOT NULL DEFAULT 0 CHECK (removed_from_bell IN (0, 1)),
    read_in_system INTEGER NOT NULL DEFAULT 0 CHECK (read_in_system IN (0, 1)),
    deleted_from_system INTEGER NOT NULL DEFAULT 0 CHECK (deleted_from_system IN (0, 1)),
    last_interaction_at_us INTEGER,
    created_at_us INTEGER NOT NULL,
    PRIMARY KEY (message_id, recipient_id)
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL,
    last_sweep_at_us INTEGER NOT NULL DEFAULT 0
);

INSERT OR IGNORE INTO store_meta (id, schema_version, last_sweep_at_us)
VALUES (1, 1, 0);
"#;

/// Migration v2: read-path indexes for feeds, pagination, and counts.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_recipients_user
    ON message_recipients(recipient_id, message_id);

CREATE INDEX IF NOT EXISTS idx_recipients_bell_unread
    ON message_recipients(recipient_id, removed_from_bell, read_in_bell);

CREATE INDEX IF NOT EXISTS idx_recipients_system_unread
    ON message_recipients(recipient_id, deleted_from_system, read_in_system);

CREATE INDEX IF NOT EXISTS idx_messages_active_expiry
    ON messages(is_active, expires_at_us);

CREATE INDEX IF NOT EXISTS idx_messages_kind_created
    ON messages(kind, created_at_us DESC);

UPDATE store_meta
SET schema_version = 2
WHERE id = 1;
";

/// Indexes expected by feed/inbox/count query paths.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_recipients_user",
    "idx_recipients_bell_unread",
    "idx_recipients_system_unread",
    "idx_messages_active_expiry",
    "idx_messages_kind_created",
];
