//! Read path: typed projections of the notification store.
//!
//! Provides the two per-user surfaces (bell feed, paginated system list),
//! the on-demand unread aggregation, and store-level stats for operator
//! tooling. All functions take a shared `&Connection` and return typed
//! structs (never raw rows).

use crate::model::{MessageKind, Priority};
use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// One entry of a user's bell feed, annotated with that user's read flag.
///
/// `creator` is already anonymized: it is `None` whenever the message was
/// created with `hide_creator`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BellItem {
    pub message_id: String,
    pub title: String,
    pub body: String,
    pub kind: MessageKind,
    pub priority: Priority,
    pub creator: Option<String>,
    pub is_read: bool,
    pub created_at_us: i64,
}

/// One entry of a user's system-message list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemItem {
    pub message_id: String,
    pub title: String,
    pub body: String,
    pub kind: MessageKind,
    pub priority: Priority,
    pub creator: Option<String>,
    pub sole_recipient: Option<String>,
    pub is_read: bool,
    pub created_at_us: i64,
}

/// A page of a user's system-message list plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemPage {
    pub items: Vec<SystemItem>,
    pub page: u32,
    pub limit: u32,
    /// Total matching entries across all pages.
    pub total: u64,
}

/// On-demand unread counts for one user. No denormalized counter is kept;
/// both fields are computed by scanning the user's active state rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnreadCounts {
    pub bell: u64,
    pub system: u64,
    pub total: u64,
}

/// Aggregate counters for operator-facing store stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub by_kind: HashMap<String, usize>,
    pub by_priority: HashMap<String, usize>,
    pub active_messages: u64,
    pub inactive_messages: u64,
    pub recipient_rows: u64,
}

// ---------------------------------------------------------------------------
// Per-user surfaces
// ---------------------------------------------------------------------------

/// A user's bell feed: active messages with a state row, excluding entries
/// the user removed, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn bell_feed(conn: &Connection, user_id: &str, limit: Option<u32>) -> Result<Vec<BellItem>> {
    let limit_clause = limit.map_or(String::new(), |n| format!(" LIMIT {n}"));

    let sql = format!(
        "SELECT m.message_id, m.title, m.body, m.kind, m.priority, m.creator, \
         m.hide_creator, r.read_in_bell, m.created_at_us \
         FROM message_recipients r \
         INNER JOIN messages m ON m.message_id = r.message_id \
         WHERE r.recipient_id = ?1 AND r.removed_from_bell = 0 AND m.is_active = 1 \
         ORDER BY m.created_at_us DESC, m.message_id ASC{limit_clause}"
    );

    let mut stmt = conn.prepare(&sql).context("prepare bell feed query")?;
    let rows = stmt
        .query_map(params![user_id], |row| {
            Ok(BellItem {
                message_id: row.get(0)?,
                title: row.get(1)?,
                body: row.get(2)?,
                kind: parse_kind(row.get::<_, String>(3)?, 3)?,
                priority: parse_priority(row.get::<_, String>(4)?, 4)?,
                creator: anonymized_creator(row.get(5)?, row.get::<_, i64>(6)? != 0),
                is_read: row.get::<_, i64>(7)? != 0,
                created_at_us: row.get(8)?,
            })
        })
        .context("execute bell feed query")?;

    let mut items = Vec::new();
    for row in rows {
        items.push(row.context("read bell feed row")?);
    }
    Ok(items)
}

/// One page of a user's system-message list: active messages with a state
/// row, excluding entries the user deleted, optionally filtered by kind,
/// newest first. `page` is 1-based.
///
/// # Errors
///
/// Returns an error if a query fails.
pub fn system_page(
    conn: &Connection,
    user_id: &str,
    kind: Option<MessageKind>,
    page: u32,
    limit: u32,
) -> Result<SystemPage> {
    let kind_clause = kind.map_or(String::new(), |k| format!(" AND m.kind = '{k}'"));
    let offset = u64::from(page.saturating_sub(1)) * u64::from(limit);

    let count_sql = format!(
        "SELECT COUNT(*) \
         FROM message_recipients r \
         INNER JOIN messages m ON m.message_id = r.message_id \
         WHERE r.recipient_id = ?1 AND r.deleted_from_system = 0 AND m.is_active = 1{kind_clause}"
    );
    let total: i64 = conn
        .query_row(&count_sql, params![user_id], |row| row.get(0))
        .context("count system list entries")?;

    let sql = format!(
        "SELECT m.message_id, m.title, m.body, m.kind, m.priority, m.creator, \
         m.hide_creator, m.sole_recipient, r.read_in_system, m.created_at_us \
         FROM message_recipients r \
         INNER JOIN messages m ON m.message_id = r.message_id \
         WHERE r.recipient_id = ?1 AND r.deleted_from_system = 0 AND m.is_active = 1{kind_clause} \
         ORDER BY m.created_at_us DESC, m.message_id ASC \
         LIMIT {limit} OFFSET {offset}"
    );

    let mut stmt = conn.prepare(&sql).context("prepare system list query")?;
    let rows = stmt
        .query_map(params![user_id], |row| {
            Ok(SystemItem {
                message_id: row.get(0)?,
                title: row.get(1)?,
                body: row.get(2)?,
                kind: parse_kind(row.get::<_, String>(3)?, 3)?,
                priority: parse_priority(row.get::<_, String>(4)?, 4)?,
                creator: anonymized_creator(row.get(5)?, row.get::<_, i64>(6)? != 0),
                sole_recipient: row.get(7)?,
                is_read: row.get::<_, i64>(8)? != 0,
                created_at_us: row.get(9)?,
            })
        })
        .context("execute system list query")?;

    let mut items = Vec::new();
    for row in rows {
        items.push(row.context("read system list row")?);
    }

    Ok(SystemPage {
        items,
        page,
        limit,
        total: u64::try_from(total).unwrap_or(0),
    })
}

// ---------------------------------------------------------------------------
// Unread aggregation
// ---------------------------------------------------------------------------

/// Compute a user's unread counts across both projections.
///
/// `bell` counts active, non-removed, unread-in-bell rows; `system` counts
/// active, non-deleted, unread-in-system rows; `total` is their sum.
///
/// # Errors
///
/// Returns an error if a count query fails.
pub fn unread_counts(conn: &Connection, user_id: &str) -> Result<UnreadCounts> {
    let bell: i64 = conn
        .query_row(
            "SELECT COUNT(*) \
             FROM message_recipients r \
             INNER JOIN messages m ON m.message_id = r.message_id \
             WHERE r.recipient_id = ?1 \
               AND r.removed_from_bell = 0 \
               AND r.read_in_bell = 0 \
               AND m.is_active = 1",
            params![user_id],
            |row| row.get(0),
        )
        .context("count bell unread")?;

    let system: i64 = conn
        .query_row(
            "SELECT COUNT(*) \
             FROM message_recipients r \
             INNER JOIN messages m ON m.message_id = r.message_id \
             WHERE r.recipient_id = ?1 \
               AND r.deleted_from_system = 0 \
               AND r.read_in_system = 0 \
               AND m.is_active = 1",
            params![user_id],
            |row| row.get(0),
        )
        .context("count system unread")?;

    let bell = u64::try_from(bell).unwrap_or(0);
    let system = u64::try_from(system).unwrap_or(0);
    Ok(UnreadCounts {
        bell,
        system,
        total: bell + system,
    })
}

// ---------------------------------------------------------------------------
// Operator stats
// ---------------------------------------------------------------------------

/// Aggregate message counts for the `stats` surface.
///
/// # Errors
///
/// Returns an error if a query fails.
pub fn stats(conn: &Connection) -> Result<StoreStats> {
    let by_kind = count_messages_grouped(conn, "kind")?;
    let by_priority = count_messages_grouped(conn, "priority")?;

    let active: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM messages WHERE is_active = 1",
            [],
            |row| row.get(0),
        )
        .context("count active messages")?;
    let inactive: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM messages WHERE is_active = 0",
            [],
            |row| row.get(0),
        )
        .context("count inactive messages")?;
    let recipient_rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM message_recipients", [], |row| {
            row.get(0)
        })
        .context("count recipient rows")?;

    Ok(StoreStats {
        by_kind,
        by_priority,
        active_messages: u64::try_from(active).unwrap_or(0),
        inactive_messages: u64::try_from(inactive).unwrap_or(0),
        recipient_rows: u64::try_from(recipient_rows).unwrap_or(0),
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn count_messages_grouped(conn: &Connection, column: &str) -> Result<HashMap<String, usize>> {
    let sql = format!("SELECT {column}, COUNT(*) FROM messages GROUP BY {column}");
    let mut stmt = conn
        .prepare(&sql)
        .context("prepare aggregate count query")?;
    let rows = stmt.query_map([], |row| {
        let key: String = row.get(0)?;
        let count: i64 = row.get(1)?;
        Ok((key, usize::try_from(count).unwrap_or(usize::MAX)))
    })?;

    let mut counts = HashMap::new();
    for row in rows {
        let (key, count) = row.context("read aggregate count")?;
        counts.insert(key, count);
    }

    Ok(counts)
}

fn anonymized_creator(creator: Option<String>, hide: bool) -> Option<String> {
    if hide { None } else { creator }
}

fn parse_kind(raw: String, column: usize) -> rusqlite::Result<MessageKind> {
    MessageKind::from_str(&raw).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Text,
            Box::new(error),
        )
    })
}

fn parse_priority(raw: String, column: usize) -> rusqlite::Result<Priority> {
    Priority::from_str(&raw).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Text,
            Box::new(error),
        )
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
