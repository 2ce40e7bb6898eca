//! Write path for the notification store.
//!
//! Creation persists the message row and its frozen recipient set in one
//! transaction. Every later mutation is a single-row `UPDATE` scoped to one
//! `(message_id, recipient_id)` pair; flags are only ever raised, never
//! cleared, so concurrent writers for different recipients cannot clobber
//! each other and re-applying a mutation is a no-op.

use crate::model::{MessageFields, MessageKind, Priority, RecipientState, Role};
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Insert a message and its resolved recipient set atomically.
///
/// An empty recipient set is valid: the message row is created with zero
/// state entries and is a no-op for delivery purposes.
///
/// # Errors
///
/// Returns an error if the transaction fails (e.g. duplicate id or a CHECK
/// constraint violation).
pub fn insert_message(
    conn: &mut Connection,
    fields: &MessageFields,
    recipients: &BTreeSet<String>,
) -> Result<()> {
    let targeted_roles = if fields.targeted_roles.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&fields.targeted_roles).context("serialize role snapshot")?)
    };
    let excluded = if fields.excluded.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&fields.excluded).context("serialize exclusion snapshot")?)
    };

    let tx = conn.transaction().context("begin create transaction")?;

    tx.execute(
        "INSERT INTO messages (
            message_id, title, body, kind, priority, creator, hide_creator,
            sole_recipient, targeted_roles, excluded, is_active,
            created_at_us, expires_at_us
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            fields.id,
            fields.title,
            fields.body,
            fields.kind.to_string(),
            fields.priority.to_string(),
            fields.creator,
            i64::from(fields.hide_creator),
            fields.sole_recipient,
            targeted_roles,
            excluded,
            i64::from(fields.is_active),
            fields.created_at_us,
            fields.expires_at_us,
        ],
    )
    .with_context(|| format!("insert message '{}'", fields.id))?;

    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO message_recipients (message_id, recipient_id, created_at_us)
                 VALUES (?1, ?2, ?3)",
            )
            .context("prepare recipient insert")?;
        for recipient in recipients {
            stmt.execute(params![fields.id, recipient, fields.created_at_us])
                .with_context(|| format!("insert recipient state for '{recipient}'"))?;
        }
    }

    tx.commit().context("commit create transaction")
}

/// Fetch a message by exact id. Returns `None` when unknown.
///
/// # Errors
///
/// Returns an error if the query fails or an audit snapshot fails to parse.
pub fn get_message(conn: &Connection, message_id: &str) -> Result<Option<MessageFields>> {
    let sql = "SELECT message_id, title, body, kind, priority, creator, hide_creator, \
               sole_recipient, targeted_roles, excluded, is_active, created_at_us, expires_at_us \
               FROM messages WHERE message_id = ?1";

    let result = conn
        .query_row(sql, params![message_id], row_to_message)
        .optional()
        .with_context(|| format!("get message '{message_id}'"))?;

    Ok(result)
}

/// Check if a message row exists.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn message_exists(conn: &Connection, message_id: &str) -> Result<bool> {
    let exists: bool = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM messages WHERE message_id = ?1)",
            params![message_id],
            |row| row.get(0),
        )
        .context("check message exists")?;
    Ok(exists)
}

/// Fetch one recipient's state row for a message. Returns `None` when the
/// user was not a resolved recipient at creation time.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_recipient_state(
    conn: &Connection,
    message_id: &str,
    recipient_id: &str,
) -> Result<Option<RecipientState>> {
    let sql = "SELECT read_in_bell, removed_from_bell, read_in_system, deleted_from_system, \
               last_interaction_at_us \
               FROM message_recipients WHERE message_id = ?1 AND recipient_id = ?2";

    conn.query_row(sql, params![message_id, recipient_id], |row| {
        Ok(RecipientState {
            read_in_bell: row.get::<_, i64>(0)? != 0,
            removed_from_bell: row.get::<_, i64>(1)? != 0,
            read_in_system: row.get::<_, i64>(2)? != 0,
            deleted_from_system: row.get::<_, i64>(3)? != 0,
            last_interaction_at_us: row.get(4)?,
        })
    })
    .optional()
    .with_context(|| format!("get recipient state '{message_id}'/'{recipient_id}'"))
}

/// Set both read flags on one recipient's row. The coupled read action: there
/// is no way to mark only one projection read.
///
/// Returns `false` when no state row exists for the pair.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn mark_read(
    conn: &Connection,
    message_id: &str,
    recipient_id: &str,
    now_us: i64,
) -> Result<bool> {
    let affected = conn
        .execute(
            "UPDATE message_recipients
             SET read_in_bell = 1, read_in_system = 1, last_interaction_at_us = ?3
             WHERE message_id = ?1 AND recipient_id = ?2",
            params![message_id, recipient_id, now_us],
        )
        .with_context(|| format!("mark read '{message_id}'/'{recipient_id}'"))?;
    Ok(affected == 1)
}

/// Raise `removed_from_bell` on one recipient's row; read flags and the
/// system projection are untouched.
///
/// Returns `false` when no state row exists for the pair.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn mark_removed_from_bell(
    conn: &Connection,
    message_id: &str,
    recipient_id: &str,
    now_us: i64,
) -> Result<bool> {
    let affected = conn
        .execute(
            "UPDATE message_recipients
             SET removed_from_bell = 1, last_interaction_at_us = ?3
             WHERE message_id = ?1 AND recipient_id = ?2",
            params![message_id, recipient_id, now_us],
        )
        .with_context(|| format!("remove from bell '{message_id}'/'{recipient_id}'"))?;
    Ok(affected == 1)
}

/// Raise `deleted_from_system` on one recipient's row; read flags and the
/// bell projection are untouched.
///
/// Returns `false` when no state row exists for the pair.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn mark_deleted_from_system(
    conn: &Connection,
    message_id: &str,
    recipient_id: &str,
    now_us: i64,
) -> Result<bool> {
    let affected = conn
        .execute(
            "UPDATE message_recipients
             SET deleted_from_system = 1, last_interaction_at_us = ?3
             WHERE message_id = ?1 AND recipient_id = ?2",
            params![message_id, recipient_id, now_us],
        )
        .with_context(|| format!("delete from system '{message_id}'/'{recipient_id}'"))?;
    Ok(affected == 1)
}

/// Mark every active, bell-visible, unread message of one recipient as read
/// in both projections. Returns the affected message ids.
///
/// # Errors
///
/// Returns an error if a query fails.
pub fn mark_all_bell_read(
    conn: &Connection,
    recipient_id: &str,
    now_us: i64,
) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT r.message_id
             FROM message_recipients r
             INNER JOIN messages m ON m.message_id = r.message_id
             WHERE r.recipient_id = ?1
               AND r.removed_from_bell = 0
               AND r.read_in_bell = 0
               AND m.is_active = 1
             ORDER BY m.created_at_us ASC, r.message_id ASC",
        )
        .context("prepare unread bell scan")?;

    let ids = stmt
        .query_map(params![recipient_id], |row| row.get::<_, String>(0))
        .context("execute unread bell scan")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("read unread bell row")?;

    for message_id in &ids {
        mark_read(conn, message_id, recipient_id, now_us)?;
    }

    Ok(ids)
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageFields> {
    let kind_raw: String = row.get(3)?;
    let priority_raw: String = row.get(4)?;
    let targeted_roles_raw: Option<String> = row.get(8)?;
    let excluded_raw: Option<String> = row.get(9)?;

    let kind = MessageKind::from_str(&kind_raw).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(error))
    })?;
    let priority = Priority::from_str(&priority_raw).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(error))
    })?;
    let targeted_roles: Vec<Role> = match targeted_roles_raw {
        Some(json) => serde_json::from_str(&json).map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(
                8,
                rusqlite::types::Type::Text,
                Box::new(error),
            )
        })?,
        None => Vec::new(),
    };
    let excluded: Vec<String> = match excluded_raw {
        Some(json) => serde_json::from_str(&json).map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(
                9,
                rusqlite::types::Type::Text,
                Box::new(error),
            )
        })?,
        None => Vec::new(),
    };

    Ok(MessageFields {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        kind,
        priority,
        creator: row.get(5)?,
        hide_creator: row.get::<_, i64>(6)? != 0,
        sole_recipient: row.get(7)?,
        targeted_roles,
        excluded,
        is_active: row.get::<_, i64>(10)? != 0,
        created_at_us: row.get(11)?,
        expires_at_us: row.get(12)?,
    })
}
