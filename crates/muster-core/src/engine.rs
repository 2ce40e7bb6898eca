//! State transition engine: the only code path allowed to flip per-recipient
//! flags.
//!
//! Each mutation is scoped to exactly one `(message_id, recipient_id)` pair
//! and commits as a single atomic row update, so concurrent mutations by
//! different recipients of the same message never interfere. A mutation
//! against an unknown message, or a recipient without a state entry, fails
//! `NotFound` and never creates a row — membership is frozen at creation.

use crate::db::store;
use crate::error::ServiceError;
use rusqlite::Connection;

/// Mark a message read in both projections for one recipient.
///
/// The two read flags are coupled by design: no action marks only one
/// projection read. Idempotent — re-invoking on an already-read entry
/// observes the same state.
///
/// # Errors
///
/// `NotFound` when the message is unknown or the recipient holds no state
/// entry; `Internal` on storage failure.
pub fn mark_read_everywhere(
    conn: &Connection,
    message_id: &str,
    recipient_id: &str,
    now_us: i64,
) -> Result<(), ServiceError> {
    let updated = store::mark_read(conn, message_id, recipient_id, now_us)?;
    require_hit(conn, message_id, updated)
}

/// Remove a message from one recipient's bell feed. Terminal for the bell
/// projection only: read flags and the system projection are untouched.
///
/// # Errors
///
/// `NotFound` when the message is unknown or the recipient holds no state
/// entry; `Internal` on storage failure.
pub fn remove_from_bell(
    conn: &Connection,
    message_id: &str,
    recipient_id: &str,
    now_us: i64,
) -> Result<(), ServiceError> {
    let updated = store::mark_removed_from_bell(conn, message_id, recipient_id, now_us)?;
    require_hit(conn, message_id, updated)
}

/// Delete a message from one recipient's system list. Terminal for the
/// system projection only: read flags and the bell projection are untouched.
///
/// # Errors
///
/// `NotFound` when the message is unknown or the recipient holds no state
/// entry; `Internal` on storage failure.
pub fn delete_from_system(
    conn: &Connection,
    message_id: &str,
    recipient_id: &str,
    now_us: i64,
) -> Result<(), ServiceError> {
    let updated = store::mark_deleted_from_system(conn, message_id, recipient_id, now_us)?;
    require_hit(conn, message_id, updated)
}

/// Apply [`mark_read_everywhere`] to every active, bell-visible, unread
/// message of one recipient. Returns the affected message ids; an empty
/// result is a successful no-op.
///
/// # Errors
///
/// `Internal` on storage failure.
pub fn mark_all_unread_bell_read(
    conn: &Connection,
    recipient_id: &str,
    now_us: i64,
) -> Result<Vec<String>, ServiceError> {
    Ok(store::mark_all_bell_read(conn, recipient_id, now_us)?)
}

/// Distinguish "message unknown" from "no state entry for this recipient"
/// after a zero-row update, without ever creating a row.
fn require_hit(conn: &Connection, message_id: &str, updated: bool) -> Result<(), ServiceError> {
    if updated {
        return Ok(());
    }

    if store::message_exists(conn, message_id)? {
        Err(ServiceError::NotFound {
            what: "recipient state",
            id: message_id.to_string(),
        })
    } else {
        Err(ServiceError::NotFound {
            what: "message",
            id: message_id.to_string(),
        })
    }
}
