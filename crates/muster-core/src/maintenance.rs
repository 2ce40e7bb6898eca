//! Externally triggered, idempotent maintenance operations.
//!
//! Nothing here runs on an in-process timer: the sweep is invoked on a
//! schedule (cron, CLI) or on demand, and re-running it is always safe.

use anyhow::{Context, Result};
use rusqlite::{Connection, params};

/// Deactivate messages whose expiration timestamp has passed.
///
/// A pure global flag flip: recipient-state rows are left untouched so audit
/// queries and idempotency checks over historical messages keep working, and
/// the sweep never competes with the per-recipient state engine. Returns the
/// number of messages deactivated.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn sweep_expired(conn: &Connection, now_us: i64) -> Result<u64> {
    let swept = conn
        .execute(
            "UPDATE messages
             SET is_active = 0
             WHERE is_active = 1
               AND expires_at_us IS NOT NULL
               AND expires_at_us <= ?1",
            params![now_us],
        )
        .context("sweep expired messages")?;

    conn.execute(
        "UPDATE store_meta SET last_sweep_at_us = ?1 WHERE id = 1",
        params![now_us],
    )
    .context("record sweep timestamp")?;

    if swept > 0 {
        tracing::info!(swept, "deactivated expired messages");
    }

    Ok(u64::try_from(swept).unwrap_or(u64::MAX))
}

/// Delete recipient-state rows whose message row no longer exists.
///
/// Legacy-format cleanup: imports that predate the foreign-key schema could
/// leave orphaned state rows behind. Returns the number of rows removed.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn purge_orphans(conn: &Connection) -> Result<u64> {
    let purged = conn
        .execute(
            "DELETE FROM message_recipients
             WHERE message_id NOT IN (SELECT message_id FROM messages)",
            [],
        )
        .context("purge orphaned recipient rows")?;

    if purged > 0 {
        tracing::info!(purged, "removed orphaned recipient rows");
    }

    Ok(u64::try_from(purged).unwrap_or(u64::MAX))
}

/// Microsecond timestamp of the last completed sweep, `0` if never swept.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn last_sweep_at_us(conn: &Connection) -> Result<i64> {
    conn.query_row(
        "SELECT last_sweep_at_us FROM store_meta WHERE id = 1",
        [],
        |row| row.get(0),
    )
    .context("read last sweep timestamp")
}
