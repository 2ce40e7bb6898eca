//! Message id generation and validation.
//!
//! Ids use the `nt-` prefix followed by a 32-character lowercase hex UUID,
//! e.g. `nt-6f7c2a1e9b4d4c0f8a3e5d2b1c9f7a60`. The prefix is enforced by a
//! schema CHECK constraint as well, so malformed ids can never reach the
//! recipient-state table.

use uuid::Uuid;

/// Prefix carried by every message id.
pub const MESSAGE_ID_PREFIX: &str = "nt-";

/// Generate a fresh message id.
#[must_use]
pub fn new_message_id() -> String {
    format!("{MESSAGE_ID_PREFIX}{}", Uuid::new_v4().simple())
}

/// Validate the shape of a caller-supplied message id.
///
/// Accepts only the `nt-` prefix followed by ASCII alphanumerics. Used to
/// reject malformed ids with `Validation` before touching the store.
#[must_use]
pub fn is_valid_message_id(id: &str) -> bool {
    match id.strip_prefix(MESSAGE_ID_PREFIX) {
        Some(rest) => !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric()),
        None => false,
    }
}
