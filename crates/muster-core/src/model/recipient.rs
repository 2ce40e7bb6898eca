use serde::{Deserialize, Serialize};

/// Per-recipient read/visibility state across the two projections of a
/// message: the transient bell feed and the durable system-message list.
///
/// Invariants enforced by the state engine:
/// - a row exists iff the user was a resolved recipient at creation time
/// - `read_in_bell` and `read_in_system` only ever change together
/// - `removed_from_bell` and `deleted_from_system` are independent and
///   terminal for their own projection only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RecipientState {
    pub read_in_bell: bool,
    pub removed_from_bell: bool,
    pub read_in_system: bool,
    pub deleted_from_system: bool,
    /// Microsecond timestamp of the recipient's latest mutation, if any.
    pub last_interaction_at_us: Option<i64>,
}

impl RecipientState {
    /// Whether the message still shows in this user's bell feed.
    #[must_use]
    pub const fn visible_in_bell(self) -> bool {
        !self.removed_from_bell
    }

    /// Whether the message still shows in this user's system list.
    #[must_use]
    pub const fn visible_in_system(self) -> bool {
        !self.deleted_from_system
    }

    /// Whether this row contributes to the bell unread count.
    #[must_use]
    pub const fn unread_in_bell(self) -> bool {
        self.visible_in_bell() && !self.read_in_bell
    }

    /// Whether this row contributes to the system unread count.
    #[must_use]
    pub const fn unread_in_system(self) -> bool {
        self.visible_in_system() && !self.read_in_system
    }
}
