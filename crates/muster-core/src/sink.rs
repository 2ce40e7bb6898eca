//! Delivery and cache hooks: best-effort push of state changes to a user's
//! live session plus invalidation of cached per-user projections.
//!
//! The [`NotificationSink`] trait is a port; the state engine never talks to
//! a concrete transport. Hook failures are logged and swallowed at the
//! [`dispatch`] boundary — the persisted recipient state is the single
//! source of truth and the next read recomputes from it regardless.

use crate::db::query::UnreadCounts;
use anyhow::Result;
use serde::Serialize;
use std::sync::Mutex;

/// A typed event addressed to one user's live session.
///
/// Wire names match the platform's real-time channel contract:
/// `message_*` events belong to the system-message projection,
/// `notification_*` events to the bell projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PushEvent {
    MessageCreated { message_id: String, at_us: i64 },
    MessageRead { message_id: String, at_us: i64 },
    MessageDeleted { message_id: String, at_us: i64 },
    NotificationRead { message_id: String, at_us: i64 },
    NotificationRemoved { message_id: String, at_us: i64 },
    UnreadCountUpdate { bell: u64, system: u64, total: u64 },
}

impl PushEvent {
    /// Build the count-changed event from freshly computed counts.
    #[must_use]
    pub const fn counts(counts: UnreadCounts) -> Self {
        Self::UnreadCountUpdate {
            bell: counts.bell,
            system: counts.system,
            total: counts.total,
        }
    }

    const fn name(&self) -> &'static str {
        match self {
            Self::MessageCreated { .. } => "message_created",
            Self::MessageRead { .. } => "message_read",
            Self::MessageDeleted { .. } => "message_deleted",
            Self::NotificationRead { .. } => "notification_read",
            Self::NotificationRemoved { .. } => "notification_removed",
            Self::UnreadCountUpdate { .. } => "unread_count_update",
        }
    }
}

/// Port for the real-time channel and the per-user projection cache.
pub trait NotificationSink {
    /// Push an event to the user's live session, if connected.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport rejects the event; callers treat
    /// this as best-effort.
    fn push(&self, user_id: &str, event: &PushEvent) -> Result<()>;

    /// Drop any cached projection of the user's notification lists.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be reached.
    fn invalidate(&self, user_id: &str) -> Result<()>;
}

/// Push an event and invalidate the user's cache, swallowing failures.
///
/// Never propagates an error: the enclosing mutation has already committed
/// and is reported as successful.
pub fn dispatch(sink: &dyn NotificationSink, user_id: &str, event: &PushEvent) {
    if let Err(error) = sink.push(user_id, event) {
        tracing::warn!(
            user = user_id,
            event = event.name(),
            error = %error,
            "push delivery failed, state remains authoritative"
        );
    }
    if let Err(error) = sink.invalidate(user_id) {
        tracing::warn!(
            user = user_id,
            error = %error,
            "cache invalidation failed"
        );
    }
}

/// Sink that drops everything. Default for embedders without a live channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl NotificationSink for NoopSink {
    fn push(&self, _user_id: &str, _event: &PushEvent) -> Result<()> {
        Ok(())
    }

    fn invalidate(&self, _user_id: &str) -> Result<()> {
        Ok(())
    }
}

/// Sink that records every call, preserving per-user order. Test double.
#[derive(Debug, Default)]
pub struct MemorySink {
    pushed: Mutex<Vec<(String, PushEvent)>>,
    invalidated: Mutex<Vec<String>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All pushed events so far, in commit order.
    #[must_use]
    pub fn pushed(&self) -> Vec<(String, PushEvent)> {
        self.pushed.lock().expect("sink lock poisoned").clone()
    }

    /// Events pushed to one user, in commit order.
    #[must_use]
    pub fn pushed_to(&self, user_id: &str) -> Vec<PushEvent> {
        self.pushed
            .lock()
            .expect("sink lock poisoned")
            .iter()
            .filter(|(user, _)| user == user_id)
            .map(|(_, event)| event.clone())
            .collect()
    }

    /// Users whose cached projections were invalidated, in order.
    #[must_use]
    pub fn invalidated(&self) -> Vec<String> {
        self.invalidated.lock().expect("sink lock poisoned").clone()
    }
}

impl NotificationSink for MemorySink {
    fn push(&self, user_id: &str, event: &PushEvent) -> Result<()> {
        self.pushed
            .lock()
            .expect("sink lock poisoned")
            .push((user_id.to_string(), event.clone()));
        Ok(())
    }

    fn invalidate(&self, user_id: &str) -> Result<()> {
        self.invalidated
            .lock()
            .expect("sink lock poisoned")
            .push(user_id.to_string());
        Ok(())
    }
}

/// Sink that logs events through `tracing`. Used by the CLI so operators see
/// what a live channel would have delivered.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn push(&self, user_id: &str, event: &PushEvent) -> Result<()> {
        tracing::info!(user = user_id, event = event.name(), "push");
        Ok(())
    }

    fn invalidate(&self, user_id: &str) -> Result<()> {
        tracing::debug!(user = user_id, "invalidate cached projections");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{MemorySink, NotificationSink, PushEvent, dispatch};
    use anyhow::anyhow;

    #[test]
    fn wire_names_match_the_channel_contract() {
        let event = PushEvent::NotificationRemoved {
            message_id: "nt-a1".to_string(),
            at_us: 42,
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["event"], "notification_removed");
        assert_eq!(json["message_id"], "nt-a1");
        assert_eq!(json["at_us"], 42);

        let counts = PushEvent::UnreadCountUpdate {
            bell: 1,
            system: 2,
            total: 3,
        };
        let json = serde_json::to_value(&counts).expect("serialize");
        assert_eq!(json["event"], "unread_count_update");
        assert_eq!(json["total"], 3);
    }

    #[test]
    fn memory_sink_preserves_per_user_order() {
        let sink = MemorySink::new();
        for at_us in [1, 2, 3] {
            dispatch(
                &sink,
                "vol-a",
                &PushEvent::MessageCreated {
                    message_id: format!("nt-{at_us}"),
                    at_us,
                },
            );
        }

        let events = sink.pushed_to("vol-a");
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], PushEvent::MessageCreated { at_us: 1, .. }));
        assert!(matches!(&events[2], PushEvent::MessageCreated { at_us: 3, .. }));
        assert_eq!(sink.invalidated().len(), 3);
    }

    #[test]
    fn dispatch_swallows_sink_failures() {
        struct FailingSink;

        impl NotificationSink for FailingSink {
            fn push(&self, _user_id: &str, _event: &PushEvent) -> anyhow::Result<()> {
                Err(anyhow!("socket closed"))
            }

            fn invalidate(&self, _user_id: &str) -> anyhow::Result<()> {
                Err(anyhow!("cache down"))
            }
        }

        // Must not panic or propagate.
        dispatch(
            &FailingSink,
            "vol-a",
            &PushEvent::MessageRead {
                message_id: "nt-a1".to_string(),
                at_us: 1,
            },
        );
    }
}
