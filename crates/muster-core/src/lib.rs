//! muster-core: the notification/messaging subsystem of the Muster
//! volunteer event platform.
//!
//! One message fans out to many recipients; each recipient independently
//! tracks read/visibility state across two projections of the same message —
//! the transient bell feed and the durable system-message list. Targeting is
//! resolved once at creation time and frozen; real-time push and cache
//! invalidation are best-effort side effects behind the
//! [`sink::NotificationSink`] port; unread counts are recomputed on demand.
//!
//! The identity/role provider and the live push channel are external
//! collaborators, reached through the [`directory::Directory`] and
//! [`sink::NotificationSink`] traits.

pub mod config;
pub mod db;
pub mod directory;
pub mod engine;
pub mod error;
pub mod ids;
pub mod maintenance;
pub mod model;
pub mod service;
pub mod sink;
pub mod targeting;

pub use error::{ErrorCode, ServiceError};
pub use service::{
    CreatedMessage, Identity, MessageDraft, NotificationService, SYSTEM_CREATOR, Surface,
    WelcomeOutcome,
};
