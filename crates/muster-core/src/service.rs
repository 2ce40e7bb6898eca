//! Operation surface of the notification subsystem.
//!
//! [`NotificationService`] owns a store connection plus the two injected
//! ports (identity directory, notification sink) and exposes the creation,
//! read, mutation, aggregation, and maintenance operations. The HTTP layer
//! of the platform and the CLI both sit on top of this type.
//!
//! Event mapping per surface: a read performed through the bell surface
//! emits `notification_read`, through the system surface `message_read`;
//! removal emits `notification_removed`, deletion `message_deleted`. Every
//! successful mutation and every creation is followed by an
//! `unread_count_update` for the affected user.

use crate::config::StoreConfig;
use crate::db::query::{self, BellItem, StoreStats, SystemPage, UnreadCounts};
use crate::db::{self, store};
use crate::directory::Directory;
use crate::engine;
use crate::error::ServiceError;
use crate::ids;
use crate::maintenance;
use crate::model::{MessageFields, MessageKind, Priority, Role};
use crate::sink::{NotificationSink, PushEvent, dispatch};
use crate::targeting::{self, TargetSpec};
use rusqlite::Connection;
use std::path::Path;

/// Creator recorded when another subsystem sends a message without one.
pub const SYSTEM_CREATOR: &str = "system";

/// A verified identity attached to a request by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
}

/// Caller-supplied content of a new message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub title: String,
    pub body: String,
    pub kind: MessageKind,
    pub priority: Priority,
    pub hide_creator: bool,
    pub expires_at_us: Option<i64>,
}

impl MessageDraft {
    #[must_use]
    pub fn new(title: &str, body: &str, kind: MessageKind) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            kind,
            priority: Priority::Normal,
            hide_creator: false,
            expires_at_us: None,
        }
    }
}

/// Result of a successful creation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CreatedMessage {
    pub message_id: String,
    pub recipient_count: usize,
}

/// Result of a welcome send; the second and later calls are `AlreadySent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WelcomeOutcome {
    Sent(CreatedMessage),
    AlreadySent,
}

/// Which projection a read/mutation request came through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Bell,
    System,
}

/// The notification subsystem behind one store connection.
pub struct NotificationService<D: Directory, S: NotificationSink> {
    conn: Connection,
    directory: D,
    sink: S,
    config: StoreConfig,
}

impl<D: Directory, S: NotificationSink> NotificationService<D, S> {
    /// Open (or create) the store at `path` and wrap it with the given ports.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the store cannot be opened or migrated.
    pub fn open(path: &Path, directory: D, sink: S) -> Result<Self, ServiceError> {
        let conn = db::open_store(path)?;
        Ok(Self::with_connection(conn, directory, sink))
    }

    /// Wrap an already-open connection (in-memory stores, tests).
    pub fn with_connection(conn: Connection, directory: D, sink: S) -> Self {
        Self {
            conn,
            directory,
            sink,
            config: StoreConfig::default(),
        }
    }

    /// Replace the default config (page bounds, retention).
    #[must_use]
    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// The underlying store connection.
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// The injected identity directory.
    pub const fn directory(&self) -> &D {
        &self.directory
    }

    /// The injected notification sink.
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    // -----------------------------------------------------------------------
    // Identity
    // -----------------------------------------------------------------------

    /// Resolve a request's user id into a verified [`Identity`].
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` when no id is supplied, the id is unknown to
    /// the directory, or the account is not active and verified.
    pub fn authenticate(&self, user_id: Option<&str>) -> Result<Identity, ServiceError> {
        let user_id = user_id.ok_or(ServiceError::AuthenticationRequired)?;
        let profile = self
            .directory
            .profile(user_id)?
            .ok_or(ServiceError::AuthenticationRequired)?;

        if !profile.is_targetable() {
            return Err(ServiceError::AuthenticationRequired);
        }

        Ok(Identity {
            user_id: profile.user_id,
            role: profile.role,
        })
    }

    // -----------------------------------------------------------------------
    // Creation paths
    // -----------------------------------------------------------------------

    /// Broadcast creation: role/all-users targeting with exclusions.
    ///
    /// # Errors
    ///
    /// `Forbidden` when the caller holds the lowest role tier; `Validation`
    /// on blank title/body; `Internal` on storage failure.
    pub fn broadcast(
        &mut self,
        identity: &Identity,
        draft: MessageDraft,
        spec: TargetSpec,
    ) -> Result<CreatedMessage, ServiceError> {
        if !identity.role.can_broadcast() {
            return Err(ServiceError::Forbidden {
                role: identity.role.to_string(),
                action: "create broadcasts",
            });
        }

        let creator = identity.user_id.clone();
        self.create_message(draft, spec, &creator)
    }

    /// Targeted creation for other subsystems: explicit recipient id list,
    /// defaulting to the system identity as creator.
    ///
    /// # Errors
    ///
    /// `Validation` on blank title/body; `Internal` on storage failure.
    pub fn create_targeted(
        &mut self,
        draft: MessageDraft,
        recipient_ids: &[String],
        creator: Option<&str>,
    ) -> Result<CreatedMessage, ServiceError> {
        let spec = TargetSpec::users(recipient_ids.iter().cloned());
        let creator = creator.unwrap_or(SYSTEM_CREATOR).to_string();
        self.create_message(draft, spec, &creator)
    }

    /// Idempotent welcome notification, gated on the profile's welcome flag.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown users; `Internal` on storage failure.
    pub fn send_welcome(&mut self, user_id: &str) -> Result<WelcomeOutcome, ServiceError> {
        let profile = self
            .directory
            .profile(user_id)?
            .ok_or_else(|| ServiceError::NotFound {
                what: "user",
                id: user_id.to_string(),
            })?;

        if profile.welcome_sent {
            return Ok(WelcomeOutcome::AlreadySent);
        }

        let draft = MessageDraft {
            hide_creator: true,
            ..MessageDraft::new(
                "Welcome to Muster",
                "Your account is ready. Browse upcoming events and sign up for a role.",
                MessageKind::Welcome,
            )
        };
        let created =
            self.create_message(draft, TargetSpec::users([user_id]), SYSTEM_CREATOR)?;
        self.directory.mark_welcome_sent(user_id)?;

        Ok(WelcomeOutcome::Sent(created))
    }

    /// Account-security notice for an authorization-level change. Single
    /// recipient, so the resolver records the dedicated addressing field.
    ///
    /// # Errors
    ///
    /// `Internal` on storage failure.
    pub fn notify_role_change(
        &mut self,
        user_id: &str,
        new_role: Role,
    ) -> Result<CreatedMessage, ServiceError> {
        let draft = MessageDraft::new(
            "Your authorization level changed",
            &format!("An administrator set your role to '{new_role}'."),
            MessageKind::AccountSecurity,
        );
        self.create_targeted(draft, &[user_id.to_string()], None)
    }

    // -----------------------------------------------------------------------
    // Per-user surfaces
    // -----------------------------------------------------------------------

    /// The identity's bell feed, newest first, read-annotated.
    ///
    /// # Errors
    ///
    /// `Internal` on storage failure.
    pub fn bell_feed(
        &self,
        identity: &Identity,
        limit: Option<u32>,
    ) -> Result<Vec<BellItem>, ServiceError> {
        let limit = self.config.effective_limit(limit);
        Ok(query::bell_feed(&self.conn, &identity.user_id, Some(limit))?)
    }

    /// One page of the identity's system-message list.
    ///
    /// # Errors
    ///
    /// `Validation` when `page` is 0; `Internal` on storage failure.
    pub fn system_messages(
        &self,
        identity: &Identity,
        kind: Option<MessageKind>,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<SystemPage, ServiceError> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(ServiceError::Validation("page must be >= 1".to_string()));
        }
        let limit = self.config.effective_limit(limit);
        Ok(query::system_page(
            &self.conn,
            &identity.user_id,
            kind,
            page,
            limit,
        )?)
    }

    /// The identity's unread counts across both projections.
    ///
    /// # Errors
    ///
    /// `Internal` on storage failure.
    pub fn unread_counts(&self, identity: &Identity) -> Result<UnreadCounts, ServiceError> {
        Ok(query::unread_counts(&self.conn, &identity.user_id)?)
    }

    // -----------------------------------------------------------------------
    // State mutations
    // -----------------------------------------------------------------------

    /// Mark one message read in both projections, regardless of surface.
    ///
    /// # Errors
    ///
    /// `Validation` on malformed id, `NotFound` for unknown message or
    /// missing state entry, `Internal` on storage failure.
    pub fn mark_read(
        &self,
        identity: &Identity,
        message_id: &str,
        surface: Surface,
    ) -> Result<(), ServiceError> {
        validate_message_id(message_id)?;
        let now = now_us();
        engine::mark_read_everywhere(&self.conn, message_id, &identity.user_id, now)?;

        let event = match surface {
            Surface::Bell => PushEvent::NotificationRead {
                message_id: message_id.to_string(),
                at_us: now,
            },
            Surface::System => PushEvent::MessageRead {
                message_id: message_id.to_string(),
                at_us: now,
            },
        };
        dispatch(&self.sink, &identity.user_id, &event);
        self.push_counts(&identity.user_id);
        Ok(())
    }

    /// Mark every unread, bell-visible message read. Returns how many
    /// messages changed.
    ///
    /// # Errors
    ///
    /// `Internal` on storage failure.
    pub fn mark_all_read(&self, identity: &Identity) -> Result<usize, ServiceError> {
        let now = now_us();
        let affected = engine::mark_all_unread_bell_read(&self.conn, &identity.user_id, now)?;

        for message_id in &affected {
            dispatch(
                &self.sink,
                &identity.user_id,
                &PushEvent::NotificationRead {
                    message_id: message_id.clone(),
                    at_us: now,
                },
            );
        }
        if !affected.is_empty() {
            self.push_counts(&identity.user_id);
        }
        Ok(affected.len())
    }

    /// Remove one message from the identity's bell feed.
    ///
    /// # Errors
    ///
    /// `Validation` on malformed id, `NotFound` for unknown message or
    /// missing state entry, `Internal` on storage failure.
    pub fn remove_from_bell(
        &self,
        identity: &Identity,
        message_id: &str,
    ) -> Result<(), ServiceError> {
        validate_message_id(message_id)?;
        let now = now_us();
        engine::remove_from_bell(&self.conn, message_id, &identity.user_id, now)?;

        dispatch(
            &self.sink,
            &identity.user_id,
            &PushEvent::NotificationRemoved {
                message_id: message_id.to_string(),
                at_us: now,
            },
        );
        self.push_counts(&identity.user_id);
        Ok(())
    }

    /// Delete one message from the identity's system list.
    ///
    /// # Errors
    ///
    /// `Validation` on malformed id, `NotFound` for unknown message or
    /// missing state entry, `Internal` on storage failure.
    pub fn delete_from_system(
        &self,
        identity: &Identity,
        message_id: &str,
    ) -> Result<(), ServiceError> {
        validate_message_id(message_id)?;
        let now = now_us();
        engine::delete_from_system(&self.conn, message_id, &identity.user_id, now)?;

        dispatch(
            &self.sink,
            &identity.user_id,
            &PushEvent::MessageDeleted {
                message_id: message_id.to_string(),
                at_us: now,
            },
        );
        self.push_counts(&identity.user_id);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Maintenance
    // -----------------------------------------------------------------------

    /// Deactivate expired messages. Returns the number swept.
    ///
    /// # Errors
    ///
    /// `Internal` on storage failure.
    pub fn sweep_expired(&self) -> Result<u64, ServiceError> {
        Ok(maintenance::sweep_expired(&self.conn, now_us())?)
    }

    /// Remove legacy orphaned recipient rows. Returns the number purged.
    ///
    /// # Errors
    ///
    /// `Internal` on storage failure.
    pub fn purge_orphans(&self) -> Result<u64, ServiceError> {
        Ok(maintenance::purge_orphans(&self.conn)?)
    }

    /// Store-level aggregate stats.
    ///
    /// # Errors
    ///
    /// `Internal` on storage failure.
    pub fn stats(&self) -> Result<StoreStats, ServiceError> {
        Ok(query::stats(&self.conn)?)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn create_message(
        &mut self,
        draft: MessageDraft,
        spec: TargetSpec,
        creator: &str,
    ) -> Result<CreatedMessage, ServiceError> {
        validate_draft(&draft)?;

        let recipients = targeting::resolve(&self.directory, &spec, Some(creator))?;
        let now = now_us();

        let sole_recipient = if draft.kind.is_account_security() && recipients.len() == 1 {
            recipients.iter().next().cloned()
        } else {
            None
        };

        let fields = MessageFields {
            id: ids::new_message_id(),
            title: draft.title.trim().to_string(),
            body: draft.body.trim().to_string(),
            kind: draft.kind,
            priority: draft.priority,
            creator: Some(creator.to_string()),
            hide_creator: draft.hide_creator || !spec.include_creator,
            sole_recipient,
            targeted_roles: spec.role_snapshot(),
            excluded: spec.exclude.clone(),
            is_active: true,
            created_at_us: now,
            expires_at_us: draft.expires_at_us,
        };

        store::insert_message(&mut self.conn, &fields, &recipients)?;
        tracing::info!(
            message_id = fields.id,
            kind = %fields.kind,
            recipients = recipients.len(),
            "message created"
        );

        for recipient in &recipients {
            dispatch(
                &self.sink,
                recipient,
                &PushEvent::MessageCreated {
                    message_id: fields.id.clone(),
                    at_us: now,
                },
            );
            self.push_counts(recipient);
        }

        Ok(CreatedMessage {
            message_id: fields.id,
            recipient_count: recipients.len(),
        })
    }

    /// Push freshly computed unread counts; best-effort like all hooks.
    fn push_counts(&self, user_id: &str) {
        match query::unread_counts(&self.conn, user_id) {
            Ok(counts) => dispatch(&self.sink, user_id, &PushEvent::counts(counts)),
            Err(error) => {
                tracing::warn!(user = user_id, error = %error, "unread recount failed");
            }
        }
    }
}

fn validate_draft(draft: &MessageDraft) -> Result<(), ServiceError> {
    if draft.title.trim().is_empty() {
        return Err(ServiceError::Validation("title must not be empty".to_string()));
    }
    if draft.body.trim().is_empty() {
        return Err(ServiceError::Validation("content must not be empty".to_string()));
    }
    Ok(())
}

fn validate_message_id(message_id: &str) -> Result<(), ServiceError> {
    if ids::is_valid_message_id(message_id) {
        Ok(())
    } else {
        Err(ServiceError::Validation(format!(
            "malformed message id '{message_id}'"
        )))
    }
}

fn now_us() -> i64 {
    chrono::Utc::now().timestamp_micros()
}

#[cfg(test)]
mod tests {
    use super::{MessageDraft, NotificationService, Surface, WelcomeOutcome};
    use crate::db::open_in_memory;
    use crate::directory::{StaticDirectory, UserProfile};
    use crate::error::ServiceError;
    use crate::model::{MessageKind, Role};
    use crate::sink::{MemorySink, PushEvent};
    use crate::targeting::TargetSpec;

    fn roster() -> StaticDirectory {
        StaticDirectory::new([
            UserProfile::with_role("vol-ada", Role::Admin),
            UserProfile::with_role("vol-lea", Role::Leader),
            UserProfile::member("vol-mia"),
            UserProfile::member("vol-noa"),
        ])
    }

    fn service() -> NotificationService<StaticDirectory, MemorySink> {
        let conn = open_in_memory().expect("open store");
        NotificationService::with_connection(conn, roster(), MemorySink::new())
    }

    fn draft(title: &str) -> MessageDraft {
        MessageDraft::new(title, "body text", MessageKind::Announcement)
    }

    #[test]
    fn authenticate_requires_a_known_verified_user() {
        let svc = service();

        assert!(matches!(
            svc.authenticate(None),
            Err(ServiceError::AuthenticationRequired)
        ));
        assert!(matches!(
            svc.authenticate(Some("vol-ghost")),
            Err(ServiceError::AuthenticationRequired)
        ));

        let identity = svc.authenticate(Some("vol-lea")).expect("identity");
        assert_eq!(identity.role, Role::Leader);
    }

    #[test]
    fn members_cannot_broadcast() {
        let mut svc = service();
        let member = svc.authenticate(Some("vol-mia")).expect("identity");

        let result = svc.broadcast(&member, draft("Hello"), TargetSpec::all_users());
        assert!(matches!(result, Err(ServiceError::Forbidden { .. })));
    }

    #[test]
    fn broadcast_reaches_role_members_minus_exclusions() {
        let mut svc = service();
        let admin = svc.authenticate(Some("vol-ada")).expect("identity");

        let created = svc
            .broadcast(
                &admin,
                draft("Leaders meeting"),
                TargetSpec::roles([Role::Leader, Role::Admin]).excluding(["vol-lea"]),
            )
            .expect("broadcast");

        // vol-ada is the only Leader/Admin left after excluding vol-lea.
        assert_eq!(created.recipient_count, 1);

        let identity = svc.authenticate(Some("vol-ada")).expect("identity");
        let feed = svc.bell_feed(&identity, None).expect("feed");
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].message_id, created.message_id);
    }

    #[test]
    fn blank_drafts_are_rejected() {
        let mut svc = service();
        let admin = svc.authenticate(Some("vol-ada")).expect("identity");

        let blank_title = svc.broadcast(&admin, draft("   "), TargetSpec::all_users());
        assert!(matches!(blank_title, Err(ServiceError::Validation(_))));

        let blank_body = svc.broadcast(
            &admin,
            MessageDraft::new("Title", "  ", MessageKind::Announcement),
            TargetSpec::all_users(),
        );
        assert!(matches!(blank_body, Err(ServiceError::Validation(_))));
    }

    #[test]
    fn empty_resolved_set_is_a_successful_no_op() {
        let mut svc = service();
        let admin = svc.authenticate(Some("vol-ada")).expect("identity");

        let created = svc
            .broadcast(
                &admin,
                draft("Nobody home"),
                TargetSpec::users(["vol-mia"]).excluding(["vol-mia"]),
            )
            .expect("create");
        assert_eq!(created.recipient_count, 0);
    }

    #[test]
    fn creator_hiding_is_implied_by_exclude_creator() {
        let mut svc = service();
        let admin = svc.authenticate(Some("vol-ada")).expect("identity");

        svc.broadcast(
            &admin,
            draft("Anonymous notice"),
            TargetSpec::users(["vol-mia"]),
        )
        .expect("create");
        svc.broadcast(
            &admin,
            draft("Attributed notice"),
            TargetSpec::users(["vol-mia"]).with_creator(),
        )
        .expect("create");

        let mia = svc.authenticate(Some("vol-mia")).expect("identity");
        let feed = svc.bell_feed(&mia, None).expect("feed");

        let anonymous = feed
            .iter()
            .find(|item| item.title == "Anonymous notice")
            .expect("present");
        assert!(anonymous.creator.is_none());

        let attributed = feed
            .iter()
            .find(|item| item.title == "Attributed notice")
            .expect("present");
        assert_eq!(attributed.creator.as_deref(), Some("vol-ada"));
    }

    #[test]
    fn targeted_creation_defaults_to_the_system_creator() {
        let mut svc = service();
        let created = svc
            .create_targeted(
                MessageDraft::new("Shift assigned", "You are on setup duty.", MessageKind::Assignment),
                &["vol-mia".to_string(), "vol-noa".to_string()],
                None,
            )
            .expect("create");
        assert_eq!(created.recipient_count, 2);

        let mia = svc.authenticate(Some("vol-mia")).expect("identity");
        let page = svc
            .system_messages(&mia, Some(MessageKind::Assignment), None, None)
            .expect("page");
        assert_eq!(page.total, 1);
        // include_creator defaults to false, so attribution is hidden.
        assert!(page.items[0].creator.is_none());
    }

    #[test]
    fn welcome_is_idempotent() {
        let mut svc = service();

        let first = svc.send_welcome("vol-noa").expect("welcome");
        assert!(matches!(first, WelcomeOutcome::Sent(_)));

        let second = svc.send_welcome("vol-noa").expect("welcome again");
        assert!(matches!(second, WelcomeOutcome::AlreadySent));

        let noa = svc.authenticate(Some("vol-noa")).expect("identity");
        let page = svc
            .system_messages(&noa, Some(MessageKind::Welcome), None, None)
            .expect("page");
        assert_eq!(page.total, 1);

        let unknown = svc.send_welcome("vol-ghost");
        assert!(matches!(unknown, Err(ServiceError::NotFound { .. })));
    }

    #[test]
    fn role_change_notice_records_the_sole_recipient() {
        let mut svc = service();
        let created = svc
            .notify_role_change("vol-mia", Role::Leader)
            .expect("notice");

        let mia = svc.authenticate(Some("vol-mia")).expect("identity");
        let page = svc
            .system_messages(&mia, Some(MessageKind::AccountSecurity), None, None)
            .expect("page");
        assert_eq!(page.items[0].message_id, created.message_id);
        assert_eq!(page.items[0].sole_recipient.as_deref(), Some("vol-mia"));
    }

    #[test]
    fn surface_determines_the_read_event_name() {
        let mut svc = service();
        let created_a = svc
            .create_targeted(draft("A"), &["vol-mia".to_string()], None)
            .expect("create");
        let created_b = svc
            .create_targeted(draft("B"), &["vol-mia".to_string()], None)
            .expect("create");

        let mia = svc.authenticate(Some("vol-mia")).expect("identity");
        svc.mark_read(&mia, &created_a.message_id, Surface::Bell)
            .expect("read bell");
        svc.mark_read(&mia, &created_b.message_id, Surface::System)
            .expect("read system");

        let events = svc_events(&svc);
        assert!(events.iter().any(|e| matches!(
            e,
            PushEvent::NotificationRead { message_id, .. } if *message_id == created_a.message_id
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            PushEvent::MessageRead { message_id, .. } if *message_id == created_b.message_id
        )));
    }

    #[test]
    fn every_mutation_is_followed_by_a_count_update() {
        let mut svc = service();
        let created = svc
            .create_targeted(draft("A"), &["vol-mia".to_string()], None)
            .expect("create");

        let mia = svc.authenticate(Some("vol-mia")).expect("identity");
        svc.remove_from_bell(&mia, &created.message_id)
            .expect("remove");

        let events = svc_events(&svc);
        let last = events.last().expect("events recorded");
        assert!(matches!(
            last,
            PushEvent::UnreadCountUpdate { bell: 0, system: 1, total: 1 }
        ));
    }

    #[test]
    fn malformed_ids_fail_validation_before_the_store() {
        let svc = service();
        let mia = svc.authenticate(Some("vol-mia")).expect("identity");

        let result = svc.mark_read(&mia, "not-an-id", Surface::Bell);
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[test]
    fn mark_all_read_reports_the_changed_count() {
        let mut svc = service();
        for title in ["A", "B", "C"] {
            svc.create_targeted(draft(title), &["vol-mia".to_string()], None)
                .expect("create");
        }

        let mia = svc.authenticate(Some("vol-mia")).expect("identity");
        assert_eq!(svc.mark_all_read(&mia).expect("bulk"), 3);
        assert_eq!(svc.mark_all_read(&mia).expect("bulk again"), 0);

        let counts = svc.unread_counts(&mia).expect("counts");
        assert_eq!(counts.total, 0);
    }

    fn svc_events(svc: &NotificationService<StaticDirectory, MemorySink>) -> Vec<PushEvent> {
        svc.sink.pushed_to("vol-mia")
    }
}
