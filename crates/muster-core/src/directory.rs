//! Port to the external identity/role collaborator.
//!
//! The platform's user service owns accounts, roles, and the welcome flag;
//! this crate only consumes a snapshot of them. The [`Directory`] trait is
//! the seam: the CLI backs it with a roster file, tests with
//! [`StaticDirectory`].

use crate::model::Role;
use anyhow::Result;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// The slice of a user record this subsystem consults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: String,
    pub role: Role,
    pub is_active: bool,
    pub is_verified: bool,
    /// Idempotency gate for the welcome notification.
    pub welcome_sent: bool,
}

impl UserProfile {
    /// A verified, active member profile — the common case in tests.
    #[must_use]
    pub fn member(user_id: &str) -> Self {
        Self::with_role(user_id, Role::Member)
    }

    /// A verified, active profile with the given role.
    #[must_use]
    pub fn with_role(user_id: &str, role: Role) -> Self {
        Self {
            user_id: user_id.to_string(),
            role,
            is_active: true,
            is_verified: true,
            welcome_sent: false,
        }
    }

    /// Whether role-filtered targeting may select this user.
    #[must_use]
    pub const fn is_targetable(&self) -> bool {
        self.is_active && self.is_verified
    }
}

/// Read access to the identity collaborator, plus the one write-back this
/// subsystem performs (the welcome flag flip).
pub trait Directory {
    /// Snapshot the ids of targetable users currently holding any of the
    /// given roles. Called once per creation; never re-evaluated.
    ///
    /// # Errors
    ///
    /// Returns an error if the collaborator cannot be reached.
    fn users_with_roles(&self, roles: &[Role]) -> Result<Vec<String>>;

    /// Snapshot the ids of all targetable users.
    ///
    /// # Errors
    ///
    /// Returns an error if the collaborator cannot be reached.
    fn all_users(&self) -> Result<Vec<String>>;

    /// Look up one user's profile. Returns `None` for unknown ids.
    ///
    /// # Errors
    ///
    /// Returns an error if the collaborator cannot be reached.
    fn profile(&self, user_id: &str) -> Result<Option<UserProfile>>;

    /// Record that the welcome notification has been sent.
    ///
    /// # Errors
    ///
    /// Returns an error if the flag cannot be persisted.
    fn mark_welcome_sent(&self, user_id: &str) -> Result<()>;
}

/// In-memory [`Directory`] over a fixed set of profiles.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    users: Mutex<BTreeMap<String, UserProfile>>,
}

impl StaticDirectory {
    #[must_use]
    pub fn new(profiles: impl IntoIterator<Item = UserProfile>) -> Self {
        let users = profiles
            .into_iter()
            .map(|p| (p.user_id.clone(), p))
            .collect();
        Self {
            users: Mutex::new(users),
        }
    }

    /// Insert or replace a profile. Lets tests mutate role membership after
    /// a message was created to verify frozen targeting.
    pub fn upsert(&self, profile: UserProfile) {
        let mut users = self.users.lock().expect("directory lock poisoned");
        users.insert(profile.user_id.clone(), profile);
    }
}

impl Directory for StaticDirectory {
    fn users_with_roles(&self, roles: &[Role]) -> Result<Vec<String>> {
        let users = self.users.lock().expect("directory lock poisoned");
        Ok(users
            .values()
            .filter(|p| p.is_targetable() && roles.contains(&p.role))
            .map(|p| p.user_id.clone())
            .collect())
    }

    fn all_users(&self) -> Result<Vec<String>> {
        let users = self.users.lock().expect("directory lock poisoned");
        Ok(users
            .values()
            .filter(|p| p.is_targetable())
            .map(|p| p.user_id.clone())
            .collect())
    }

    fn profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let users = self.users.lock().expect("directory lock poisoned");
        Ok(users.get(user_id).cloned())
    }

    fn mark_welcome_sent(&self, user_id: &str) -> Result<()> {
        let mut users = self.users.lock().expect("directory lock poisoned");
        if let Some(profile) = users.get_mut(user_id) {
            profile.welcome_sent = true;
        }
        Ok(())
    }
}
