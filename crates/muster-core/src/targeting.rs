//! Targeting resolver: turns a creation request into a frozen recipient set.
//!
//! Resolution happens exactly once, at creation time. Role membership is
//! snapshotted through the [`Directory`] port and persisted with the message
//! for audit; later role changes never add or remove recipients.

use crate::directory::Directory;
use crate::model::Role;
use anyhow::Result;
use std::collections::BTreeSet;

/// Who a creation request addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    /// An explicit id list supplied by another subsystem.
    Users(Vec<String>),
    /// Everyone currently holding any of these roles.
    Roles(Vec<Role>),
    /// Every targetable user.
    AllUsers,
}

/// A creation request's targeting rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub audience: Audience,
    /// Users dropped from the resolved set. Exclusion always wins over
    /// inclusion, including over `include_creator`.
    pub exclude: Vec<String>,
    /// Whether the creator receives their own message.
    pub include_creator: bool,
}

impl TargetSpec {
    /// Address an explicit list of users.
    #[must_use]
    pub fn users(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            audience: Audience::Users(ids.into_iter().map(Into::into).collect()),
            exclude: Vec::new(),
            include_creator: false,
        }
    }

    /// Address every current holder of the given roles.
    #[must_use]
    pub fn roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            audience: Audience::Roles(roles.into_iter().collect()),
            exclude: Vec::new(),
            include_creator: false,
        }
    }

    /// Address every targetable user.
    #[must_use]
    pub const fn all_users() -> Self {
        Self {
            audience: Audience::AllUsers,
            exclude: Vec::new(),
            include_creator: false,
        }
    }

    /// Drop these users from the resolved set.
    #[must_use]
    pub fn excluding(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exclude.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Deliver to the creator as well.
    #[must_use]
    pub const fn with_creator(mut self) -> Self {
        self.include_creator = true;
        self
    }

    /// The audit snapshot of the role filter, if any.
    #[must_use]
    pub fn role_snapshot(&self) -> Vec<Role> {
        match &self.audience {
            Audience::Roles(roles) => roles.clone(),
            Audience::Users(_) | Audience::AllUsers => Vec::new(),
        }
    }
}

/// Resolve a targeting spec into a deduplicated, order-irrelevant recipient
/// set. An empty result is valid and not an error.
///
/// # Errors
///
/// Returns an error if the directory lookup fails.
pub fn resolve(
    directory: &dyn Directory,
    spec: &TargetSpec,
    creator: Option<&str>,
) -> Result<BTreeSet<String>> {
    let mut recipients: BTreeSet<String> = match &spec.audience {
        Audience::Users(ids) => ids.iter().cloned().collect(),
        Audience::Roles(roles) => directory.users_with_roles(roles)?.into_iter().collect(),
        Audience::AllUsers => directory.all_users()?.into_iter().collect(),
    };

    if spec.include_creator {
        if let Some(creator) = creator {
            recipients.insert(creator.to_string());
        }
    }

    for excluded in &spec.exclude {
        recipients.remove(excluded);
    }

    Ok(recipients)
}

#[cfg(test)]
mod tests {
    use super::{Audience, TargetSpec, resolve};
    use crate::directory::{StaticDirectory, UserProfile};
    use crate::model::Role;

    fn roster() -> StaticDirectory {
        StaticDirectory::new([
            UserProfile::with_role("vol-ada", Role::Admin),
            UserProfile::with_role("vol-lea", Role::Leader),
            UserProfile::with_role("vol-lou", Role::Leader),
            UserProfile::member("vol-mia"),
        ])
    }

    #[test]
    fn explicit_lists_are_deduplicated() {
        let dir = roster();
        let spec = TargetSpec::users(["vol-mia", "vol-mia", "vol-lea"]);
        let set = resolve(&dir, &spec, None).expect("resolve");
        assert_eq!(set.len(), 2);
        assert!(set.contains("vol-mia"));
        assert!(set.contains("vol-lea"));
    }

    #[test]
    fn role_targeting_snapshots_current_membership() {
        let dir = roster();
        let spec = TargetSpec::roles([Role::Leader, Role::Admin]);
        let set = resolve(&dir, &spec, None).expect("resolve");
        assert_eq!(set.len(), 3);
        assert!(!set.contains("vol-mia"));
    }

    #[test]
    fn exclusion_wins_over_role_membership_and_creator() {
        let dir = roster();
        let spec = TargetSpec::roles([Role::Leader])
            .excluding(["vol-lou", "vol-ada"])
            .with_creator();
        let set = resolve(&dir, &spec, Some("vol-ada")).expect("resolve");
        assert_eq!(set.len(), 1);
        assert!(set.contains("vol-lea"));
    }

    #[test]
    fn include_creator_adds_the_creator_once() {
        let dir = roster();
        let spec = TargetSpec::users(["vol-mia"]).with_creator();
        let set = resolve(&dir, &spec, Some("vol-ada")).expect("resolve");
        assert_eq!(set.len(), 2);
        assert!(set.contains("vol-ada"));

        // No creator supplied: the flag is inert.
        let without = resolve(&dir, &spec, None).expect("resolve");
        assert_eq!(without.len(), 1);
    }

    #[test]
    fn empty_resolution_is_valid() {
        let dir = StaticDirectory::default();
        let spec = TargetSpec::all_users();
        let set = resolve(&dir, &spec, None).expect("resolve");
        assert!(set.is_empty());

        let excluded_away = TargetSpec::users(["vol-mia"]).excluding(["vol-mia"]);
        let set = resolve(&roster(), &excluded_away, None).expect("resolve");
        assert!(set.is_empty());
    }

    #[test]
    fn role_snapshot_only_records_role_filters() {
        assert_eq!(
            TargetSpec::roles([Role::Admin]).role_snapshot(),
            vec![Role::Admin]
        );
        assert!(TargetSpec::users(["vol-mia"]).role_snapshot().is_empty());
        assert!(
            TargetSpec {
                audience: Audience::AllUsers,
                exclude: Vec::new(),
                include_creator: false,
            }
            .role_snapshot()
            .is_empty()
        );
    }
}
