//! File-backed stand-in for the platform's identity collaborator.
//!
//! Production deployments resolve identities against the user service; the
//! CLI reads a TOML roster at `.muster/roster.toml` instead and implements
//! the same [`Directory`] port. The welcome flag flip is written back to the
//! file so the idempotency gate survives across invocations.

use anyhow::{Context, Result};
use muster_core::directory::{Directory, UserProfile};
use muster_core::model::Role;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Serialize, Deserialize, Default)]
struct RosterFile {
    #[serde(default)]
    users: Vec<RosterEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RosterEntry {
    id: String,
    role: Role,
    #[serde(default = "default_true")]
    active: bool,
    #[serde(default = "default_true")]
    verified: bool,
    #[serde(default)]
    welcome_sent: bool,
}

const fn default_true() -> bool {
    true
}

impl From<&RosterEntry> for UserProfile {
    fn from(entry: &RosterEntry) -> Self {
        Self {
            user_id: entry.id.clone(),
            role: entry.role,
            is_active: entry.active,
            is_verified: entry.verified,
            welcome_sent: entry.welcome_sent,
        }
    }
}

/// The roster-backed [`Directory`] implementation.
#[derive(Debug)]
pub struct Roster {
    path: PathBuf,
    users: Mutex<BTreeMap<String, RosterEntry>>,
}

impl Roster {
    /// Load the roster file. A missing file yields an empty roster so
    /// read-only commands still work in a fresh project.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let file = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("read roster {}", path.display()))?;
            toml::from_str::<RosterFile>(&raw)
                .with_context(|| format!("parse roster {}", path.display()))?
        } else {
            tracing::debug!(path = %path.display(), "no roster file, starting empty");
            RosterFile::default()
        };

        let users = file
            .users
            .into_iter()
            .map(|entry| (entry.id.clone(), entry))
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            users: Mutex::new(users),
        })
    }

    /// Write a commented starter roster, used by `mst init`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_template(path: &Path) -> Result<()> {
        const TEMPLATE: &str = "\
# Muster roster: the identity snapshot this CLI resolves users against.
# Each entry mirrors the fields the platform's user service would supply.
#
# [[users]]
# id = \"vol-ada\"
# role = \"admin\"          # member | leader | admin
# active = true
# verified = true
# welcome_sent = false
";
        std::fs::write(path, TEMPLATE)
            .with_context(|| format!("write roster template {}", path.display()))
    }

    fn persist(&self, users: &BTreeMap<String, RosterEntry>) -> Result<()> {
        let file = RosterFile {
            users: users.values().cloned().collect(),
        };
        let rendered = toml::to_string_pretty(&file).context("render roster")?;
        std::fs::write(&self.path, rendered)
            .with_context(|| format!("write roster {}", self.path.display()))
    }
}

impl Directory for Roster {
    fn users_with_roles(&self, roles: &[Role]) -> Result<Vec<String>> {
        let users = self.users.lock().expect("roster lock poisoned");
        Ok(users
            .values()
            .map(UserProfile::from)
            .filter(|p| p.is_targetable() && roles.contains(&p.role))
            .map(|p| p.user_id)
            .collect())
    }

    fn all_users(&self) -> Result<Vec<String>> {
        let users = self.users.lock().expect("roster lock poisoned");
        Ok(users
            .values()
            .map(UserProfile::from)
            .filter(UserProfile::is_targetable)
            .map(|p| p.user_id)
            .collect())
    }

    fn profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let users = self.users.lock().expect("roster lock poisoned");
        Ok(users.get(user_id).map(UserProfile::from))
    }

    fn mark_welcome_sent(&self, user_id: &str) -> Result<()> {
        let mut users = self.users.lock().expect("roster lock poisoned");
        if let Some(entry) = users.get_mut(user_id) {
            entry.welcome_sent = true;
            self.persist(&users)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Roster;
    use muster_core::directory::Directory;
    use muster_core::model::Role;

    const SAMPLE: &str = r#"
[[users]]
id = "vol-ada"
role = "admin"

[[users]]
id = "vol-mia"
role = "member"
welcome_sent = false

[[users]]
id = "vol-old"
role = "leader"
active = false
"#;

    fn sample_roster(dir: &std::path::Path) -> Roster {
        let path = dir.join("roster.toml");
        std::fs::write(&path, SAMPLE).expect("write roster");
        Roster::load(&path).expect("load roster")
    }

    #[test]
    fn loads_entries_with_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let roster = sample_roster(dir.path());

        let ada = roster
            .profile("vol-ada")
            .expect("lookup")
            .expect("profile");
        assert_eq!(ada.role, Role::Admin);
        assert!(ada.is_active && ada.is_verified);

        let targets = roster.all_users().expect("lookup");
        assert_eq!(targets, vec!["vol-ada".to_string(), "vol-mia".to_string()]);
    }

    #[test]
    fn missing_file_is_an_empty_roster() {
        let dir = tempfile::tempdir().expect("tempdir");
        let roster = Roster::load(&dir.path().join("absent.toml")).expect("load");
        assert!(roster.all_users().expect("lookup").is_empty());
    }

    #[test]
    fn welcome_flip_survives_a_reload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let roster = sample_roster(dir.path());

        roster.mark_welcome_sent("vol-mia").expect("flip");

        let reloaded = Roster::load(&dir.path().join("roster.toml")).expect("reload");
        assert!(
            reloaded
                .profile("vol-mia")
                .expect("lookup")
                .expect("profile")
                .welcome_sent
        );
    }

    #[test]
    fn template_parses_as_an_empty_roster() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("roster.toml");
        Roster::write_template(&path).expect("template");

        let roster = Roster::load(&path).expect("load");
        assert!(roster.all_users().expect("lookup").is_empty());
    }
}
