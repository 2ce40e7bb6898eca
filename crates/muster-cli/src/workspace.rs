//! Project discovery and service wiring.
//!
//! A Muster project is any directory containing `.muster/`; commands walk up
//! from the working directory to find it, then open the store and roster
//! that live inside.

use crate::roster::Roster;
use anyhow::{Context, Result, bail};
use muster_core::NotificationService;
use muster_core::config::{self, StoreConfig};
use muster_core::sink::LogSink;
use std::path::{Path, PathBuf};

/// Name of the store file inside `.muster/`.
pub const STORE_FILE: &str = "notifications.sqlite3";

/// Name of the roster file inside `.muster/`.
pub const ROSTER_FILE: &str = "roster.toml";

/// A discovered project: root directory plus its parsed config.
pub struct Workspace {
    pub root: PathBuf,
    pub config: StoreConfig,
}

impl Workspace {
    /// Walk up from `start` looking for a `.muster/` directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no project is found or the config fails to parse.
    pub fn discover(start: &Path) -> Result<Self> {
        let Some(root) = find_root(start) else {
            bail!("not a muster project (run `mst init` first)");
        };
        let config = config::load_config(&root)?;
        Ok(Self { root, config })
    }

    /// Discover from the current working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no project is found or the config fails to parse.
    pub fn discover_from_cwd() -> Result<Self> {
        let cwd = std::env::current_dir().context("resolve working directory")?;
        Self::discover(&cwd)
    }

    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        self.root.join(".muster").join(STORE_FILE)
    }

    #[must_use]
    pub fn roster_path(&self) -> PathBuf {
        self.root.join(".muster").join(ROSTER_FILE)
    }

    /// Open the notification service over this project's store and roster.
    ///
    /// # Errors
    ///
    /// Returns an error if the store or roster cannot be opened.
    pub fn open_service(&self) -> Result<NotificationService<Roster, LogSink>> {
        let roster = Roster::load(&self.roster_path())?;
        let service = NotificationService::open(&self.store_path(), roster, LogSink)
            .map_err(anyhow::Error::from)?
            .with_config(self.config.clone());
        Ok(service)
    }
}

fn find_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".muster").is_dir())
        .map(Path::to_path_buf)
}
