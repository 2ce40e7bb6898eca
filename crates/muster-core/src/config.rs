use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Project-level configuration, stored at `.muster/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub paging: PagingConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagingConfig {
    /// Page size used when the caller does not ask for one.
    #[serde(default = "default_page_limit")]
    pub default_limit: u32,
    /// Upper bound applied to caller-supplied page sizes.
    #[serde(default = "default_max_limit")]
    pub max_limit: u32,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_limit: default_page_limit(),
            max_limit: default_max_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Days before a broadcast expires when the creator sets no explicit
    /// expiry. `None` keeps broadcasts active until swept manually.
    #[serde(default = "default_broadcast_ttl_days")]
    pub broadcast_ttl_days: Option<u32>,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            broadcast_ttl_days: default_broadcast_ttl_days(),
        }
    }
}

const fn default_page_limit() -> u32 {
    20
}

const fn default_max_limit() -> u32 {
    100
}

const fn default_broadcast_ttl_days() -> Option<u32> {
    Some(90)
}

impl StoreConfig {
    /// Clamp a caller-supplied page size into the configured bounds, falling
    /// back to the default when absent.
    #[must_use]
    pub fn effective_limit(&self, requested: Option<u32>) -> u32 {
        match requested {
            None => self.paging.default_limit,
            Some(0) => 1,
            Some(n) if n > self.paging.max_limit => self.paging.max_limit,
            Some(n) => n,
        }
    }
}

/// Load the project config, falling back to defaults when the file is
/// missing.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(project_root: &Path) -> Result<StoreConfig> {
    let path = project_root.join(".muster/config.toml");
    if !path.exists() {
        return Ok(StoreConfig::default());
    }

    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("read config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parse config {}", path.display()))
}

/// Write the default config file for `init`.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(project_root: &Path) -> Result<()> {
    let dir = project_root.join(".muster");
    std::fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;

    let path = dir.join("config.toml");
    let rendered =
        toml::to_string_pretty(&StoreConfig::default()).context("render default config")?;
    std::fs::write(&path, rendered).with_context(|| format!("write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::{StoreConfig, load_config, write_default_config};

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_config(dir.path()).expect("load");
        assert_eq!(config.paging.default_limit, 20);
        assert_eq!(config.paging.max_limit, 100);
        assert_eq!(config.retention.broadcast_ttl_days, Some(90));
    }

    #[test]
    fn partial_file_keeps_defaults_for_absent_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join(".muster")).expect("mkdir");
        std::fs::write(
            dir.path().join(".muster/config.toml"),
            "[paging]\ndefault_limit = 5\n",
        )
        .expect("write");

        let config = load_config(dir.path()).expect("load");
        assert_eq!(config.paging.default_limit, 5);
        assert_eq!(config.paging.max_limit, 100);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join(".muster")).expect("mkdir");
        std::fs::write(dir.path().join(".muster/config.toml"), "paging = 12")
            .expect("write");

        assert!(load_config(dir.path()).is_err());
    }

    #[test]
    fn default_config_roundtrips_through_init() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_default_config(dir.path()).expect("write default");
        let config = load_config(dir.path()).expect("load");
        assert_eq!(config.paging.default_limit, 20);
    }

    #[test]
    fn effective_limit_clamps_to_bounds() {
        let config = StoreConfig::default();
        assert_eq!(config.effective_limit(None), 20);
        assert_eq!(config.effective_limit(Some(0)), 1);
        assert_eq!(config.effective_limit(Some(50)), 50);
        assert_eq!(config.effective_limit(Some(5_000)), 100);
    }
}
