//! `mst init` — initialize a muster project.

use crate::output::{OutputMode, render_success};
use crate::roster::Roster;
use crate::workspace::{ROSTER_FILE, STORE_FILE};
use anyhow::{Context, Result};
use clap::Args;
use muster_core::{config, db};
use std::path::Path;

#[derive(Args, Debug)]
pub struct InitArgs {}

pub fn run(_args: &InitArgs, output: OutputMode, dir: &Path) -> Result<()> {
    let muster_dir = dir.join(".muster");
    std::fs::create_dir_all(&muster_dir)
        .with_context(|| format!("create {}", muster_dir.display()))?;

    config::write_default_config(dir)?;

    let store_path = muster_dir.join(STORE_FILE);
    let _conn = db::open_store(&store_path)?;

    let roster_path = muster_dir.join(ROSTER_FILE);
    if !roster_path.exists() {
        Roster::write_template(&roster_path)?;
    }

    tracing::info!(root = %dir.display(), "initialized muster project");
    render_success(
        output,
        "Initialized .muster (store, config.toml, roster.toml)",
    )
}
