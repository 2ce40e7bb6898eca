//! `mst cleanup` — remove legacy orphaned recipient rows.

use crate::output::{OutputMode, render_success};
use crate::workspace::Workspace;
use anyhow::Result;
use clap::Args;

#[derive(Args, Debug)]
pub struct CleanupArgs {}

pub fn run(_args: &CleanupArgs, output: OutputMode) -> Result<()> {
    let ws = Workspace::discover_from_cwd()?;
    let service = ws.open_service()?;

    let purged = service.purge_orphans()?;
    render_success(output, &format!("purged {purged} orphaned recipient rows"))
}
