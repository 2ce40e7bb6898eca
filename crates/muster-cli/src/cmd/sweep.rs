//! `mst sweep` — deactivate expired messages.
//!
//! Safe to run from cron or by hand; re-running is a no-op.

use crate::output::{OutputMode, render_success};
use crate::workspace::Workspace;
use anyhow::Result;
use clap::Args;

#[derive(Args, Debug)]
pub struct SweepArgs {}

pub fn run(_args: &SweepArgs, output: OutputMode) -> Result<()> {
    let ws = Workspace::discover_from_cwd()?;
    let service = ws.open_service()?;

    let swept = service.sweep_expired()?;
    render_success(output, &format!("deactivated {swept} expired messages"))
}
