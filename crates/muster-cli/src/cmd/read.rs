//! `mst read` — mark one message (or all unread bell entries) read.
//!
//! Reading couples both projections regardless of surface; the surface only
//! determines which real-time event the affected user receives.

use crate::output::{OutputMode, render_success};
use crate::workspace::Workspace;
use anyhow::{Result, bail};
use clap::Args;
use muster_core::Surface;

#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Acting user.
    #[arg(long = "as", value_name = "USER")]
    pub as_user: Option<String>,

    /// Message id to mark read.
    #[arg(long)]
    pub id: Option<String>,

    /// Mark every unread bell entry read instead of one id.
    #[arg(long)]
    pub all: bool,

    /// Surface the request came through: bell or system.
    #[arg(long, default_value = "bell")]
    pub surface: String,
}

pub fn run(args: &ReadArgs, output: OutputMode) -> Result<()> {
    let ws = Workspace::discover_from_cwd()?;
    let service = ws.open_service()?;
    let identity = service.authenticate(args.as_user.as_deref())?;

    if args.all {
        let changed = service.mark_all_read(&identity)?;
        return render_success(output, &format!("marked {changed} notifications read"));
    }

    let Some(id) = args.id.as_deref() else {
        bail!("read needs --id or --all");
    };
    let surface = match args.surface.trim().to_ascii_lowercase().as_str() {
        "bell" => Surface::Bell,
        "system" => Surface::System,
        other => bail!("unknown surface '{other}': expected bell or system"),
    };

    service.mark_read(&identity, id, surface)?;
    render_success(output, &format!("marked {id} read"))
}
