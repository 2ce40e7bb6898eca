//! `mst unread` — on-demand unread counts for the acting user.

use crate::output::{OutputMode, kv, render};
use crate::workspace::Workspace;
use anyhow::Result;
use clap::Args;

#[derive(Args, Debug)]
pub struct UnreadArgs {
    /// Acting user.
    #[arg(long = "as", value_name = "USER")]
    pub as_user: Option<String>,
}

pub fn run(args: &UnreadArgs, output: OutputMode) -> Result<()> {
    let ws = Workspace::discover_from_cwd()?;
    let service = ws.open_service()?;
    let identity = service.authenticate(args.as_user.as_deref())?;

    let counts = service.unread_counts(&identity)?;

    render(output, &counts, |counts, w| {
        kv(w, "bell", counts.bell.to_string())?;
        kv(w, "system", counts.system.to_string())?;
        kv(w, "total", counts.total.to_string())
    })
}
