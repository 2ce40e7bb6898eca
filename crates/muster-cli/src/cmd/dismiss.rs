//! `mst dismiss` — remove a message from the acting user's bell feed.

use crate::output::{OutputMode, render_success};
use crate::workspace::Workspace;
use anyhow::Result;
use clap::Args;

#[derive(Args, Debug)]
pub struct DismissArgs {
    /// Acting user.
    #[arg(long = "as", value_name = "USER")]
    pub as_user: Option<String>,

    /// Message id to remove from the bell feed.
    #[arg(long)]
    pub id: String,
}

pub fn run(args: &DismissArgs, output: OutputMode) -> Result<()> {
    let ws = Workspace::discover_from_cwd()?;
    let service = ws.open_service()?;
    let identity = service.authenticate(args.as_user.as_deref())?;

    service.remove_from_bell(&identity, &args.id)?;
    render_success(output, &format!("removed {} from the bell feed", args.id))
}
