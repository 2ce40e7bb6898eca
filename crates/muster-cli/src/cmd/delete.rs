//! `mst delete` — delete a message from the acting user's system list.

use crate::output::{OutputMode, render_success};
use crate::workspace::Workspace;
use anyhow::Result;
use clap::Args;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Acting user.
    #[arg(long = "as", value_name = "USER")]
    pub as_user: Option<String>,

    /// Message id to delete from the system list.
    #[arg(long)]
    pub id: String,
}

pub fn run(args: &DeleteArgs, output: OutputMode) -> Result<()> {
    let ws = Workspace::discover_from_cwd()?;
    let service = ws.open_service()?;
    let identity = service.authenticate(args.as_user.as_deref())?;

    service.delete_from_system(&identity, &args.id)?;
    render_success(output, &format!("deleted {} from the system list", args.id))
}
