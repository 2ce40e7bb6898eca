//! `mst feed` — a user's bell feed.

use crate::output::{OutputMode, render, rule};
use crate::workspace::Workspace;
use anyhow::Result;
use clap::Args;
use std::io::Write as _;

#[derive(Args, Debug)]
pub struct FeedArgs {
    /// Acting user.
    #[arg(long = "as", value_name = "USER")]
    pub as_user: Option<String>,

    /// Maximum entries to show.
    #[arg(short = 'n', long)]
    pub limit: Option<u32>,
}

pub fn run(args: &FeedArgs, output: OutputMode) -> Result<()> {
    let ws = Workspace::discover_from_cwd()?;
    let service = ws.open_service()?;
    let identity = service.authenticate(args.as_user.as_deref())?;

    let items = service.bell_feed(&identity, args.limit)?;

    render(output, &items, |items, w| {
        if items.is_empty() {
            return writeln!(w, "No notifications");
        }
        rule(w)?;
        for item in items {
            let marker = if item.is_read { " " } else { "*" };
            let creator = item.creator.as_deref().unwrap_or("-");
            writeln!(
                w,
                "{marker} {}  [{}] {}  (from {creator})",
                item.message_id, item.kind, item.title
            )?;
        }
        rule(w)
    })
}
