//! `mst inbox` — a user's paginated system-message list.

use crate::output::{OutputMode, render, rule};
use crate::workspace::Workspace;
use anyhow::Result;
use clap::Args;
use muster_core::model::MessageKind;
use std::io::Write as _;
use std::str::FromStr;

#[derive(Args, Debug)]
pub struct InboxArgs {
    /// Acting user.
    #[arg(long = "as", value_name = "USER")]
    pub as_user: Option<String>,

    /// Filter by classification.
    #[arg(long)]
    pub kind: Option<String>,

    /// Page number (1-based).
    #[arg(long, default_value = "1")]
    pub page: u32,

    /// Page size.
    #[arg(short = 'n', long)]
    pub limit: Option<u32>,
}

pub fn run(args: &InboxArgs, output: OutputMode) -> Result<()> {
    let ws = Workspace::discover_from_cwd()?;
    let service = ws.open_service()?;
    let identity = service.authenticate(args.as_user.as_deref())?;

    let kind = args
        .kind
        .as_deref()
        .map(MessageKind::from_str)
        .transpose()?;

    let page = service.system_messages(&identity, kind, Some(args.page), args.limit)?;

    render(output, &page, |page, w| {
        if page.items.is_empty() {
            return writeln!(w, "No messages (page {}, {} total)", page.page, page.total);
        }
        rule(w)?;
        for item in &page.items {
            let marker = if item.is_read { " " } else { "*" };
            writeln!(
                w,
                "{marker} {}  [{}] {}",
                item.message_id, item.kind, item.title
            )?;
        }
        rule(w)?;
        writeln!(
            w,
            "page {} of {} entries (limit {})",
            page.page, page.total, page.limit
        )
    })
}
