//! `mst send` — targeted creation for a known set of users.

use crate::output::{OutputMode, kv, render};
use crate::workspace::Workspace;
use anyhow::Result;
use clap::Args;
use muster_core::MessageDraft;
use muster_core::model::{MessageKind, Priority};
use std::str::FromStr;

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Recipient user id (repeatable).
    #[arg(long = "to", value_name = "USER", required = true)]
    pub to: Vec<String>,

    /// Message title.
    #[arg(long)]
    pub title: String,

    /// Message body.
    #[arg(long)]
    pub body: String,

    /// Classification (defaults to assignment for targeted notices).
    #[arg(long, default_value = "assignment")]
    pub kind: String,

    /// Priority: low, normal, high.
    #[arg(long, default_value = "normal")]
    pub priority: String,

    /// Creator to attribute; defaults to the system identity.
    #[arg(long, value_name = "USER")]
    pub from: Option<String>,
}

pub fn run(args: &SendArgs, output: OutputMode) -> Result<()> {
    let ws = Workspace::discover_from_cwd()?;
    let mut service = ws.open_service()?;

    let draft = MessageDraft {
        title: args.title.clone(),
        body: args.body.clone(),
        kind: MessageKind::from_str(&args.kind)?,
        priority: Priority::from_str(&args.priority)?,
        hide_creator: false,
        expires_at_us: None,
    };

    let created = service.create_targeted(draft, &args.to, args.from.as_deref())?;

    render(output, &created, |created, w| {
        kv(w, "created", &created.message_id)?;
        kv(w, "recipients", created.recipient_count.to_string())
    })
}
