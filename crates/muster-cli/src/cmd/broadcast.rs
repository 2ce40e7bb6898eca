//! `mst broadcast` — create an organization-wide announcement.

use crate::output::{OutputMode, kv, render};
use crate::workspace::Workspace;
use anyhow::{Result, bail};
use clap::Args;
use muster_core::model::{MessageKind, Priority, Role};
use muster_core::targeting::TargetSpec;
use muster_core::MessageDraft;
use std::str::FromStr;

#[derive(Args, Debug)]
pub struct BroadcastArgs {
    /// Acting user (must hold a role above member).
    #[arg(long = "as", value_name = "USER")]
    pub as_user: Option<String>,

    /// Message title.
    #[arg(long)]
    pub title: String,

    /// Message body.
    #[arg(long)]
    pub body: String,

    /// Classification: announcement, assignment, role_change,
    /// account_security, welcome.
    #[arg(long, default_value = "announcement")]
    pub kind: String,

    /// Priority: low, normal, high.
    #[arg(long, default_value = "normal")]
    pub priority: String,

    /// Target a role (repeatable). Mutually exclusive with --all.
    #[arg(long = "role")]
    pub roles: Vec<String>,

    /// Target every user.
    #[arg(long)]
    pub all: bool,

    /// Exclude a user (repeatable). Exclusion wins over inclusion.
    #[arg(long = "exclude")]
    pub exclude: Vec<String>,

    /// Deliver to the creator as well (also attributes the message).
    #[arg(long)]
    pub include_creator: bool,

    /// Anonymize the creator on every surface.
    #[arg(long)]
    pub hide_creator: bool,

    /// Days until the broadcast expires (default from config retention).
    #[arg(long, value_name = "DAYS")]
    pub expires_in: Option<u32>,
}

pub fn run(args: &BroadcastArgs, output: OutputMode) -> Result<()> {
    let ws = Workspace::discover_from_cwd()?;
    let mut service = ws.open_service()?;
    let identity = service.authenticate(args.as_user.as_deref())?;

    let mut spec = if args.all {
        if !args.roles.is_empty() {
            bail!("--all and --role are mutually exclusive");
        }
        TargetSpec::all_users()
    } else if args.roles.is_empty() {
        bail!("broadcast needs --all or at least one --role");
    } else {
        let roles = args
            .roles
            .iter()
            .map(|raw| Role::from_str(raw))
            .collect::<Result<Vec<_>, _>>()?;
        TargetSpec::roles(roles)
    };
    spec = spec.excluding(args.exclude.iter().cloned());
    if args.include_creator {
        spec = spec.with_creator();
    }

    let ttl_days = args.expires_in.or(ws.config.retention.broadcast_ttl_days);
    let expires_at_us = ttl_days.map(|days| {
        chrono::Utc::now().timestamp_micros() + i64::from(days) * 86_400 * 1_000_000
    });

    let draft = MessageDraft {
        title: args.title.clone(),
        body: args.body.clone(),
        kind: MessageKind::from_str(&args.kind)?,
        priority: Priority::from_str(&args.priority)?,
        hide_creator: args.hide_creator,
        expires_at_us,
    };

    let created = service.broadcast(&identity, draft, spec)?;

    render(output, &created, |created, w| {
        kv(w, "created", &created.message_id)?;
        kv(w, "recipients", created.recipient_count.to_string())
    })
}
