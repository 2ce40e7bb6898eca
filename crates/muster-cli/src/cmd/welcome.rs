//! `mst welcome` — idempotent welcome notification.

use crate::output::{OutputMode, render};
use crate::workspace::Workspace;
use anyhow::Result;
use clap::Args;
use muster_core::WelcomeOutcome;
use serde::Serialize;
use std::io::Write as _;

#[derive(Args, Debug)]
pub struct WelcomeArgs {
    /// The user to welcome.
    #[arg(long, value_name = "USER")]
    pub user: String,
}

#[derive(Serialize)]
struct WelcomeReport {
    user: String,
    already_sent: bool,
    message_id: Option<String>,
}

pub fn run(args: &WelcomeArgs, output: OutputMode) -> Result<()> {
    let ws = Workspace::discover_from_cwd()?;
    let mut service = ws.open_service()?;

    let outcome = service.send_welcome(&args.user)?;
    let report = match outcome {
        WelcomeOutcome::Sent(created) => WelcomeReport {
            user: args.user.clone(),
            already_sent: false,
            message_id: Some(created.message_id),
        },
        WelcomeOutcome::AlreadySent => WelcomeReport {
            user: args.user.clone(),
            already_sent: true,
            message_id: None,
        },
    };

    render(output, &report, |report, w| {
        if report.already_sent {
            writeln!(w, "welcome already sent to {}", report.user)
        } else {
            writeln!(
                w,
                "welcome sent to {} ({})",
                report.user,
                report.message_id.as_deref().unwrap_or_default()
            )
        }
    })
}
