//! `mst stats` — store-level aggregate counters.

use crate::output::{OutputMode, kv, render, rule};
use crate::workspace::Workspace;
use anyhow::Result;
use clap::Args;
use std::io::Write as _;

#[derive(Args, Debug)]
pub struct StatsArgs {}

pub fn run(_args: &StatsArgs, output: OutputMode) -> Result<()> {
    let ws = Workspace::discover_from_cwd()?;
    let service = ws.open_service()?;

    let stats = service.stats()?;

    render(output, &stats, |stats, w| {
        kv(w, "active", stats.active_messages.to_string())?;
        kv(w, "inactive", stats.inactive_messages.to_string())?;
        kv(w, "state rows", stats.recipient_rows.to_string())?;
        rule(w)?;

        let mut kinds: Vec<_> = stats.by_kind.iter().collect();
        kinds.sort();
        for (kind, count) in kinds {
            writeln!(w, "{count:>6}  {kind}")?;
        }

        let mut priorities: Vec<_> = stats.by_priority.iter().collect();
        priorities.sort();
        for (priority, count) in priorities {
            writeln!(w, "{count:>6}  priority:{priority}")?;
        }
        Ok(())
    })
}
