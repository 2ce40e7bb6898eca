//! Shared output layer for human/JSON parity across all CLI commands.
//!
//! Every command handler receives an [`OutputMode`] and formats its output
//! accordingly: readable text for operators, stable JSON for scripts.

use serde::Serialize;
use std::io::{self, Write};

/// Shared width for human output separators.
pub const RULE_WIDTH: usize = 72;

/// The two output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text.
    Human,
    /// Machine-readable JSON (one object per result, or a JSON array).
    Json,
}

impl OutputMode {
    /// Returns `true` if JSON output was requested.
    #[must_use]
    pub fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Write a horizontal separator used by human output.
pub fn rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = RULE_WIDTH)
}

/// Render a left-aligned key/value line in human output.
pub fn kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<14} {}", format!("{key}:"), value.as_ref())
}

/// Render a value either as JSON or through the human formatter.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn render<T, F>(mode: OutputMode, value: &T, human: F) -> anyhow::Result<()>
where
    T: Serialize,
    F: FnOnce(&T, &mut dyn Write) -> io::Result<()>,
{
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if mode.is_json() {
        serde_json::to_writer_pretty(&mut handle, value)?;
        writeln!(handle)?;
    } else {
        human(value, &mut handle)?;
    }
    Ok(())
}

/// Render a plain success line (or `{"ok": true, "message": ...}` in JSON).
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn render_success(mode: OutputMode, message: &str) -> anyhow::Result<()> {
    #[derive(Serialize)]
    struct OkMessage<'a> {
        ok: bool,
        message: &'a str,
    }

    render(
        mode,
        &OkMessage { ok: true, message },
        |value, w| writeln!(w, "{}", value.message),
    )
}
