use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use neoghidra_core::navigate::ViewState;
use neoghidra_core::project::{load_config, NeoConfig};
use neoghidra_core::{Address, NeoResult, Notification, Session, Severity};
use serde::Serialize;
use tracing::debug;

/// Flags shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub analyzer: Option<PathBuf>,
    pub timeout: Option<u64>,
    pub json: bool,
}

/// Defaults, then the config file, then the environment, then CLI flags.
pub fn effective_config(opts: &GlobalOptions) -> Result<NeoConfig> {
    let mut config = load_config(opts.config.as_deref())?;
    if let Some(analyzer) = &opts.analyzer {
        config.analyzer_path = Some(analyzer.clone());
    }
    if let Some(secs) = opts.timeout {
        config.timeout_secs = secs;
    }
    Ok(config)
}

pub fn open_session(opts: &GlobalOptions) -> Result<Session> {
    let config = effective_config(opts)?;
    debug!(?config, "effective configuration");
    Session::new(config).context("Failed to initialize session")
}

pub fn severity_tag(level: Severity) -> &'static str {
    match level {
        Severity::Info => "info",
        Severity::Warning => "warn",
        Severity::Error => "error",
    }
}

pub fn write_notifications<W: Write>(out: &mut W, notes: &[Notification]) -> Result<()> {
    for note in notes {
        writeln!(out, "[{}] {}", severity_tag(note.level), note.message)?;
    }
    Ok(())
}

/// Flush queued notifications to stderr and turn a session failure into an
/// `anyhow` error. The failing command's own notification is the last one
/// queued; it is left to the returned error so it is printed only once.
pub fn settle<T>(session: &mut Session, outcome: NeoResult<T>) -> Result<T> {
    let mut notes = session.drain_notifications();
    if outcome.is_err() {
        notes.pop();
    }
    write_notifications(&mut std::io::stderr(), &notes)?;
    Ok(outcome?)
}

#[derive(Debug, Serialize)]
pub struct ViewLine<'a> {
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    pub text: &'a str,
}

/// Serializable snapshot of a view for `--json` output.
#[derive(Debug, Serialize)]
pub struct ViewSnapshot<'a> {
    pub binary: String,
    pub view: &'static str,
    pub cursor: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor_address: Option<Address>,
    pub lines: Vec<ViewLine<'a>>,
}

impl<'a> ViewSnapshot<'a> {
    pub fn of(state: &'a ViewState) -> Self {
        let lines = state
            .view
            .lines
            .iter()
            .enumerate()
            .map(|(i, text)| ViewLine {
                line: i + 1,
                address: state.view.address_of(i + 1),
                text,
            })
            .collect();
        Self {
            binary: state.binary.display().to_string(),
            view: state.kind.as_str(),
            cursor: state.cursor,
            cursor_address: state.current_address(),
            lines,
        }
    }
}

/// Print a whole view, marking the cursor line with `>`.
pub fn write_view<W: Write>(out: &mut W, state: &ViewState, json: bool) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&ViewSnapshot::of(state))?)?;
        return Ok(());
    }
    for (i, text) in state.view.lines.iter().enumerate() {
        let line_no = i + 1;
        let marker = if line_no == state.cursor { '>' } else { ' ' };
        writeln!(out, "{marker}{line_no:>5}  {text}")?;
    }
    Ok(())
}

/// One-line summary of the active view.
pub fn view_status(state: &ViewState) -> String {
    let at = state.current_address().map(|a| format!(" @ {a}")).unwrap_or_default();
    format!(
        "{} view of {} ({} lines), cursor at line {}{}",
        state.kind.as_str(),
        state.binary.display(),
        state.view.len(),
        state.cursor,
        at
    )
}
