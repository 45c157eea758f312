use std::io::Write;

use anyhow::{anyhow, Result};
use clap::ValueEnum;
use neoghidra_core::navigate::ViewState;
use neoghidra_core::symbols::PickerEntry;
use neoghidra_core::{Session, ViewKind};

use crate::canonicalize_or_current;
use crate::commands::{open_session, settle, write_view, GlobalOptions};

/// View selector for subcommands that work on either rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ViewArg {
    Decompiled,
    Disassembly,
}

impl From<ViewArg> for ViewKind {
    fn from(arg: ViewArg) -> Self {
        match arg {
            ViewArg::Decompiled => ViewKind::Decompiled,
            ViewArg::Disassembly => ViewKind::Disassembly,
        }
    }
}

fn active(session: &Session) -> Result<&ViewState> {
    session.active_view().ok_or_else(|| anyhow!("No active view"))
}

async fn open(session: &mut Session, binary: &str, kind: ViewKind) -> Result<()> {
    let path = canonicalize_or_current(binary)?;
    let opened = session.open_view(&path, kind).await.map(|_| ());
    settle(session, opened)
}

/// Print the decompiled view of `binary`.
pub async fn decompile_command(opts: &GlobalOptions, binary: &str) -> Result<()> {
    let mut session = open_session(opts)?;
    let path = canonicalize_or_current(binary)?;
    let opened = session.decompile(Some(&path)).await.map(|_| ());
    settle(&mut session, opened)?;
    write_view(&mut std::io::stdout(), active(&session)?, opts.json)
}

/// Print the disassembly of `binary`, with the cursor on `address` when given.
pub async fn disassemble_command(
    opts: &GlobalOptions,
    binary: &str,
    address: Option<&str>,
) -> Result<()> {
    let mut session = open_session(opts)?;
    let path = canonicalize_or_current(binary)?;
    let opened = session.disassemble(Some(&path), address).await.map(|_| ());
    settle(&mut session, opened)?;
    write_view(&mut std::io::stdout(), active(&session)?, opts.json)
}

/// Resolve `address` to a line in the chosen view and print it.
pub async fn jump_command(
    opts: &GlobalOptions,
    binary: &str,
    address: &str,
    view: ViewArg,
) -> Result<()> {
    let mut session = open_session(opts)?;
    open(&mut session, binary, view.into()).await?;
    let jumped = session.jump_to_offset(address);
    let line = settle(&mut session, jumped)?;
    let state = active(&session)?;
    let text = state.current_line().unwrap_or_default();
    if opts.json {
        let value = serde_json::json!({
            "view": state.kind.as_str(),
            "line": line,
            "address": state.current_address(),
            "text": text,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{line}: {text}");
    }
    Ok(())
}

/// Place the cursor on `address` in the `from` view, switch views, and print
/// where the same address lands in the other one.
pub async fn toggle_command(
    opts: &GlobalOptions,
    binary: &str,
    address: &str,
    from: ViewArg,
) -> Result<()> {
    let mut session = open_session(opts)?;
    open(&mut session, binary, from.into()).await?;
    let jumped = session.jump_to_offset(address).map(|_| ());
    settle(&mut session, jumped)?;
    let toggled = session.toggle_view().await.map(|_| ());
    settle(&mut session, toggled)?;
    let state = active(&session)?;
    if opts.json {
        let value = serde_json::json!({
            "view": state.kind.as_str(),
            "line": state.cursor,
            "address": state.current_address(),
            "text": state.current_line().unwrap_or_default(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!(
            "{} {}: {}",
            state.kind.as_str(),
            state.cursor,
            state.current_line().unwrap_or_default()
        );
    }
    Ok(())
}

fn print_entries(entries: &[PickerEntry], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("(none)");
    }
    for (i, entry) in entries.iter().enumerate() {
        println!("{:>4}. {}", i + 1, entry.display);
    }
    Ok(())
}

/// List the functions of `binary`.
pub async fn functions_command(opts: &GlobalOptions, binary: &str) -> Result<()> {
    let mut session = open_session(opts)?;
    let path = canonicalize_or_current(binary)?;
    let listed = session.list_functions(Some(&path)).await;
    let entries = settle(&mut session, listed)?;
    print_entries(&entries, opts.json)
}

/// List the symbols of `binary`.
pub async fn symbols_command(opts: &GlobalOptions, binary: &str) -> Result<()> {
    let mut session = open_session(opts)?;
    let path = canonicalize_or_current(binary)?;
    let listed = session.list_symbols(Some(&path)).await;
    let entries = settle(&mut session, listed)?;
    print_entries(&entries, opts.json)
}

/// Go to the definition of `word`, or of the branch target on the line at `at`.
pub async fn definition_command(
    opts: &GlobalOptions,
    binary: &str,
    word: Option<&str>,
    at: Option<&str>,
) -> Result<()> {
    let mut session = open_session(opts)?;
    let path = canonicalize_or_current(binary)?;
    let opened = session.disassemble(Some(&path), at).await.map(|_| ());
    settle(&mut session, opened)?;
    let resolved = session.go_to_definition(word.unwrap_or_default()).await;
    let def = settle(&mut session, resolved)?;
    let state = active(&session)?;
    if opts.json {
        let value = serde_json::json!({ "definition": def, "line": state.cursor });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!(
            "{} ({:?}) @ {} -> line {}: {}",
            def.name,
            def.kind,
            def.address,
            state.cursor,
            state.current_line().unwrap_or_default()
        );
    }
    Ok(())
}

/// Print every line of the chosen view that mentions `word`.
pub async fn references_command(
    opts: &GlobalOptions,
    binary: &str,
    word: &str,
    view: ViewArg,
) -> Result<()> {
    let mut session = open_session(opts)?;
    open(&mut session, binary, view.into()).await?;
    let found = session.show_references(word);
    let refs = settle(&mut session, found)?;
    if opts.json {
        println!("{}", serde_json::to_string_pretty(&refs)?);
        return Ok(());
    }
    let mut out = std::io::stdout();
    for r in &refs {
        let at = r.address.map(|a| format!(" [{a}]")).unwrap_or_default();
        writeln!(out, "{:>5}{}: {}", r.line, at, r.text.trim())?;
    }
    Ok(())
}

/// Rename the symbol at `address` in this invocation's view of `binary`.
///
/// The rename is display-only and lives only as long as the process; use the
/// `shell` subcommand to see it reflected in later views.
pub async fn rename_command(
    opts: &GlobalOptions,
    binary: &str,
    address: &str,
    new_name: &str,
) -> Result<()> {
    let mut session = open_session(opts)?;
    open(&mut session, binary, ViewKind::Disassembly).await?;
    let renamed = session.rename_symbol(Some(address), new_name);
    let outcome = settle(&mut session, renamed)?;
    if opts.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{} -> {} @ {}", outcome.old_name, outcome.new_name, outcome.address);
    }
    Ok(())
}
