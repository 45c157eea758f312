use std::io::Write;
use std::path::Path;

use anyhow::Result;
use neoghidra_core::symbols::PickerEntry;
use neoghidra_core::Session;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::canonicalize_or_current;
use crate::commands::{open_session, view_status, write_notifications, write_view, GlobalOptions};

pub const SHELL_HELP: &str = "\
commands:
  open <path>                 detect and open a binary (decompiled view)
  decompile [path]            decompiled view of path or the active binary
  disassemble [path] [addr]   disassembly view, optionally at addr
  show                        print the active view
  where                       cursor line and address
  line <n>                    move the cursor to line n
  jump <addr>                 move the cursor to an address
  toggle                      switch between decompiled and disassembly
  refresh                     re-render the active view
  functions | symbols         list entries of the active binary
  select <n>                  jump to entry n of the last listing
  def [word]                  go to definition of word or the branch on the cursor line
  refs <word>                 lines mentioning word
  rename <name> [addr]        rename the symbol at addr (default: cursor)
  detect <path>               binary detection for path
  cache                       list cached analyses
  clear-cache [path]          clear cached analyses
  help | quit";

/// Run `neoghidra shell` on stdin/stdout.
pub async fn shell_command(opts: &GlobalOptions) -> Result<()> {
    let mut session = open_session(opts)?;
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    run_shell(&mut session, stdin, &mut stdout, opts.json).await
}

/// Read one command per line from `input` until EOF or `quit`.
///
/// Session failures are reported through notifications; the loop only stops
/// on IO errors reading `input` or writing to `out`.
pub async fn run_shell<R: AsyncBufRead + Unpin, W: Write>(
    session: &mut Session,
    input: R,
    out: &mut W,
    json: bool,
) -> Result<()> {
    let mut picks: Vec<PickerEntry> = Vec::new();
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&cmd, args)) = words.split_first() else {
            continue;
        };
        if matches!(cmd, "quit" | "exit") {
            break;
        }
        execute(session, cmd, args, &mut picks, out, json).await?;
        write_notifications(out, &session.drain_notifications())?;
        out.flush()?;
    }
    Ok(())
}

async fn execute<W: Write>(
    session: &mut Session,
    cmd: &str,
    args: &[&str],
    picks: &mut Vec<PickerEntry>,
    out: &mut W,
    json: bool,
) -> Result<()> {
    match (cmd, args) {
        ("help", _) => writeln!(out, "{SHELL_HELP}")?,
        ("open", [path]) => {
            let path = canonicalize_or_current(path)?;
            match session.open_file(&path).await {
                Ok(Some(_)) => status(session, out)?,
                Ok(None) if !session.config().auto_analyze => {
                    writeln!(out, "auto-analysis disabled; use 'decompile {}'", path.display())?
                }
                Ok(None) => writeln!(out, "{} is not a binary", path.display())?,
                Err(_) => {}
            }
        }
        ("decompile", [] | [_]) => {
            let path = args.first().map(|p| canonicalize_or_current(p)).transpose()?;
            if session.decompile(path.as_deref()).await.is_ok() {
                status(session, out)?;
            }
        }
        ("disassemble", [] | [_] | [_, _]) => {
            let (path, address) = match args {
                [] => (None, None),
                // A lone argument that exists on disk is a path, otherwise an address.
                [one] if Path::new(one).exists() => (Some(canonicalize_or_current(one)?), None),
                [one] => (None, Some(*one)),
                [p, a, ..] => (Some(canonicalize_or_current(p)?), Some(*a)),
            };
            if session.disassemble(path.as_deref(), address).await.is_ok() {
                status(session, out)?;
            }
        }
        ("show", []) => {
            if let Some(state) = session.active_view() {
                write_view(out, state, json)?;
            } else {
                writeln!(out, "no active view")?;
            }
        }
        ("where", []) => cursor(session, out)?,
        ("line", [n]) => match n.parse::<usize>() {
            Ok(n) => {
                if session.set_cursor(n).is_ok() {
                    cursor(session, out)?;
                }
            }
            Err(_) => writeln!(out, "[error] not a line number: {n}")?,
        },
        ("jump", [addr]) => {
            if session.jump_to_offset(addr).is_ok() {
                cursor(session, out)?;
            }
        }
        ("toggle", []) => {
            if session.toggle_view().await.is_ok() {
                status(session, out)?;
            }
        }
        ("refresh", []) => {
            if session.refresh().await.is_ok() {
                status(session, out)?;
            }
        }
        ("functions", []) | ("symbols", []) => {
            let listed = if cmd == "functions" {
                session.list_functions(None).await
            } else {
                session.list_symbols(None).await
            };
            if let Ok(entries) = listed {
                for (i, entry) in entries.iter().enumerate() {
                    writeln!(out, "{:>4}. {}", i + 1, entry.display)?;
                }
                *picks = entries;
            }
        }
        ("select", [n]) => match n.parse::<usize>().ok().and_then(|i| picks.get(i.checked_sub(1)?)) {
            Some(entry) => {
                let entry = entry.clone();
                if session.select(&entry).is_ok() {
                    cursor(session, out)?;
                }
            }
            None => writeln!(out, "[error] no entry {n} in the last listing")?,
        },
        ("def", [] | [_]) => {
            let word = args.first().copied().unwrap_or_default();
            if let Ok(def) = session.go_to_definition(word).await {
                writeln!(out, "{} ({:?}) @ {}", def.name, def.kind, def.address)?;
                cursor(session, out)?;
            }
        }
        ("refs", [word]) => {
            if let Ok(refs) = session.show_references(word) {
                for r in refs {
                    writeln!(out, "{:>5}: {}", r.line, r.text.trim())?;
                }
            }
        }
        ("rename", [name] | [name, _]) => {
            let _ = session.rename_symbol(args.get(1).copied(), name);
        }
        ("detect", [path]) => {
            let path = canonicalize_or_current(path)?;
            if let Ok(detection) = session.detect(&path) {
                writeln!(out, "{}: {}", path.display(), serde_json::to_string(&detection)?)?;
            }
        }
        ("cache", []) => {
            let entries = session.cache_entries();
            if entries.is_empty() {
                writeln!(out, "cache is empty")?;
            }
            for e in entries {
                writeln!(out, "{} ({}) stored {}", e.path.display(), e.program_name, e.stored_at)?;
            }
        }
        ("clear-cache" | "clear", [] | [_]) => {
            let path = args.first().map(|p| canonicalize_or_current(p)).transpose()?;
            session.clear_cache(path.as_deref());
        }
        _ => writeln!(out, "[error] unknown command '{}'; try 'help'", args_line(cmd, args))?,
    }
    Ok(())
}

fn args_line(cmd: &str, args: &[&str]) -> String {
    std::iter::once(cmd).chain(args.iter().copied()).collect::<Vec<_>>().join(" ")
}

fn status<W: Write>(session: &Session, out: &mut W) -> Result<()> {
    if let Some(state) = session.active_view() {
        writeln!(out, "{}", view_status(state))?;
    }
    Ok(())
}

fn cursor<W: Write>(session: &Session, out: &mut W) -> Result<()> {
    if let Some(state) = session.active_view() {
        let at = state.current_address().map(|a| format!(" @ {a}")).unwrap_or_default();
        writeln!(out, "line {}{}: {}", state.cursor, at, state.current_line().unwrap_or_default())?;
    }
    Ok(())
}
