use anyhow::Result;
use neoghidra_core::detect::Detection;

use crate::canonicalize_or_current;
use crate::commands::{open_session, settle, GlobalOptions};

/// Report whether `path` would be treated as a binary, and why.
pub fn detect_command(opts: &GlobalOptions, path: &str) -> Result<()> {
    let mut session = open_session(opts)?;
    let target = canonicalize_or_current(path)?;
    let detected = session.detect(&target);
    let detection = settle(&mut session, detected)?;

    if opts.json {
        let value = serde_json::json!({
            "path": target,
            "binary": detection.is_binary(),
            "detection": detection,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match detection {
        Detection::Magic(format) => println!("{}: binary ({format:?} magic)", target.display()),
        Detection::Pattern(pattern) => {
            println!("{}: binary (matches pattern '{pattern}')", target.display())
        }
        Detection::NotBinary => println!("{}: not a binary", target.display()),
    }
    Ok(())
}
