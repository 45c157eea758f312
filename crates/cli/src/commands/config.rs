use anyhow::Result;
use neoghidra_core::project::ProjectLayout;
use neoghidra_core::services::backends::resolve_headless_path;

use crate::commands::{effective_config, GlobalOptions};

/// Print the effective configuration and where the analyzer resolves to.
pub fn config_command(opts: &GlobalOptions) -> Result<()> {
    let config = effective_config(opts)?;
    let analyzer = resolve_headless_path(&config);
    let layout = ProjectLayout::new(&config);

    if opts.json {
        let value = serde_json::json!({
            "config": config,
            "resolved_analyzer": analyzer.as_ref().ok(),
            "analyzer_error": analyzer.as_ref().err().map(|e| e.to_string()),
            "script_path": layout.script_path(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("NeoGhidra configuration");
    println!("- Project dir: {}", config.project_dir.display());
    println!("- Script: {}", layout.script_path().display());
    match &config.ghidra_install_dir {
        Some(dir) => println!("- Ghidra install dir: {}", dir.display()),
        None => println!("- Ghidra install dir: (unset)"),
    }
    match &analyzer {
        Ok(path) => println!("- Analyzer: {}", path.display()),
        Err(e) => println!("- Analyzer: MISSING ({e})"),
    }
    println!("- Timeout: {}s", config.timeout_secs);
    println!("- Auto-analyze: {}", config.auto_analyze);
    println!("- Binary patterns: {}", config.binary_patterns.join(", "));
    Ok(())
}
