use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod commands;

/// Default log filter when `NEOGHIDRA_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "neoghidra=info,neoghidra_core=info";

/// Install the tracing subscriber. Logs go to stderr so stdout stays parseable.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env("NEOGHIDRA_LOG")
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

/// Canonicalize a user-supplied path if possible, falling back to the given
/// string relative to the current working directory.
pub fn canonicalize_or_current(path: &str) -> Result<PathBuf> {
    let p = Path::new(path);
    if p == Path::new(".") {
        return env::current_dir().context("Failed to get current directory");
    }
    match p.canonicalize() {
        Ok(abs) => Ok(abs),
        Err(_) => {
            let cwd = env::current_dir().context("Failed to get current directory")?;
            Ok(cwd.join(p))
        }
    }
}
