use std::path::Path;

use anyhow::{anyhow, Context, Result};

use crate::project::NeoConfig;

/// Load a config file, picking the format from its extension (`json`, `yaml`, `yml`).
pub fn load_config_file(path: &Path) -> Result<NeoConfig> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let config = match ext {
        "json" => serde_json::from_str(&body).context("Failed to parse config JSON")?,
        "yaml" | "yml" => serde_yaml::from_str(&body).context("Failed to parse config YAML")?,
        other => return Err(anyhow!("Unsupported config format '{}' for {}", other, path.display())),
    };
    Ok(config)
}

/// Resolve the effective configuration: defaults, then the optional file, then
/// the process environment.
pub fn load_config(path: Option<&Path>) -> Result<NeoConfig> {
    let mut config = match path {
        Some(p) => load_config_file(p)?,
        None => NeoConfig::default(),
    };
    config.apply_env();
    Ok(config)
}
