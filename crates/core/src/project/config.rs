use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default analysis timeout, matching Ghidra's own per-file budget for large binaries.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Name of the post-analysis script passed to `-postScript`.
pub const DEFAULT_SCRIPT_NAME: &str = "neoghidra_export.py";

/// Serializable configuration for analyzer invocation and binary detection.
///
/// Loaded from a `.json`/`.yaml` file (see [`crate::project::load_config`]),
/// then overridden by environment variables and finally by frontend flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeoConfig {
    /// Ghidra installation root (the directory containing `support/`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ghidra_install_dir: Option<PathBuf>,
    /// Explicit path to `analyzeHeadless`; wins over `ghidra_install_dir`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzer_path: Option<PathBuf>,
    /// Where Ghidra projects (and the materialized script) are kept.
    pub project_dir: PathBuf,
    /// Directory holding the post-analysis script. When unset the embedded
    /// script is written under `project_dir/scripts`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_dir: Option<PathBuf>,
    pub script_name: String,
    pub timeout_secs: u64,
    /// File-name globs that mark a file as a binary regardless of its magic bytes.
    pub binary_patterns: Vec<String>,
    /// Analyze automatically when a detected binary is opened.
    pub auto_analyze: bool,
}

impl Default for NeoConfig {
    fn default() -> Self {
        Self {
            ghidra_install_dir: None,
            analyzer_path: None,
            project_dir: std::env::temp_dir().join("neoghidra_projects"),
            script_dir: None,
            script_name: DEFAULT_SCRIPT_NAME.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            binary_patterns: default_binary_patterns(),
            auto_analyze: true,
        }
    }
}

impl NeoConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Apply environment overrides read through `lookup`.
    ///
    /// Recognized keys: `GHIDRA_INSTALL_DIR`, `GHIDRA_ANALYZE_HEADLESS`,
    /// `NEOGHIDRA_PROJECT_DIR`, `NEOGHIDRA_TIMEOUT` (seconds). Unparseable
    /// timeouts are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("GHIDRA_INSTALL_DIR").filter(|v| !v.is_empty()) {
            self.ghidra_install_dir = Some(PathBuf::from(dir));
        }
        if let Some(path) = lookup("GHIDRA_ANALYZE_HEADLESS").filter(|v| !v.is_empty()) {
            self.analyzer_path = Some(PathBuf::from(path));
        }
        if let Some(dir) = lookup("NEOGHIDRA_PROJECT_DIR").filter(|v| !v.is_empty()) {
            self.project_dir = PathBuf::from(dir);
        }
        if let Some(secs) = lookup("NEOGHIDRA_TIMEOUT").and_then(|v| v.trim().parse::<u64>().ok())
        {
            self.timeout_secs = secs;
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }
}

pub fn default_binary_patterns() -> Vec<String> {
    ["*.exe", "*.dll", "*.so", "*.so.*", "*.dylib", "*.bin", "*.elf", "*.o"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}
