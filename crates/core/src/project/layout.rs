use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{NeoError, NeoResult};
use crate::project::NeoConfig;

/// Post-analysis script shipped with the crate.
pub const EMBEDDED_SCRIPT: &str = include_str!("../../scripts/neoghidra_export.py");

/// Logical layout of the analyzer's working directories.
///
/// Derived from configuration; it does *not* touch the filesystem except in
/// [`ProjectLayout::ensure_dirs`] and [`ProjectLayout::ensure_script`].
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    /// Directory passed to analyzeHeadless as the project location.
    pub project_dir: PathBuf,
    /// Directory passed as `-scriptPath`.
    pub scripts_dir: PathBuf,
    /// File name passed as `-postScript`.
    pub script_name: String,
    /// Whether the scripts dir was configured explicitly (and must not be written to).
    pub explicit_scripts_dir: bool,
}

impl ProjectLayout {
    pub fn new(config: &NeoConfig) -> Self {
        let project_dir = config.project_dir.clone();
        let (scripts_dir, explicit_scripts_dir) = match &config.script_dir {
            Some(dir) => (dir.clone(), true),
            None => (project_dir.join("scripts"), false),
        };
        Self { project_dir, scripts_dir, script_name: config.script_name.clone(), explicit_scripts_dir }
    }

    pub fn script_path(&self) -> PathBuf {
        self.scripts_dir.join(&self.script_name)
    }

    /// Create the project directory if needed.
    pub fn ensure_dirs(&self) -> NeoResult<()> {
        std::fs::create_dir_all(&self.project_dir)?;
        Ok(())
    }

    /// Make sure the post-script exists.
    ///
    /// An explicitly configured script directory is only checked. Otherwise the
    /// embedded script is written on first use.
    pub fn ensure_script(&self) -> NeoResult<PathBuf> {
        let path = self.script_path();
        if path.is_file() {
            return Ok(path);
        }
        if self.explicit_scripts_dir {
            return Err(NeoError::ScriptNotFound(path));
        }
        std::fs::create_dir_all(&self.scripts_dir)?;
        std::fs::write(&path, EMBEDDED_SCRIPT)?;
        Ok(path)
    }
}

/// Ghidra project name for a binary: sanitized base name plus a short hash of
/// its path, so two binaries with the same file name never share a project.
pub fn project_name(binary: &Path) -> String {
    let base = binary.file_name().and_then(|n| n.to_str()).unwrap_or("binary");
    let sanitized: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    let digest = Sha256::digest(binary.to_string_lossy().as_bytes());
    let hash = format!("{:x}", digest);
    format!("{}_{}", sanitized, &hash[..8])
}
