//! In-memory analysis cache keyed by normalized binary path.
//!
//! Entries live until explicitly cleared; there is no TTL or size bound. The
//! cache itself is a plain map. Callers that share it across tasks go through
//! [`SharedCache`], which serializes every read and mutation behind one mutex.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::model::AnalysisResult;

/// Cache handle shared between the session and the analysis service.
pub type SharedCache = Arc<Mutex<AnalysisCache>>;

#[derive(Debug, Clone)]
struct CacheEntry {
    result: AnalysisResult,
    stored_at: DateTime<Utc>,
}

/// Summary row for cache status listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheEntryInfo {
    pub path: PathBuf,
    pub program_name: String,
    pub stored_at: String,
}

#[derive(Debug, Default)]
pub struct AnalysisCache {
    entries: HashMap<PathBuf, CacheEntry>,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    /// Wrap a fresh cache for sharing.
    pub fn shared() -> SharedCache {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn get(&self, path: &Path) -> Option<&AnalysisResult> {
        self.entries.get(&normalize_path(path)).map(|e| &e.result)
    }

    pub fn get_mut(&mut self, path: &Path) -> Option<&mut AnalysisResult> {
        self.entries.get_mut(&normalize_path(path)).map(|e| &mut e.result)
    }

    /// Store `result` for `path`, replacing whatever was there.
    pub fn set(&mut self, path: &Path, result: AnalysisResult) {
        self.entries.insert(normalize_path(path), CacheEntry { result, stored_at: Utc::now() });
    }

    /// Drop one entry, or every entry when `path` is `None`.
    pub fn clear(&mut self, path: Option<&Path>) {
        match path {
            Some(p) => {
                self.entries.remove(&normalize_path(p));
            }
            None => self.entries.clear(),
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(&normalize_path(path))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by path.
    pub fn entries(&self) -> Vec<CacheEntryInfo> {
        let mut rows: Vec<CacheEntryInfo> = self
            .entries
            .iter()
            .map(|(path, entry)| CacheEntryInfo {
                path: path.clone(),
                program_name: entry.result.program_name.clone(),
                stored_at: entry.stored_at.to_rfc3339(),
            })
            .collect();
        rows.sort_by(|a, b| a.path.cmp(&b.path));
        rows
    }
}

/// Make `path` absolute and resolve `.`/`..` lexically.
///
/// Symlinks are not followed, so two spellings of the same file through
/// different links are distinct keys.
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
