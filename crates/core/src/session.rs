//! Top-level application context.
//!
//! A [`Session`] owns the shared cache, the analysis service, every open view,
//! and the notification queue. Frontends call its command methods and then
//! drain notifications to show the user. Each failed command pushes exactly
//! one notification and also returns the typed error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::address::{self, Address};
use crate::cache::{normalize_path, AnalysisCache, CacheEntryInfo, SharedCache};
use crate::detect::{BinaryDetector, Detection};
use crate::error::{NeoError, NeoResult, Severity};
use crate::model::AnalysisResult;
use crate::navigate::{resolve_definition, Definition, ViewState};
use crate::project::NeoConfig;
use crate::render::ViewKind;
use crate::services::AnalysisService;
use crate::symbols::{self, PickerEntry, Reference, RenameOutcome};

/// A user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: Severity,
    pub message: String,
}

type ViewKey = (PathBuf, ViewKind);

pub struct Session {
    service: Arc<AnalysisService>,
    cache: SharedCache,
    detector: BinaryDetector,
    views: HashMap<ViewKey, ViewState>,
    active: Option<ViewKey>,
    notifications: Vec<Notification>,
}

impl Session {
    /// Build a session with a fresh cache.
    pub fn new(config: NeoConfig) -> NeoResult<Self> {
        Self::with_cache(config, AnalysisCache::shared())
    }

    /// Build a session around an existing cache.
    pub fn with_cache(config: NeoConfig, cache: SharedCache) -> NeoResult<Self> {
        let detector = BinaryDetector::new(&config.binary_patterns)?;
        let service = Arc::new(AnalysisService::new(config, Arc::clone(&cache)));
        Ok(Self {
            service,
            cache,
            detector,
            views: HashMap::new(),
            active: None,
            notifications: Vec::new(),
        })
    }

    pub fn service(&self) -> &Arc<AnalysisService> {
        &self.service
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    pub fn config(&self) -> &NeoConfig {
        self.service.config()
    }

    // ---- notifications ----

    pub fn notify(&mut self, level: Severity, message: impl Into<String>) {
        let message = message.into();
        match level {
            Severity::Info => info!("{message}"),
            Severity::Warning => warn!("{message}"),
            Severity::Error => error!("{message}"),
        }
        self.notifications.push(Notification { level, message });
    }

    /// Take all pending notifications, oldest first.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Notify on failure and pass the outcome through.
    fn report<T>(&mut self, outcome: NeoResult<T>) -> NeoResult<T> {
        if let Err(e) = &outcome {
            self.notify(e.severity(), e.to_string());
        }
        outcome
    }

    // ---- views ----

    pub fn active_view(&self) -> Option<&ViewState> {
        self.active.as_ref().and_then(|key| self.views.get(key))
    }

    fn active_view_ref(&self) -> NeoResult<&ViewState> {
        self.active_view().ok_or(NeoError::NoActiveView)
    }

    fn active_view_mut(&mut self) -> NeoResult<&mut ViewState> {
        let key = self.active.clone().ok_or(NeoError::NoActiveView)?;
        self.views.get_mut(&key).ok_or(NeoError::NoActiveView)
    }

    fn active_binary(&self) -> NeoResult<PathBuf> {
        self.active.as_ref().map(|(p, _)| p.clone()).ok_or(NeoError::NoActiveView)
    }

    fn target_binary(&self, binary: Option<&Path>) -> NeoResult<PathBuf> {
        match binary {
            Some(p) => Ok(normalize_path(p)),
            None => self.active_binary(),
        }
    }

    /// Cached result for `binary`, analyzing on a miss. Stderr advisories
    /// from a fresh analysis become warnings.
    async fn ensure_result(&mut self, binary: &Path) -> NeoResult<AnalysisResult> {
        let outcome = self.service.ensure(binary).await?;
        for line in outcome.advisories {
            self.notify(Severity::Warning, format!("Ghidra: {line}"));
        }
        Ok(outcome.result)
    }

    async fn open_view_inner(&mut self, binary: &Path, kind: ViewKind) -> NeoResult<()> {
        let binary = normalize_path(binary);
        let result = self.ensure_result(&binary).await?;
        let state = ViewState::open(kind, &binary, &result);
        let key = (binary, kind);
        self.views.insert(key.clone(), state);
        self.active = Some(key);
        Ok(())
    }

    /// Render (or re-render) a view of `binary` and make it active.
    pub async fn open_view(&mut self, binary: &Path, kind: ViewKind) -> NeoResult<&ViewState> {
        let opened = self.open_view_inner(binary, kind).await;
        self.report(opened)?;
        self.active_view_ref()
    }

    /// Open the decompiled view of `binary`, or of the active binary.
    pub async fn decompile(&mut self, binary: Option<&Path>) -> NeoResult<&ViewState> {
        let target = self.target_binary(binary);
        let opened = match target {
            Ok(path) => self.open_view_inner(&path, ViewKind::Decompiled).await,
            Err(e) => Err(e),
        };
        self.report(opened)?;
        self.active_view_ref()
    }

    /// Open the disassembly view, optionally positioned at `address`.
    pub async fn disassemble(
        &mut self,
        binary: Option<&Path>,
        address: Option<&str>,
    ) -> NeoResult<&ViewState> {
        let opened = self.disassemble_inner(binary, address).await;
        self.report(opened)?;
        self.active_view_ref()
    }

    async fn disassemble_inner(
        &mut self,
        binary: Option<&Path>,
        address: Option<&str>,
    ) -> NeoResult<()> {
        let path = self.target_binary(binary)?;
        let target = address.map(address::parse).transpose()?;
        self.open_view_inner(&path, ViewKind::Disassembly).await?;
        if let Some(addr) = target {
            self.active_view_mut()?.jump_to(addr)?;
        }
        Ok(())
    }

    /// Open `path` if it looks like a binary and auto-analysis is enabled.
    pub async fn open_file(&mut self, path: &Path) -> NeoResult<Option<ViewKind>> {
        let detection = self.detect(path)?;
        if !detection.is_binary() || !self.config().auto_analyze {
            return Ok(None);
        }
        self.decompile(Some(path)).await?;
        Ok(Some(ViewKind::Decompiled))
    }

    pub fn detect(&mut self, path: &Path) -> NeoResult<Detection> {
        let detection = self.detector.detect(path);
        self.report(detection)
    }

    /// Re-render the active view from the cache, analyzing again after a clear.
    pub async fn refresh(&mut self) -> NeoResult<&ViewState> {
        let refreshed = self.refresh_inner().await;
        self.report(refreshed)?;
        self.active_view_ref()
    }

    async fn refresh_inner(&mut self) -> NeoResult<()> {
        let binary = self.active_binary()?;
        let result = self.ensure_result(&binary).await?;
        self.active_view_mut()?.refresh(&result);
        Ok(())
    }

    // ---- navigation ----

    /// Move the active view's cursor to `address`.
    pub fn jump_to(&mut self, address: Address) -> NeoResult<usize> {
        let jumped = self.active_view_mut().and_then(|view| view.jump_to(address));
        self.report(jumped)
    }

    /// Parse user input and jump; bad input aborts only this jump.
    pub fn jump_to_offset(&mut self, text: &str) -> NeoResult<usize> {
        let jumped = address::parse(text)
            .and_then(|addr| self.active_view_mut().and_then(|view| view.jump_to(addr)));
        self.report(jumped)
    }

    pub fn set_cursor(&mut self, line: usize) -> NeoResult<usize> {
        let moved = self.active_view_mut().map(|view| {
            view.set_cursor(line);
            view.cursor
        });
        self.report(moved)
    }

    /// Switch the active binary between decompiled and disassembly views,
    /// keeping the cursor on the same address when the other view has it.
    pub async fn toggle_view(&mut self) -> NeoResult<&ViewState> {
        let toggled = self.toggle_inner().await;
        self.report(toggled)?;
        self.active_view_ref()
    }

    async fn toggle_inner(&mut self) -> NeoResult<()> {
        let (binary, kind) = self.active.clone().ok_or(NeoError::NoActiveView)?;
        let here = self.active_view().and_then(ViewState::current_address);
        let result = self.ensure_result(&binary).await?;
        let other = kind.toggled();
        let mut state = ViewState::open(other, &binary, &result);
        if let Some(addr) = here {
            if state.jump_to(addr).is_err() {
                self.notify(
                    Severity::Info,
                    format!(
                        "{addr} has no line in the {} view; cursor left at line {}",
                        other.as_str(),
                        state.cursor
                    ),
                );
            }
        }
        let key = (binary, other);
        self.views.insert(key.clone(), state);
        self.active = Some(key);
        Ok(())
    }

    /// Go to the definition of `word`, or of the branch target on the cursor line.
    pub async fn go_to_definition(&mut self, word: &str) -> NeoResult<Definition> {
        let resolved = self.definition_inner(word).await;
        self.report(resolved)
    }

    async fn definition_inner(&mut self, word: &str) -> NeoResult<Definition> {
        let binary = self.active_binary()?;
        let result = self.ensure_result(&binary).await?;
        let line = self.active_view_ref()?.current_line().unwrap_or_default().to_string();
        let def = resolve_definition(&line, word, &result)?;
        self.active_view_mut()?.jump_to(def.address)?;
        Ok(def)
    }

    /// Lines in the active view that mention `word`.
    pub fn show_references(&mut self, word: &str) -> NeoResult<Vec<Reference>> {
        let found = self.active_view_ref().map(|v| symbols::references(&v.view, word));
        let refs = self.report(found)?;
        if refs.is_empty() {
            self.notify(Severity::Info, format!("No references to '{}'", word.trim()));
        }
        Ok(refs)
    }

    // ---- symbols ----

    pub async fn list_functions(&mut self, binary: Option<&Path>) -> NeoResult<Vec<PickerEntry>> {
        let listed = self.with_result(binary, symbols::list_functions).await;
        self.report(listed)
    }

    pub async fn list_symbols(&mut self, binary: Option<&Path>) -> NeoResult<Vec<PickerEntry>> {
        let listed = self.with_result(binary, symbols::list_symbols).await;
        self.report(listed)
    }

    async fn with_result<T>(
        &mut self,
        binary: Option<&Path>,
        f: fn(&AnalysisResult) -> T,
    ) -> NeoResult<T> {
        let path = self.target_binary(binary)?;
        let result = self.ensure_result(&path).await?;
        Ok(f(&result))
    }

    /// Selecting a picker entry jumps to its address.
    pub fn select(&mut self, entry: &PickerEntry) -> NeoResult<usize> {
        self.jump_to(entry.address)
    }

    /// Rename the symbol at `address` (default: the cursor's address). Only the
    /// cached result changes; the Ghidra project is left untouched.
    pub fn rename_symbol(
        &mut self,
        address: Option<&str>,
        new_name: &str,
    ) -> NeoResult<RenameOutcome> {
        let renamed = self.rename_inner(address, new_name);
        let outcome = self.report(renamed)?;
        self.notify(
            Severity::Info,
            format!(
                "Renamed {} to {} at {} (display only; not saved to the Ghidra project)",
                outcome.old_name, outcome.new_name, outcome.address
            ),
        );
        Ok(outcome)
    }

    fn rename_inner(&mut self, address: Option<&str>, new_name: &str) -> NeoResult<RenameOutcome> {
        let binary = self.active_binary()?;
        let target = match address {
            Some(text) => address::parse(text)?,
            None => self
                .active_view()
                .and_then(ViewState::current_address)
                .ok_or(NeoError::NoAddressAtCursor)?,
        };
        let mut cache = self.cache.lock();
        let result = cache.get_mut(&binary).ok_or_else(|| NeoError::NotAnalyzed(binary.clone()))?;
        symbols::rename(result, target, new_name)
    }

    // ---- cache ----

    /// Drop cached results for one binary or all binaries.
    pub fn clear_cache(&mut self, binary: Option<&Path>) {
        self.cache.lock().clear(binary);
        let message = match binary {
            Some(p) => format!("Cleared cache for {}", p.display()),
            None => "Cleared all cached analyses".to_string(),
        };
        self.notify(Severity::Info, message);
    }

    pub fn cache_entries(&self) -> Vec<CacheEntryInfo> {
        self.cache.lock().entries()
    }
}
