use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::cache::{normalize_path, SharedCache};
use crate::error::{NeoError, NeoResult};
use crate::model::AnalysisResult;
use crate::project::{project_name, NeoConfig, ProjectLayout};
use crate::services::backends::{headless_args, resolve_headless_path, run_with_timeout};
use crate::services::output::{decode_payload, extract_payload, stderr_advisories};

/// Successful analysis plus any non-fatal stderr advisories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    pub advisories: Vec<String>,
}

type Slot = watch::Receiver<Option<NeoResult<AnalysisOutcome>>>;

/// Runs headless analyses and stores successful results in the shared cache.
///
/// Requests for a path that already has an invocation in flight wait for that
/// invocation instead of spawning a second analyzer.
pub struct AnalysisService {
    config: NeoConfig,
    layout: ProjectLayout,
    cache: SharedCache,
    in_flight: Mutex<HashMap<PathBuf, Slot>>,
}

/// Removes the in-flight entry even if the leading request is dropped mid-run.
struct InFlightGuard<'a> {
    map: &'a Mutex<HashMap<PathBuf, Slot>>,
    key: PathBuf,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.map.lock().remove(&self.key);
    }
}

impl AnalysisService {
    pub fn new(config: NeoConfig, cache: SharedCache) -> Self {
        let layout = ProjectLayout::new(&config);
        Self { config, layout, cache, in_flight: Mutex::new(HashMap::new()) }
    }

    pub fn config(&self) -> &NeoConfig {
        &self.config
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    /// Number of invocations currently running.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Analyze `binary`, coalescing with any in-flight request for the same path.
    pub async fn analyze(&self, binary: &Path) -> NeoResult<AnalysisOutcome> {
        let key = normalize_path(binary);
        loop {
            let (mut slot, sender) = {
                let mut map = self.in_flight.lock();
                match map.get(&key) {
                    Some(existing) => (existing.clone(), None),
                    None => {
                        let (tx, rx) = watch::channel(None);
                        map.insert(key.clone(), rx.clone());
                        (rx, Some(tx))
                    }
                }
            };

            if let Some(tx) = sender {
                let _guard = InFlightGuard { map: &self.in_flight, key: key.clone() };
                let outcome = self.invoke(&key).await;
                if let Ok(done) = &outcome {
                    self.cache.lock().set(&key, done.result.clone());
                }
                let _ = tx.send(Some(outcome.clone()));
                return outcome;
            }

            info!(binary = %key.display(), "joining in-flight analysis");
            let finished =
                slot.wait_for(Option::is_some).await.ok().and_then(|value| (*value).clone());
            if let Some(outcome) = finished {
                return outcome;
            }
            // Leader was dropped before finishing; try again, possibly as leader.
        }
    }

    /// Return the cached result for `binary`, analyzing it first on a miss.
    pub async fn ensure(&self, binary: &Path) -> NeoResult<AnalysisOutcome> {
        let cached = self.cache.lock().get(binary).cloned();
        if let Some(result) = cached {
            return Ok(AnalysisOutcome { result, advisories: Vec::new() });
        }
        self.analyze(binary).await
    }

    async fn invoke(&self, binary: &Path) -> NeoResult<AnalysisOutcome> {
        if !binary.is_file() {
            return Err(NeoError::MissingBinary(binary.to_path_buf()));
        }

        let analyzer = resolve_headless_path(&self.config)?;
        self.layout.ensure_dirs()?;
        self.layout.ensure_script()?;

        let project = project_name(binary);
        let args = headless_args(&self.layout, &project, binary);
        info!(binary = %binary.display(), project = %project, "starting headless analysis");

        let output = run_with_timeout(&analyzer, &args, self.config.timeout()).await?;

        let result = match extract_payload(&output.combined()).and_then(|p| decode_payload(&p)) {
            Ok(result) => result,
            Err(NeoError::MalformedOutput(_)) if !output.success => {
                return Err(NeoError::ProcessFailed(output.code));
            }
            Err(e) => return Err(e),
        };

        if !output.success {
            warn!(code = ?output.code, "analyzer exited unsuccessfully but produced a payload");
        }

        let advisories = stderr_advisories(&output.stderr);
        for line in &advisories {
            warn!(binary = %binary.display(), "analyzer stderr: {line}");
        }

        info!(
            program = %result.program_name,
            functions = result.functions.len(),
            symbols = result.symbols.len(),
            "analysis finished"
        );
        Ok(AnalysisOutcome { result, advisories })
    }
}
