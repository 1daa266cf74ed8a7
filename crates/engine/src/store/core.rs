//! Core [`ActionStore`] struct: file-backed action registry with hot reload.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{info, warn};

use crate::error::Result;

use super::registry::{resolve_registry, ActionRegistry, FactoryTable, RawAction};
use super::watcher::handle_fs_event;

/// Minimum interval between watcher-triggered reloads. Editors often write
/// a file in several steps; this collapses the burst into one reload.
pub(super) const RELOAD_DEBOUNCE: Duration = Duration::from_millis(500);

/// File-backed action store.
///
/// `load()` parses the JSON actions file, resolves every definition through
/// the factory table into a brand-new [`ActionRegistry`], and publishes it
/// with a single atomic swap. Readers take one snapshot per evaluation and
/// never observe a partially built registry; a failed reload leaves the
/// previous snapshot current.
pub struct ActionStore {
    inner: Arc<StoreInner>,
    /// Active filesystem watcher (held to keep it alive).
    watcher: Option<RecommendedWatcher>,
}

/// State shared with the watcher callback.
pub(super) struct StoreInner {
    pub(super) path: PathBuf,
    pub(super) factories: FactoryTable,
    registry: RwLock<Arc<ActionRegistry>>,
    pub(super) debounce: Mutex<DebounceState>,
}

/// Debounce bookkeeping for watcher-triggered reloads.
///
/// Events inside the window don't reload immediately, but they must not be
/// lost either: editors save in multiple steps and the last write is the one
/// that matters. `reload_queued` marks a trailing reload already scheduled
/// for the end of the current window.
#[derive(Default)]
pub(super) struct DebounceState {
    pub(super) last_reload: Option<Instant>,
    pub(super) reload_queued: bool,
}

impl StoreInner {
    /// Parse and resolve the actions file, then swap in the new registry.
    pub(super) fn load(&self) -> Result<usize> {
        let contents = fs::read_to_string(&self.path)?;
        let raw: IndexMap<String, RawAction> = serde_json::from_str(&contents)?;
        let registry = resolve_registry(raw, &self.factories);
        let count = registry.len();
        *self
            .registry
            .write()
            .expect("registry lock poisoned") = Arc::new(registry);
        Ok(count)
    }

    pub(super) fn snapshot(&self) -> Arc<ActionRegistry> {
        Arc::clone(&self.registry.read().expect("registry lock poisoned"))
    }
}

impl ActionStore {
    /// Store for the given actions file with the built-in action types
    /// registered.
    pub fn new(path: PathBuf) -> Self {
        Self::with_factories(path, FactoryTable::with_builtins())
    }

    /// Store with a caller-supplied factory table.
    pub fn with_factories(path: PathBuf, factories: FactoryTable) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                path,
                factories,
                registry: RwLock::new(Arc::new(ActionRegistry::new())),
                debounce: Mutex::new(DebounceState::default()),
            }),
            watcher: None,
        }
    }

    /// Load (or reload) the actions file.
    ///
    /// On failure the previous registry stays current and the error is
    /// returned; for the initial load there is no previous registry, so the
    /// caller should surface the error loudly.
    pub fn load(&self) -> Result<usize> {
        let count = self.inner.load()?;
        info!(path = %self.inner.path.display(), actions = count, "loaded actions file");
        Ok(count)
    }

    /// Snapshot of the current registry. Evaluations hold this one `Arc`
    /// and are unaffected by concurrent reloads.
    pub fn snapshot(&self) -> Arc<ActionRegistry> {
        self.inner.snapshot()
    }

    /// Registered action-type factories.
    pub fn factories(&self) -> &FactoryTable {
        &self.inner.factories
    }

    /// Path of the backing actions file.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Start watching the actions file for external modification.
    ///
    /// Create/modify events trigger a debounced full reload; a reload that
    /// fails to parse keeps the previous registry. Idempotent.
    pub fn watch(&mut self) -> Result<()> {
        if self.watcher.is_some() {
            return Ok(());
        }

        let inner = Arc::clone(&self.inner);
        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => handle_fs_event(&event, &inner),
                Err(e) => warn!(error = %e, "filesystem watcher error"),
            },
        )?;

        // Watch the parent directory: editors that replace the file via
        // rename would otherwise detach a file-level watch.
        let dir = self
            .inner
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        let _ = watcher
            .configure(notify::Config::default().with_poll_interval(Duration::from_millis(500)));

        info!(path = %self.inner.path.display(), "watching actions file for changes");
        self.watcher = Some(watcher);
        Ok(())
    }

    /// Stop watching and release the watch handle. Idempotent.
    pub fn stop_watching(&mut self) {
        if self.watcher.take().is_some() {
            info!(path = %self.inner.path.display(), "stopped watching actions file");
        }
    }

    #[cfg(test)]
    pub(super) fn inner(&self) -> &Arc<StoreInner> {
        &self.inner
    }
}

impl Drop for ActionStore {
    fn drop(&mut self) {
        self.stop_watching();
    }
}
