//! # Settings Store
//!
//! Single source of truth for user configuration. Loads once at startup,
//! merging the persisted blob over compiled-in defaults, then persists on
//! mutation with debounced, coalesced writes: mutations apply to memory
//! synchronously, and a save task fires after a quiet period and writes
//! the state *as of flush time*. A failed write is logged and dropped —
//! memory stays authoritative and the next mutation schedules another
//! attempt.

use keywarden_core::{Observable, Watcher};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::bridge::{BoxedVaultBridge, VaultBridge};
use crate::settings::Settings;

/// Quiet period before a scheduled save is written.
pub const SAVE_DEBOUNCE: Duration = Duration::from_millis(500);

struct SettingsStoreInner {
    bridge: BoxedVaultBridge,
    state: Observable<Settings>,
    initialized: AtomicBool,
    /// Bumped per scheduled save; only the task holding the latest
    /// generation writes, so bursts coalesce into one write.
    save_generation: AtomicU64,
}

impl SettingsStoreInner {
    /// Serialize and write the current state. Failures are logged only;
    /// in-memory state stays authoritative either way.
    async fn write_current(&self) {
        let blob = match serde_json::to_string(&self.state.get()) {
            Ok(blob) => blob,
            Err(err) => {
                tracing::warn!(error = %err, "settings serialization failed, save skipped");
                return;
            }
        };
        if let Err(err) = self.bridge.set_all_settings(blob).await {
            tracing::warn!(error = %err, "settings save failed, keeping in-memory state");
        }
    }
}

/// Reactive store over [`Settings`].
#[derive(Clone)]
pub struct SettingsStore {
    inner: Arc<SettingsStoreInner>,
}

impl SettingsStore {
    /// Create a store holding the compiled-in defaults.
    ///
    /// Call [`init`](Self::init) once to load the persisted state.
    pub fn new(bridge: BoxedVaultBridge) -> Self {
        Self {
            inner: Arc::new(SettingsStoreInner {
                bridge,
                state: Observable::new(Settings::default()),
                initialized: AtomicBool::new(false),
                save_generation: AtomicU64::new(0),
            }),
        }
    }

    /// Load the persisted blob and merge it over the defaults.
    ///
    /// Runs at process start, before unlock. Never fails: a missing or
    /// unusable blob leaves the defaults in place. On a true first run
    /// (nothing persisted at all) the defaults are written back once.
    pub async fn init(&self) {
        match self.inner.bridge.get_all_settings().await {
            Ok(Some(blob)) => {
                self.inner.state.set(Settings::from_persisted(&blob));
            }
            Ok(None) => {
                // First run: seed the persistence layer with defaults.
                self.inner.write_current().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "settings load failed, using defaults");
            }
        }
        self.inner.initialized.store(true, Ordering::Release);
    }

    /// Whether [`init`](Self::init) has completed.
    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.load(Ordering::Acquire)
    }

    /// Clone out the current settings.
    pub fn settings(&self) -> Settings {
        self.inner.state.get()
    }

    /// Read the current settings without cloning.
    pub fn read<R>(&self, f: impl FnOnce(&Settings) -> R) -> R {
        self.inner.state.read(f)
    }

    /// Watch settings changes.
    pub fn watch(&self) -> Watcher<Settings> {
        self.inner.state.watch()
    }

    /// Mutate settings in memory and schedule a debounced save.
    ///
    /// The mutation is visible to readers immediately; the write happens
    /// after [`SAVE_DEBOUNCE`] of quiet, with the then-current state.
    pub fn update(&self, f: impl FnOnce(&mut Settings)) {
        self.inner.state.mutate(f);
        self.schedule_save();
    }

    /// Record a database path as most recently opened.
    pub fn push_recent_database(&self, path: impl Into<String>) {
        let path = path.into();
        self.update(|s| s.push_recent_database(path));
    }

    /// Drop all configuration back to the compiled-in defaults and
    /// persist immediately (explicit user action, no debounce).
    pub async fn reset_to_defaults(&self) {
        self.inner.state.set(Settings::default());
        self.flush_now().await;
    }

    /// Write the current state immediately, superseding any pending
    /// debounced save.
    pub async fn flush_now(&self) {
        self.inner.save_generation.fetch_add(1, Ordering::AcqRel);
        self.inner.write_current().await;
    }

    fn schedule_save(&self) {
        let generation = self.inner.save_generation.fetch_add(1, Ordering::AcqRel) + 1;
        let inner = self.inner.clone();
        tokio::spawn(async move {
            tokio::time::sleep(SAVE_DEBOUNCE).await;
            // A later mutation (or flush) superseded this save.
            if inner.save_generation.load(Ordering::Acquire) != generation {
                return;
            }
            inner.write_current().await;
        });
    }
}
