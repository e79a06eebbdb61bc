//! # Session Gate
//!
//! Tracks whether the vault is locked and propagates the lock
//! transition. Every cache-holding store registers a reset hook; on the
//! unlocked→locked transition the hooks run synchronously, before any
//! in-flight backend call gets a chance to resolve. Results of calls
//! that were outstanding at lock time are dropped afterwards by the
//! stores' own staleness checks, not here.

use keywarden_core::{Observable, Watcher};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::bridge::{BoxedVaultBridge, BridgeError, VaultBridge};

type LockHook = Box<dyn Fn() + Send + Sync>;

struct GateInner {
    bridge: BoxedVaultBridge,
    locked: Observable<bool>,
    on_lock: Mutex<Vec<LockHook>>,
}

/// Locked/unlocked session state.
///
/// A fresh gate starts locked; the unlock ceremony lives in the crypto
/// engine, and the frontend calls [`mark_unlocked`](Self::mark_unlocked)
/// once it succeeds.
#[derive(Clone)]
pub struct SessionGate {
    inner: Arc<GateInner>,
}

impl SessionGate {
    /// Create a gate in the locked state.
    pub fn new(bridge: BoxedVaultBridge) -> Self {
        Self {
            inner: Arc::new(GateInner {
                bridge,
                locked: Observable::new(true),
                on_lock: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Whether the vault is currently locked.
    pub fn is_locked(&self) -> bool {
        self.inner.locked.get()
    }

    /// Watch lock-state changes.
    pub fn watch(&self) -> Watcher<bool> {
        self.inner.locked.watch()
    }

    /// Register a hook that runs synchronously on the unlocked→locked
    /// transition. Hooks must not call back into the gate.
    pub fn on_lock(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.inner.on_lock.lock().push(Box::new(hook));
    }

    /// Lock the vault.
    ///
    /// Issues the backend lock command first; if that fails, nothing is
    /// cleared and the caller retries. On success the gate flips to
    /// locked and runs every reset hook before returning.
    pub async fn lock(&self) -> Result<(), BridgeError> {
        self.inner.bridge.lock().await?;

        if !self.inner.locked.get() {
            self.inner.locked.set(true);
            for hook in self.inner.on_lock.lock().iter() {
                hook();
            }
        }
        Ok(())
    }

    /// Flip to unlocked after a successful unlock ceremony.
    pub fn mark_unlocked(&self) {
        if self.inner.locked.get() {
            self.inner.locked.set(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedVault;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_starts_locked_and_unlocks() {
        let gate = SessionGate::new(Arc::new(ScriptedVault::new()));
        assert!(gate.is_locked());

        gate.mark_unlocked();
        assert!(!gate.is_locked());
    }

    #[tokio::test]
    async fn test_lock_runs_hooks_once_per_transition() {
        let gate = SessionGate::new(Arc::new(ScriptedVault::new()));
        let fired = Arc::new(AtomicUsize::new(0));
        {
            let fired = fired.clone();
            gate.on_lock(move || {
                fired.fetch_add(1, Ordering::SeqCst);
            });
        }

        gate.mark_unlocked();
        gate.lock().await.unwrap();
        assert!(gate.is_locked());
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        // Locking an already locked gate is a no-op for hooks.
        gate.lock().await.unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_lock_command_changes_nothing() {
        let vault = Arc::new(ScriptedVault::new());
        vault.fail_next_lock("device busy");
        let gate = SessionGate::new(vault);
        let fired = Arc::new(AtomicUsize::new(0));
        {
            let fired = fired.clone();
            gate.on_lock(move || {
                fired.fetch_add(1, Ordering::SeqCst);
            });
        }

        gate.mark_unlocked();
        let err = gate.lock().await.unwrap_err();
        assert_eq!(err.command, "lock");
        assert!(!gate.is_locked());
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_watch_observes_transitions() {
        let gate = SessionGate::new(Arc::new(ScriptedVault::new()));
        let mut watcher = gate.watch();

        gate.mark_unlocked();
        assert_eq!(watcher.poll(), Some(false));

        gate.lock().await.unwrap();
        assert_eq!(watcher.poll(), Some(true));
    }
}
