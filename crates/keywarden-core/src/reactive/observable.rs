//! Observable<T> - shared state with version-counted change tracking

// Lock poisoning only happens if a writer panicked mid-mutation; there is
// no sane recovery, so expect() is the intended handling.
#![allow(clippy::expect_used)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

struct Shared<T> {
    value: RwLock<T>,
    version: AtomicU64,
}

/// A shared value whose mutations can be observed by polling.
///
/// Cloning an `Observable` clones the handle, not the value: all clones
/// see the same state. Mutations go through [`set`](Observable::set) or
/// [`mutate`](Observable::mutate), both of which bump an internal version
/// counter. A [`Watcher`] created via [`watch`](Observable::watch)
/// remembers the last version it saw and reports a change exactly once
/// per version jump, however many mutations that jump covers.
#[derive(Clone)]
pub struct Observable<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Clone + Send + Sync + 'static> Observable<T> {
    /// Create a new observable holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            shared: Arc::new(Shared {
                value: RwLock::new(value),
                version: AtomicU64::new(0),
            }),
        }
    }

    /// Clone out the current value.
    pub fn get(&self) -> T {
        self.shared
            .value
            .read()
            .expect("observable lock poisoned")
            .clone()
    }

    /// Read the current value without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.shared.value.read().expect("observable lock poisoned"))
    }

    /// Replace the value and signal a change.
    pub fn set(&self, value: T) {
        {
            let mut guard = self.shared.value.write().expect("observable lock poisoned");
            *guard = value;
        }
        self.shared.version.fetch_add(1, Ordering::Release);
    }

    /// Mutate the value in place and signal a change.
    ///
    /// The closure's return value is passed through, which lets callers
    /// extract data from the same critical section they mutated in.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let out = {
            let mut guard = self.shared.value.write().expect("observable lock poisoned");
            f(&mut guard)
        };
        self.shared.version.fetch_add(1, Ordering::Release);
        out
    }

    /// Current version counter. Bumps by one per `set`/`mutate`.
    pub fn version(&self) -> u64 {
        self.shared.version.load(Ordering::Acquire)
    }

    /// Create a watcher positioned at the current version.
    ///
    /// The watcher reports only changes made after this call.
    pub fn watch(&self) -> Watcher<T> {
        Watcher {
            shared: self.shared.clone(),
            seen: self.shared.version.load(Ordering::Acquire),
        }
    }
}

impl<T: Clone + Send + Sync + Default + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + Send + Sync + std::fmt::Debug + 'static> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.get())
            .field("version", &self.version())
            .finish()
    }
}

/// A poll-based subscription to an [`Observable`].
pub struct Watcher<T> {
    shared: Arc<Shared<T>>,
    seen: u64,
}

impl<T: Clone + Send + Sync + 'static> Watcher<T> {
    /// Whether the observable changed since the last poll.
    pub fn changed(&self) -> bool {
        self.shared.version.load(Ordering::Acquire) > self.seen
    }

    /// Poll for a new value.
    ///
    /// Returns `Some(state)` if the observable was mutated since the last
    /// poll (or since the watcher was created), advancing the watcher's
    /// position. Intermediate states between polls are not replayed; only
    /// the latest value is returned.
    pub fn poll(&mut self) -> Option<T> {
        let current = self.shared.version.load(Ordering::Acquire);
        if current > self.seen {
            self.seen = current;
            Some(
                self.shared
                    .value
                    .read()
                    .expect("observable lock poisoned")
                    .clone(),
            )
        } else {
            None
        }
    }

    /// Clone out the current value, changed or not.
    pub fn get(&self) -> T {
        self.shared
            .value
            .read()
            .expect("observable lock poisoned")
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set() {
        let obs = Observable::new(1);
        assert_eq!(obs.get(), 1);
        obs.set(5);
        assert_eq!(obs.get(), 5);
    }

    #[test]
    fn test_mutate_passes_result_through() {
        let obs = Observable::new(vec![1, 2, 3]);
        let len = obs.mutate(|v| {
            v.push(4);
            v.len()
        });
        assert_eq!(len, 4);
        assert_eq!(obs.get(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_read_without_clone() {
        let obs = Observable::new(String::from("abc"));
        let len = obs.read(|s| s.len());
        assert_eq!(len, 3);
    }

    #[test]
    fn test_clones_share_state() {
        let a = Observable::new(0);
        let b = a.clone();
        a.set(9);
        assert_eq!(b.get(), 9);
    }

    #[test]
    fn test_version_bumps_per_mutation() {
        let obs = Observable::new(0);
        assert_eq!(obs.version(), 0);
        obs.set(1);
        obs.mutate(|v| *v += 1);
        assert_eq!(obs.version(), 2);
    }

    #[test]
    fn test_watcher_poll_once_per_change() {
        let obs = Observable::new(0);
        let mut watcher = obs.watch();

        assert_eq!(watcher.poll(), None);

        obs.set(1);
        assert!(watcher.changed());
        assert_eq!(watcher.poll(), Some(1));
        assert_eq!(watcher.poll(), None);
    }

    #[test]
    fn test_watcher_coalesces_bursts() {
        let obs = Observable::new(0);
        let mut watcher = obs.watch();

        obs.set(1);
        obs.set(2);
        obs.set(3);

        assert_eq!(watcher.poll(), Some(3));
        assert_eq!(watcher.poll(), None);
    }

    #[test]
    fn test_watcher_get_ignores_position() {
        let obs = Observable::new(7);
        let watcher = obs.watch();
        obs.set(8);
        assert_eq!(watcher.get(), 8);
    }

    #[test]
    fn test_multiple_watchers_independent() {
        let obs = Observable::new(0);
        let mut w1 = obs.watch();
        let mut w2 = obs.watch();

        obs.set(42);
        assert_eq!(w1.poll(), Some(42));
        assert_eq!(w2.poll(), Some(42));
        assert_eq!(w1.poll(), None);
    }
}
