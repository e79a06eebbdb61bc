//! # Tag Index Store
//!
//! Small cache of tag metadata and per-tag item counts. Refresh is
//! idempotent and single-flight: a refresh issued while one is already
//! in flight is dropped on the floor (not queued), and callers rely on
//! the in-flight call's eventual result. The store's main consumer is
//! the item index, which resolves a tag display name to the backend id
//! used as a search filter.

use keywarden_core::{Observable, TagId, Watcher};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::bridge::{BoxedVaultBridge, VaultBridge};
use crate::views::Tag;

/// Cached tag metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagsState {
    /// All tags known to the backend
    pub tags: Vec<Tag>,
    /// Item count per tag id
    pub counts: HashMap<TagId, u64>,
}

struct TagIndexInner {
    bridge: BoxedVaultBridge,
    state: Observable<TagsState>,
    refreshing: AtomicBool,
}

/// Reactive store over [`TagsState`].
#[derive(Clone)]
pub struct TagIndexStore {
    inner: Arc<TagIndexInner>,
}

impl TagIndexStore {
    /// Create an empty tag index.
    pub fn new(bridge: BoxedVaultBridge) -> Self {
        Self {
            inner: Arc::new(TagIndexInner {
                bridge,
                state: Observable::new(TagsState::default()),
                refreshing: AtomicBool::new(false),
            }),
        }
    }

    /// Clone out the current state.
    pub fn state(&self) -> TagsState {
        self.inner.state.get()
    }

    /// Watch tag-state changes.
    pub fn watch(&self) -> Watcher<TagsState> {
        self.inner.state.watch()
    }

    /// Refetch tags and counts from the backend.
    ///
    /// No-op while another refresh is in flight. A failed fetch keeps
    /// the previous cache and is logged only.
    pub async fn refresh(&self) {
        if self.inner.refreshing.swap(true, Ordering::AcqRel) {
            return;
        }

        let fetched = async {
            let tags = self.inner.bridge.get_tags().await?;
            let counts = self.inner.bridge.get_tag_counts().await?;
            Ok::<_, crate::bridge::BridgeError>(TagsState { tags, counts })
        }
        .await;

        match fetched {
            Ok(state) => self.inner.state.set(state),
            Err(err) => {
                tracing::warn!(error = %err, "tag refresh failed, keeping cached tags");
            }
        }
        self.inner.refreshing.store(false, Ordering::Release);
    }

    /// Resolve a tag display name to its backend id.
    ///
    /// `None` means "no such tag" and callers treat it as no tag filter,
    /// never as an error.
    pub fn tag_id_by_name(&self, name: &str) -> Option<TagId> {
        self.inner
            .state
            .read(|s| s.tags.iter().find(|t| t.name == name).map(|t| t.id))
    }

    /// Item count for a tag, 0 when unknown.
    pub fn count_for(&self, id: TagId) -> u64 {
        self.inner
            .state
            .read(|s| s.counts.get(&id).copied().unwrap_or(0))
    }

    /// Drop the cache (lock transition).
    pub fn clear(&self) {
        self.inner.state.set(TagsState::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedVault;
    use std::time::Duration;

    fn tag(id: i64, name: &str) -> Tag {
        Tag {
            id: TagId(id),
            name: name.into(),
            color: None,
        }
    }

    #[tokio::test]
    async fn test_refresh_populates_tags_and_counts() {
        let vault = Arc::new(ScriptedVault::new());
        vault.set_tags(vec![tag(1, "work"), tag(2, "personal")]);
        vault.set_tag_counts([(TagId(1), 4), (TagId(2), 0)]);

        let store = TagIndexStore::new(vault.clone());
        store.refresh().await;

        assert_eq!(store.state().tags.len(), 2);
        assert_eq!(store.tag_id_by_name("work"), Some(TagId(1)));
        assert_eq!(store.tag_id_by_name("missing"), None);
        assert_eq!(store.count_for(TagId(1)), 4);
        assert_eq!(store.count_for(TagId(9)), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_refresh_is_dropped() {
        let vault = Arc::new(ScriptedVault::new());
        vault.set_tags(vec![tag(1, "work")]);
        vault.set_tag_fetch_delay(Duration::from_millis(200));

        let store = TagIndexStore::new(vault.clone());

        let slow = tokio::spawn({
            let store = store.clone();
            async move { store.refresh().await }
        });
        tokio::task::yield_now().await;

        // Second refresh while the first is in flight: no second fetch.
        store.refresh().await;
        assert_eq!(vault.tag_fetches(), 1);

        tokio::time::advance(Duration::from_millis(250)).await;
        slow.await.unwrap();
        assert_eq!(store.tag_id_by_name("work"), Some(TagId(1)));
        assert_eq!(vault.tag_fetches(), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_cache() {
        let vault = Arc::new(ScriptedVault::new());
        vault.set_tags(vec![tag(1, "work")]);

        let store = TagIndexStore::new(vault.clone());
        store.refresh().await;
        assert_eq!(store.state().tags.len(), 1);

        vault.fail_next_tag_fetch("db closed");
        store.refresh().await;
        assert_eq!(store.state().tags.len(), 1);

        // The guard was released; a later refresh works again.
        vault.set_tags(vec![tag(1, "work"), tag(2, "personal")]);
        store.refresh().await;
        assert_eq!(store.state().tags.len(), 2);
    }

    #[tokio::test]
    async fn test_clear_drops_cache() {
        let vault = Arc::new(ScriptedVault::new());
        vault.set_tags(vec![tag(1, "work")]);

        let store = TagIndexStore::new(vault.clone());
        store.refresh().await;
        store.clear();

        assert_eq!(store.state(), TagsState::default());
        assert_eq!(store.tag_id_by_name("work"), None);
    }
}
