//! # Vault Index Store
//!
//! Paginated, filtered, searchable projection of vault items.
//!
//! ## Staleness protocol
//!
//! Backend completions arrive unordered and cannot be cancelled, so the
//! store mints a *request epoch* for every full reload: an increment of
//! a monotonic counter, captured at issue time and compared at
//! completion time. A completion whose epoch no longer matches is
//! discarded wholesale — it must not touch the item list and must not
//! clear `is_loading`, because a newer call owns both by then. The lock
//! transition bumps the epoch for the same reason: anything in flight at
//! lock time resolves into the void.
//!
//! `load_more` extends the current page family and therefore does *not*
//! mint an epoch; it captures the current one and discards its page if
//! any reload (or lock) moved the counter while it was in flight.
//!
//! Filter and search changes do not reload directly: they schedule a
//! debounced reload so a burst of keystrokes collapses into one query
//! using only the final filter combination.

use keywarden_core::{ItemId, Observable, Watcher};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::bridge::{BoxedVaultBridge, BridgeError, VaultBridge};
use crate::stores::session::SessionGate;
use crate::stores::tags::TagIndexStore;
use crate::views::{VaultItemDetail, VaultItemOverview};

/// Items fetched per page.
pub const PAGE_SIZE: usize = 50;

/// Quiet period after a filter/search change before reloading.
pub const RELOAD_DEBOUNCE: Duration = Duration::from_millis(150);

/// Observable state of the item index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemIndexState {
    /// Current page(s) of overview projections
    pub items: Vec<VaultItemOverview>,
    /// Whether a search call is outstanding
    pub is_loading: bool,
    /// Whether another page may exist
    pub has_more: bool,
    /// Offset of the next page
    pub offset: usize,
    /// Vault-wide item count, unfiltered
    pub total_count: u64,
    /// Vault-wide favorites count
    pub favorites_count: u64,
    /// Current search text
    pub query: String,
    /// Selected tag display name
    pub tag_filter: Option<String>,
    /// Selected category
    pub category_filter: Option<String>,
    /// Last transient query error, cleared on the next reload
    pub last_error: Option<String>,
}

struct VaultIndexInner {
    bridge: BoxedVaultBridge,
    gate: SessionGate,
    tags: TagIndexStore,
    state: Observable<ItemIndexState>,
    /// Request epoch; see the module docs.
    epoch: AtomicU64,
    /// Debounce generation for scheduled reloads.
    reload_generation: AtomicU64,
    /// Details fetched so far, by item id. Evicted on lock.
    details: Mutex<HashMap<ItemId, VaultItemDetail>>,
    page_size: usize,
}

/// Reactive store over [`ItemIndexState`].
#[derive(Clone)]
pub struct VaultIndexStore {
    inner: Arc<VaultIndexInner>,
}

impl VaultIndexStore {
    /// Create an empty index bound to a gate and a tag index.
    pub fn new(bridge: BoxedVaultBridge, gate: SessionGate, tags: TagIndexStore) -> Self {
        Self::with_page_size(bridge, gate, tags, PAGE_SIZE)
    }

    /// Create an index with a custom page size.
    pub fn with_page_size(
        bridge: BoxedVaultBridge,
        gate: SessionGate,
        tags: TagIndexStore,
        page_size: usize,
    ) -> Self {
        Self {
            inner: Arc::new(VaultIndexInner {
                bridge,
                gate,
                tags,
                state: Observable::new(ItemIndexState::default()),
                epoch: AtomicU64::new(0),
                reload_generation: AtomicU64::new(0),
                details: Mutex::new(HashMap::new()),
                page_size,
            }),
        }
    }

    /// Clone out the current state.
    pub fn state(&self) -> ItemIndexState {
        self.inner.state.get()
    }

    /// Watch index-state changes.
    pub fn watch(&self) -> Watcher<ItemIndexState> {
        self.inner.state.watch()
    }

    /// Current request epoch (diagnostic).
    pub fn epoch(&self) -> u64 {
        self.inner.epoch.load(Ordering::Acquire)
    }

    // =========================================================================
    // Filter triggers
    // =========================================================================

    /// Set the search text and schedule a debounced reload.
    pub fn set_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.inner.state.mutate(|s| s.query = query);
        self.request_reload();
    }

    /// Set or clear the tag filter (by display name) and schedule a
    /// debounced reload.
    pub fn set_tag_filter(&self, tag: Option<String>) {
        self.inner.state.mutate(|s| s.tag_filter = tag);
        self.request_reload();
    }

    /// Set or clear the category filter and schedule a debounced reload.
    pub fn set_category_filter(&self, category: Option<String>) {
        self.inner.state.mutate(|s| s.category_filter = category);
        self.request_reload();
    }

    /// Schedule a debounced full reload.
    ///
    /// Rapid successive calls collapse into a single reload that runs
    /// [`RELOAD_DEBOUNCE`] after the last one, reading whatever filters
    /// are current at that point.
    pub fn request_reload(&self) {
        let generation = self.inner.reload_generation.fetch_add(1, Ordering::AcqRel) + 1;
        let store = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(RELOAD_DEBOUNCE).await;
            if store.inner.reload_generation.load(Ordering::Acquire) != generation {
                return;
            }
            store.load_items().await;
        });
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Run a full reload from offset 0 under a fresh epoch.
    pub async fn load_items(&self) {
        if self.inner.gate.is_locked() {
            self.inner.state.mutate(|s| {
                s.items.clear();
                s.is_loading = false;
                s.has_more = false;
                s.offset = 0;
            });
            return;
        }

        let epoch = self.inner.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        let (query, tag_name, category) = self.inner.state.mutate(|s| {
            s.is_loading = true;
            s.offset = 0;
            s.last_error = None;
            (s.query.clone(), s.tag_filter.clone(), s.category_filter.clone())
        });

        // Unknown tag names degrade to "no tag filter".
        let tag_id = tag_name.as_deref().and_then(|n| self.inner.tags.tag_id_by_name(n));

        let result = self
            .inner
            .bridge
            .search_password_items(&query, tag_id, category.as_deref(), self.inner.page_size, 0)
            .await;

        // A newer reload (or a lock) supersedes this completion entirely;
        // the newer owner manages is_loading.
        if self.epoch() != epoch {
            return;
        }

        match result {
            Ok(page) => {
                let counts = self.fetch_counts().await;
                if self.epoch() != epoch {
                    return;
                }
                self.inner.state.mutate(|s| {
                    s.has_more = page.len() == self.inner.page_size;
                    s.offset = page.len();
                    s.items = page;
                    if let Some((total, favorites)) = counts {
                        s.total_count = total;
                        s.favorites_count = favorites;
                    }
                    s.is_loading = false;
                });
            }
            Err(err) => {
                tracing::warn!(error = %err, "item search failed, keeping previous list");
                self.inner.state.mutate(|s| {
                    s.is_loading = false;
                    s.last_error = Some(err.to_string());
                });
            }
        }
    }

    /// Fetch the next page under the current epoch.
    ///
    /// No-op while loading, when no further page exists, or when locked.
    /// If a full reload happened while the page was in flight, the page
    /// is discarded without touching state.
    pub async fn load_more(&self) {
        if self.inner.gate.is_locked() {
            return;
        }
        if self.inner.state.read(|s| s.is_loading || !s.has_more) {
            return;
        }

        let epoch = self.epoch();
        let (query, tag_name, category, offset) = self.inner.state.mutate(|s| {
            s.is_loading = true;
            (
                s.query.clone(),
                s.tag_filter.clone(),
                s.category_filter.clone(),
                s.offset,
            )
        });

        let tag_id = tag_name.as_deref().and_then(|n| self.inner.tags.tag_id_by_name(n));

        let result = self
            .inner
            .bridge
            .search_password_items(
                &query,
                tag_id,
                category.as_deref(),
                self.inner.page_size,
                offset,
            )
            .await;

        if self.epoch() != epoch {
            return;
        }

        match result {
            Ok(page) => {
                self.inner.state.mutate(|s| {
                    s.has_more = page.len() == self.inner.page_size;
                    s.offset += page.len();
                    s.items.extend(page);
                    s.is_loading = false;
                });
            }
            Err(err) => {
                tracing::warn!(error = %err, "page fetch failed, keeping previous list");
                self.inner.state.mutate(|s| {
                    s.is_loading = false;
                    s.last_error = Some(err.to_string());
                });
            }
        }
    }

    // =========================================================================
    // Details
    // =========================================================================

    /// Fetch the full record for an item.
    ///
    /// Cached details are served without a backend call. A fresh fetch
    /// is cached and its narrowed overview written back into the list in
    /// place, so list renders stay consistent with the opened item.
    pub async fn item_details(&self, id: ItemId) -> Result<VaultItemDetail, BridgeError> {
        if self.inner.gate.is_locked() {
            return Err(BridgeError::new("get_password_item_by_id", "vault is locked"));
        }
        if let Some(cached) = self.inner.details.lock().get(&id).cloned() {
            return Ok(cached);
        }

        let detail = self
            .inner
            .bridge
            .get_password_item_by_id(id)
            .await?
            .ok_or_else(|| {
                BridgeError::new("get_password_item_by_id", format!("{id} not found"))
            })?;

        // A lock while the fetch was in flight wins; drop the result.
        if self.inner.gate.is_locked() {
            return Err(BridgeError::new("get_password_item_by_id", "vault is locked"));
        }

        self.inner.details.lock().insert(id, detail.clone());
        let overview = detail.to_overview();
        self.inner.state.mutate(|s| {
            if let Some(slot) = s.items.iter_mut().find(|item| item.id == id) {
                *slot = overview;
            }
        });
        Ok(detail)
    }

    // =========================================================================
    // Lock handling
    // =========================================================================

    /// Synchronous wipe on the lock transition.
    ///
    /// Clears items, counts, the detail cache, and pagination state, and
    /// strands every in-flight completion by moving the epoch. Filters
    /// and search text are left alone; whether to clear them is a UI
    /// preference, not index state.
    pub fn clear_for_lock(&self) {
        self.inner.epoch.fetch_add(1, Ordering::AcqRel);
        self.inner.reload_generation.fetch_add(1, Ordering::AcqRel);
        self.inner.details.lock().clear();
        self.inner.state.mutate(|s| {
            s.items.clear();
            s.is_loading = false;
            s.has_more = false;
            s.offset = 0;
            s.total_count = 0;
            s.favorites_count = 0;
            s.last_error = None;
        });
    }

    async fn fetch_counts(&self) -> Option<(u64, u64)> {
        let total = self.inner.bridge.get_total_items_count().await;
        let favorites = self.inner.bridge.get_favorites_count().await;
        match (total, favorites) {
            (Ok(total), Ok(favorites)) => Some((total, favorites)),
            (total, favorites) => {
                for err in [total.err(), favorites.err()].into_iter().flatten() {
                    tracing::warn!(error = %err, "count refresh failed, keeping previous counts");
                }
                None
            }
        }
    }
}
