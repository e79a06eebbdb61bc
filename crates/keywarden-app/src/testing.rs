//! Scripted bridge for store tests.
//!
//! [`ScriptedVault`] implements [`VaultBridge`] with scripted outcomes
//! and per-call latencies. Latencies are realized with `tokio::time::
//! sleep`, so paused-clock tests control completion order precisely —
//! which is how the out-of-order and single-flight protocols get
//! exercised deterministically. Every command records its calls for
//! assertions, and the clock is fully manual.
//!
//! Available to unit tests and, through the `test-helpers` feature, to
//! integration tests.

use async_trait::async_trait;
use keywarden_core::{ItemId, TagId};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crate::bridge::{BridgeError, VaultBridge};
use crate::views::{CustomField, Tag, VaultItemDetail, VaultItemOverview};

/// A recorded `search_password_items` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCall {
    /// Search text
    pub query: String,
    /// Tag filter
    pub tag_id: Option<TagId>,
    /// Category filter
    pub category: Option<String>,
    /// Page size
    pub limit: usize,
    /// Page offset
    pub offset: usize,
}

struct Scripted<T> {
    delay_ms: u64,
    outcome: Result<T, String>,
}

/// Test bridge with scripted outcomes and a manual clock.
#[derive(Default)]
pub struct ScriptedVault {
    clock_ms: AtomicU64,

    settings: Mutex<Option<String>>,
    saved_settings: Mutex<Vec<String>>,
    settings_load_failures: Mutex<VecDeque<String>>,
    settings_save_failures: Mutex<VecDeque<String>>,

    searches: Mutex<VecDeque<Scripted<Vec<VaultItemOverview>>>>,
    search_calls: Mutex<Vec<SearchCall>>,
    total_count: AtomicU64,
    favorites_count: AtomicU64,

    details: Mutex<HashMap<ItemId, VaultItemDetail>>,
    detail_fetches: AtomicUsize,

    tags: Mutex<Vec<Tag>>,
    tag_counts: Mutex<HashMap<TagId, u64>>,
    tag_fetch_delay_ms: AtomicU64,
    tag_fetches: AtomicUsize,
    tag_fetch_failures: Mutex<VecDeque<String>>,

    totps: Mutex<VecDeque<Scripted<String>>>,
    totp_calls: AtomicUsize,

    lock_failures: Mutex<VecDeque<String>>,
    lock_calls: AtomicUsize,
}

impl ScriptedVault {
    /// Empty vault, clock at 0.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Clock
    // =========================================================================

    /// Set the manual clock.
    pub fn set_clock(&self, since_epoch: Duration) {
        self.clock_ms
            .store(since_epoch.as_millis() as u64, Ordering::Release);
    }

    /// Advance the manual clock.
    pub fn advance_clock(&self, delta: Duration) {
        self.clock_ms
            .fetch_add(delta.as_millis() as u64, Ordering::AcqRel);
    }

    // =========================================================================
    // Settings scripting
    // =========================================================================

    /// Seed the persisted settings blob.
    pub fn set_settings_blob(&self, blob: impl Into<String>) {
        *self.settings.lock() = Some(blob.into());
    }

    /// Blobs written via `set_all_settings`, in order.
    pub fn saved_settings(&self) -> Vec<String> {
        self.saved_settings.lock().clone()
    }

    /// Make the next `get_all_settings` fail.
    pub fn fail_next_settings_load(&self, message: impl Into<String>) {
        self.settings_load_failures.lock().push_back(message.into());
    }

    /// Make the next `set_all_settings` fail.
    pub fn fail_next_settings_save(&self, message: impl Into<String>) {
        self.settings_save_failures.lock().push_back(message.into());
    }

    // =========================================================================
    // Search scripting
    // =========================================================================

    /// Queue a search outcome with a completion latency.
    ///
    /// Outcomes are consumed in call order; a call with an empty queue
    /// returns an empty page immediately.
    pub fn push_search(&self, delay_ms: u64, outcome: Result<Vec<VaultItemOverview>, String>) {
        self.searches.lock().push_back(Scripted { delay_ms, outcome });
    }

    /// All recorded search calls.
    pub fn search_calls(&self) -> Vec<SearchCall> {
        self.search_calls.lock().clone()
    }

    /// Set the vault-wide counts.
    pub fn set_counts(&self, total: u64, favorites: u64) {
        self.total_count.store(total, Ordering::Release);
        self.favorites_count.store(favorites, Ordering::Release);
    }

    // =========================================================================
    // Detail scripting
    // =========================================================================

    /// Register a detail record for `get_password_item_by_id`.
    pub fn add_detail(&self, detail: VaultItemDetail) {
        self.details.lock().insert(detail.id, detail);
    }

    /// Number of detail fetches issued.
    pub fn detail_fetches(&self) -> usize {
        self.detail_fetches.load(Ordering::Acquire)
    }

    // =========================================================================
    // Tag scripting
    // =========================================================================

    /// Set the tag list.
    pub fn set_tags(&self, tags: Vec<Tag>) {
        *self.tags.lock() = tags;
    }

    /// Set the per-tag counts.
    pub fn set_tag_counts(&self, counts: impl IntoIterator<Item = (TagId, u64)>) {
        *self.tag_counts.lock() = counts.into_iter().collect();
    }

    /// Latency applied to `get_tags`.
    pub fn set_tag_fetch_delay(&self, delay: Duration) {
        self.tag_fetch_delay_ms
            .store(delay.as_millis() as u64, Ordering::Release);
    }

    /// Number of tag fetches issued.
    pub fn tag_fetches(&self) -> usize {
        self.tag_fetches.load(Ordering::Acquire)
    }

    /// Make the next `get_tags` fail.
    pub fn fail_next_tag_fetch(&self, message: impl Into<String>) {
        self.tag_fetch_failures.lock().push_back(message.into());
    }

    // =========================================================================
    // Code scripting
    // =========================================================================

    /// Queue a code computation outcome with a completion latency.
    ///
    /// A call with an empty queue returns `"000000"` immediately.
    pub fn push_totp(&self, delay_ms: u64, outcome: Result<String, String>) {
        self.totps.lock().push_back(Scripted { delay_ms, outcome });
    }

    /// Number of code computations issued.
    pub fn totp_calls(&self) -> usize {
        self.totp_calls.load(Ordering::Acquire)
    }

    // =========================================================================
    // Lock scripting
    // =========================================================================

    /// Make the next `lock` fail.
    pub fn fail_next_lock(&self, message: impl Into<String>) {
        self.lock_failures.lock().push_back(message.into());
    }

    /// Number of lock commands issued.
    pub fn lock_calls(&self) -> usize {
        self.lock_calls.load(Ordering::Acquire)
    }
}

#[async_trait]
impl VaultBridge for ScriptedVault {
    async fn get_all_settings(&self) -> Result<Option<String>, BridgeError> {
        if let Some(message) = self.settings_load_failures.lock().pop_front() {
            return Err(BridgeError::new("get_all_settings", message));
        }
        Ok(self.settings.lock().clone())
    }

    async fn set_all_settings(&self, settings: String) -> Result<(), BridgeError> {
        if let Some(message) = self.settings_save_failures.lock().pop_front() {
            return Err(BridgeError::new("set_all_settings", message));
        }
        *self.settings.lock() = Some(settings.clone());
        self.saved_settings.lock().push(settings);
        Ok(())
    }

    async fn search_password_items(
        &self,
        query: &str,
        tag_id: Option<TagId>,
        category: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<VaultItemOverview>, BridgeError> {
        self.search_calls.lock().push(SearchCall {
            query: query.to_string(),
            tag_id,
            category: category.map(str::to_string),
            limit,
            offset,
        });

        let script = self.searches.lock().pop_front();
        match script {
            Some(Scripted { delay_ms, outcome }) => {
                if delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                outcome.map_err(|message| BridgeError::new("search_password_items", message))
            }
            None => Ok(Vec::new()),
        }
    }

    async fn get_password_item_by_id(
        &self,
        id: ItemId,
    ) -> Result<Option<VaultItemDetail>, BridgeError> {
        self.detail_fetches.fetch_add(1, Ordering::AcqRel);
        Ok(self.details.lock().get(&id).cloned())
    }

    async fn get_total_items_count(&self) -> Result<u64, BridgeError> {
        Ok(self.total_count.load(Ordering::Acquire))
    }

    async fn get_favorites_count(&self) -> Result<u64, BridgeError> {
        Ok(self.favorites_count.load(Ordering::Acquire))
    }

    async fn get_tags(&self) -> Result<Vec<Tag>, BridgeError> {
        self.tag_fetches.fetch_add(1, Ordering::AcqRel);
        if let Some(message) = self.tag_fetch_failures.lock().pop_front() {
            return Err(BridgeError::new("get_tags", message));
        }
        let delay_ms = self.tag_fetch_delay_ms.load(Ordering::Acquire);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        Ok(self.tags.lock().clone())
    }

    async fn get_tag_counts(&self) -> Result<HashMap<TagId, u64>, BridgeError> {
        Ok(self.tag_counts.lock().clone())
    }

    async fn generate_totp(&self, _secret_b32: &str) -> Result<String, BridgeError> {
        self.totp_calls.fetch_add(1, Ordering::AcqRel);
        let script = self.totps.lock().pop_front();
        match script {
            Some(Scripted { delay_ms, outcome }) => {
                if delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                outcome.map_err(|message| BridgeError::new("generate_totp", message))
            }
            None => Ok("000000".to_string()),
        }
    }

    async fn lock(&self) -> Result<(), BridgeError> {
        self.lock_calls.fetch_add(1, Ordering::AcqRel);
        if let Some(message) = self.lock_failures.lock().pop_front() {
            return Err(BridgeError::new("lock", message));
        }
        Ok(())
    }

    fn current_time_ms(&self) -> u64 {
        self.clock_ms.load(Ordering::Acquire)
    }
}

/// Build an overview fixture.
pub fn overview(id: i64, title: &str) -> VaultItemOverview {
    VaultItemOverview {
        id: ItemId(id),
        title: title.to_string(),
        category: "login".into(),
        tags: Vec::new(),
        username: Some(format!("user-{id}")),
        url: None,
        color: None,
        favorite: false,
        created_at_ms: 1_000 * id as u64,
        updated_at_ms: 2_000 * id as u64,
    }
}

/// Build a detail fixture with secret fields filled in.
pub fn detail(id: i64, title: &str) -> VaultItemDetail {
    VaultItemDetail {
        id: ItemId(id),
        title: title.to_string(),
        category: "login".into(),
        tags: Vec::new(),
        username: Some(format!("user-{id}")),
        url: None,
        color: None,
        favorite: false,
        created_at_ms: 1_000 * id as u64,
        updated_at_ms: 2_000 * id as u64,
        password: Some(format!("pw-{id}")),
        totp_secret: None,
        notes: Some("note".into()),
        custom_fields: vec![CustomField {
            label: "pin".into(),
            value: format!("{id:04}"),
            concealed: true,
        }],
    }
}
