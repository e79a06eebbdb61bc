//! In-memory bridge for demos and offline mode.

use async_trait::async_trait;
use keywarden_core::{ItemId, TagId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{BridgeError, VaultBridge};
use crate::views::{Tag, VaultItemDetail, VaultItemOverview};

/// An unencrypted, in-memory `VaultBridge` implementation.
///
/// Backs demo frontends and tests. Items and tags live in plain memory,
/// settings persistence is a string slot, and `generate_totp` derives a
/// stand-in code (the real code generator lives in the crypto engine,
/// not here). The clock defaults to system time but can be frozen and
/// advanced manually, which paused-clock tests rely on.
#[derive(Default)]
pub struct MemoryVault {
    settings: Mutex<Option<String>>,
    items: Mutex<Vec<VaultItemDetail>>,
    tags: Mutex<Vec<Tag>>,
    /// 0 = follow system time; anything else is a frozen manual clock.
    manual_clock_ms: AtomicU64,
}

impl MemoryVault {
    /// Create an empty vault following system time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item to the vault.
    pub fn add_item(&self, item: VaultItemDetail) {
        self.items.lock().push(item);
    }

    /// Add a tag definition.
    pub fn add_tag(&self, tag: Tag) {
        self.tags.lock().push(tag);
    }

    /// Freeze the clock at `ms`. Subsequent `current_time_ms` calls
    /// return the frozen value until advanced again.
    pub fn set_clock_ms(&self, ms: u64) {
        self.manual_clock_ms.store(ms, Ordering::Release);
    }

    /// Advance a frozen clock by `delta_ms`.
    pub fn advance_clock_ms(&self, delta_ms: u64) {
        self.manual_clock_ms.fetch_add(delta_ms, Ordering::AcqRel);
    }

    /// The raw persisted settings blob, for inspection.
    pub fn persisted_settings(&self) -> Option<String> {
        self.settings.lock().clone()
    }

    fn matches(item: &VaultItemDetail, query: &str, tag: Option<&str>, category: Option<&str>) -> bool {
        if let Some(category) = category {
            if item.category != category {
                return false;
            }
        }
        if let Some(tag) = tag {
            if !item.tags.iter().any(|t| t == tag) {
                return false;
            }
        }
        if query.is_empty() {
            return true;
        }
        let q = query.to_lowercase();
        item.title.to_lowercase().contains(&q)
            || item
                .username
                .as_deref()
                .is_some_and(|u| u.to_lowercase().contains(&q))
            || item
                .url
                .as_deref()
                .is_some_and(|u| u.to_lowercase().contains(&q))
    }
}

#[async_trait]
impl VaultBridge for MemoryVault {
    async fn get_all_settings(&self) -> Result<Option<String>, BridgeError> {
        Ok(self.settings.lock().clone())
    }

    async fn set_all_settings(&self, settings: String) -> Result<(), BridgeError> {
        *self.settings.lock() = Some(settings);
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
        // Resolve the tag id back to a name; items carry names only.
        let tag_name = match tag_id {
            Some(id) => {
                let tags = self.tags.lock();
                match tags.iter().find(|t| t.id == id) {
                    Some(tag) => Some(tag.name.clone()),
                    // Unknown tag id matches nothing.
                    None => return Ok(Vec::new()),
                }
            }
            None => None,
        };

        let items = self.items.lock();
        let mut hits: Vec<VaultItemOverview> = items
            .iter()
            .filter(|item| Self::matches(item, query, tag_name.as_deref(), category))
            .map(VaultItemDetail::to_overview)
            .collect();
        hits.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));

        Ok(hits.into_iter().skip(offset).take(limit).collect())
    }

    async fn get_password_item_by_id(
        &self,
        id: ItemId,
    ) -> Result<Option<VaultItemDetail>, BridgeError> {
        Ok(self.items.lock().iter().find(|i| i.id == id).cloned())
    }

    async fn get_total_items_count(&self) -> Result<u64, BridgeError> {
        Ok(self.items.lock().len() as u64)
    }

    async fn get_favorites_count(&self) -> Result<u64, BridgeError> {
        Ok(self.items.lock().iter().filter(|i| i.favorite).count() as u64)
    }

    async fn get_tags(&self) -> Result<Vec<Tag>, BridgeError> {
        Ok(self.tags.lock().clone())
    }

    async fn get_tag_counts(&self) -> Result<HashMap<TagId, u64>, BridgeError> {
        let tags = self.tags.lock();
        let items = self.items.lock();
        let mut counts = HashMap::new();
        for tag in tags.iter() {
            let n = items.iter().filter(|i| i.tags.contains(&tag.name)).count() as u64;
            counts.insert(tag.id, n);
        }
        Ok(counts)
    }

    async fn generate_totp(&self, secret_b32: &str) -> Result<String, BridgeError> {
        if secret_b32.is_empty() {
            return Err(BridgeError::new("generate_totp", "empty secret"));
        }
        // Deterministic stand-in: stable per (secret, 30s step), not a
        // real RFC 6238 code. The crypto engine owns the real thing.
        let step = self.current_time_ms() / 1_000 / 30;
        let seed: u64 = secret_b32.bytes().map(u64::from).sum();
        Ok(format!("{:06}", (seed.wrapping_mul(31).wrapping_add(step)) % 1_000_000))
    }

    async fn lock(&self) -> Result<(), BridgeError> {
        Ok(())
    }

    fn current_time_ms(&self) -> u64 {
        let manual = self.manual_clock_ms.load(Ordering::Acquire);
        if manual != 0 {
            return manual;
        }
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}
