//! # VaultBridge: Abstract Backend Operations
//!
//! The `VaultBridge` trait is the narrow command surface between the
//! state core and the backend that owns the encrypted database, key
//! derivation, and code generation. Keeping the boundary abstract means
//! the stores never touch system resources directly:
//!
//! ```text
//! keywarden-app (pure)          backend runtime
//! ┌─────────────────┐           ┌──────────────────┐
//! │ stores          │           │ crypto engine,   │
//! │   ┌───────────┐ │           │ storage, OS      │
//! │   │VaultBridge│◄┼───────────┤ implements trait │
//! │   └───────────┘ │           └──────────────────┘
//! └─────────────────┘
//! ```
//!
//! Every call is asynchronous and may fail with an opaque
//! [`BridgeError`]; completions are unordered and are never cancelled
//! from this side. The stores impose their own staleness protocols on
//! top (request epochs, single-flight guards).
//!
//! `current_time_ms` is deliberately part of the bridge: it is the one
//! time source the core consults, so tests can substitute a controlled
//! clock and drive the code ticker deterministically.

mod memory;

pub use memory::MemoryVault;

use async_trait::async_trait;
use keywarden_core::{ItemId, TagId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::views::{Tag, VaultItemDetail, VaultItemOverview};

/// Error returned by backend commands.
///
/// The backend reports failures as strings; this core treats them as
/// opaque and only routes them (log, transient UI message). The failing
/// command name is carried for log context.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{command} failed: {message}")]
pub struct BridgeError {
    /// Backend command that failed
    pub command: &'static str,
    /// Opaque failure description from the backend
    pub message: String,
}

impl BridgeError {
    /// Create a bridge error for `command`.
    pub fn new(command: &'static str, message: impl Into<String>) -> Self {
        Self {
            command,
            message: message.into(),
        }
    }
}

/// Backend command surface consumed by the state core.
///
/// Implemented by the production runtime and by [`MemoryVault`] for
/// demos and tests. All methods are async except the time source.
#[async_trait]
pub trait VaultBridge: Send + Sync {
    // =========================================================================
    // Settings persistence
    // =========================================================================

    /// Fetch the persisted settings blob, if any was ever written.
    async fn get_all_settings(&self) -> Result<Option<String>, BridgeError>;

    /// Persist the full settings blob, replacing any previous one.
    async fn set_all_settings(&self, settings: String) -> Result<(), BridgeError>;

    // =========================================================================
    // Item index
    // =========================================================================

    /// Search vault items, returning overview projections.
    ///
    /// `query` matches title/username/url substrings; `tag_id` and
    /// `category` are conjunctive filters (None means no filter).
    /// Results are paginated by `limit`/`offset` in a stable order.
    async fn search_password_items(
        &self,
        query: &str,
        tag_id: Option<TagId>,
        category: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<VaultItemOverview>, BridgeError>;

    /// Fetch the full record for one item, secrets included.
    async fn get_password_item_by_id(
        &self,
        id: ItemId,
    ) -> Result<Option<VaultItemDetail>, BridgeError>;

    /// Total number of items in the vault, unfiltered.
    async fn get_total_items_count(&self) -> Result<u64, BridgeError>;

    /// Number of items pinned as favorites.
    async fn get_favorites_count(&self) -> Result<u64, BridgeError>;

    // =========================================================================
    // Tags
    // =========================================================================

    /// All tags defined in the vault.
    async fn get_tags(&self) -> Result<Vec<Tag>, BridgeError>;

    /// Item count per tag id.
    async fn get_tag_counts(&self) -> Result<HashMap<TagId, u64>, BridgeError>;

    // =========================================================================
    // One-time codes
    // =========================================================================

    /// Compute the current one-time code for a base32 secret.
    ///
    /// The backend evaluates the code at its own call time; the caller
    /// decides when a new time step warrants asking again.
    async fn generate_totp(&self, secret_b32: &str) -> Result<String, BridgeError>;

    // =========================================================================
    // Session
    // =========================================================================

    /// Lock the vault: wipe derived keys and close the database.
    async fn lock(&self) -> Result<(), BridgeError>;

    // =========================================================================
    // Time
    // =========================================================================

    /// Current wall-clock time in milliseconds since the Unix epoch.
    ///
    /// The only time source the core consults. Production bridges return
    /// system time; test bridges return a controlled clock so countdown
    /// and step arithmetic are reproducible.
    fn current_time_ms(&self) -> u64;
}

/// Type alias for a shared bridge handle.
pub type BoxedVaultBridge = Arc<dyn VaultBridge>;
