//! # VaultCore: Composition Root
//!
//! Builds the stores against one bridge and wires the lock transition.
//! Frontends construct exactly one `VaultCore` per process and hand out
//! store handles from it; single-instance semantics come from
//! construction, not from globals.

use crate::bridge::{BoxedVaultBridge, BridgeError};
use crate::stores::items::VaultIndexStore;
use crate::stores::session::SessionGate;
use crate::stores::settings::SettingsStore;
use crate::stores::tags::TagIndexStore;
use crate::stores::totp::CodeTicker;

/// The wired-up vault state core.
pub struct VaultCore {
    bridge: BoxedVaultBridge,
    gate: SessionGate,
    settings: SettingsStore,
    tags: TagIndexStore,
    items: VaultIndexStore,
    ticker: CodeTicker,
}

impl VaultCore {
    /// Construct the stores and register the lock-transition resets:
    /// items, tags, and the code ticker are wiped synchronously when the
    /// gate flips to locked. Settings hold no vault secrets and survive.
    pub fn new(bridge: BoxedVaultBridge) -> Self {
        let gate = SessionGate::new(bridge.clone());
        let settings = SettingsStore::new(bridge.clone());
        let tags = TagIndexStore::new(bridge.clone());
        let items = VaultIndexStore::new(bridge.clone(), gate.clone(), tags.clone());
        let ticker = CodeTicker::new(bridge.clone());

        {
            let items = items.clone();
            gate.on_lock(move || items.clear_for_lock());
        }
        {
            let tags = tags.clone();
            gate.on_lock(move || tags.clear());
        }
        {
            let ticker = ticker.clone();
            gate.on_lock(move || ticker.disarm());
        }

        Self {
            bridge,
            gate,
            settings,
            tags,
            items,
            ticker,
        }
    }

    /// One-time startup: load settings. Runs before unlock.
    pub async fn init(&self) {
        self.settings.init().await;
    }

    /// Lock the vault: backend command first, then the synchronous
    /// cache wipe. A failed command leaves everything untouched.
    pub async fn lock(&self) -> Result<(), BridgeError> {
        self.gate.lock().await
    }

    /// Called once the unlock ceremony has succeeded: opens the gate
    /// and warms the tag cache and item index.
    pub async fn mark_unlocked(&self) {
        self.gate.mark_unlocked();
        self.tags.refresh().await;
        self.items.request_reload();
    }

    /// The session gate.
    pub fn gate(&self) -> &SessionGate {
        &self.gate
    }

    /// The settings store.
    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// The tag index.
    pub fn tags(&self) -> &TagIndexStore {
        &self.tags
    }

    /// The item index.
    pub fn items(&self) -> &VaultIndexStore {
        &self.items
    }

    /// The code ticker.
    pub fn ticker(&self) -> &CodeTicker {
        &self.ticker
    }

    /// The backend bridge the stores were built against.
    pub fn bridge(&self) -> &BoxedVaultBridge {
        &self.bridge
    }
}
