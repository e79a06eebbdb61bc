//! Keywarden App - Portable Headless Vault Core
//!
//! This crate is the client-side state core of the Keywarden password
//! manager. It owns no rendering and no cryptography: frontends read
//! store state through observable subscriptions, and everything that
//! needs system resources (the encrypted database, key derivation, TOTP
//! computation) sits behind the [`VaultBridge`] boundary.
//!
//! ## Architecture
//!
//! ```text
//! frontend (desktop / terminal)        backend (crypto + storage)
//! ┌──────────────────────────┐         ┌───────────────────────┐
//! │  watch() + commands      │         │  implements           │
//! │     ┌────────────┐       │         │  VaultBridge          │
//! │     │ VaultCore  │◄──────┼─────────┤                       │
//! │     └────────────┘       │         └───────────────────────┘
//! └──────────────────────────┘
//! ```
//!
//! `VaultCore` wires together five stores:
//!
//! - [`SessionGate`]: locked/unlocked state; wipes downstream caches on
//!   the lock transition.
//! - [`SettingsStore`]: merged user configuration with debounced,
//!   coalesced persistence.
//! - [`TagIndexStore`]: tag metadata and per-tag counts.
//! - [`VaultIndexStore`]: the paginated, filtered item list, guarded
//!   against out-of-order completions by request epochs.
//! - [`CodeTicker`]: the one-time-code countdown loop.
//!
//! All backend calls are asynchronous and unordered; staleness is
//! handled after the fact (epoch checks, single-flight guards), never by
//! cancelling in-flight work.

#![forbid(unsafe_code)]

pub mod bridge;
pub mod core;
pub mod settings;
pub mod stores;
pub mod views;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use crate::bridge::{BoxedVaultBridge, BridgeError, MemoryVault, VaultBridge};
pub use crate::core::VaultCore;
pub use crate::settings::Settings;
pub use crate::stores::items::{ItemIndexState, VaultIndexStore};
pub use crate::stores::session::SessionGate;
pub use crate::stores::settings::SettingsStore;
pub use crate::stores::tags::{TagIndexStore, TagsState};
pub use crate::stores::totp::{CodeState, CodeTicker};
pub use crate::views::{CustomField, Tag, VaultItemDetail, VaultItemOverview};

pub use keywarden_core::{ItemId, Observable, TagId, Watcher};
