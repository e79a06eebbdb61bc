//! # Stores
//!
//! The reactive service objects that hold UI state. Each store keeps its
//! state in an [`Observable`](keywarden_core::Observable) and exposes a
//! `watch()` for frontends; mutations happen through store methods only.
//!
//! Stores are constructed explicitly and passed by handle (cheap clones
//! of an inner `Arc`) — there are no module-level globals. `VaultCore`
//! in the crate root is the composition root that wires them together.

pub mod items;
pub mod session;
pub mod settings;
pub mod tags;
pub mod totp;
