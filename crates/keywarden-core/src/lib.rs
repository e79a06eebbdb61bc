//! Keywarden Core - Foundation Layer
//!
//! Foundational types shared by every layer of the Keywarden vault core.
//! This crate is deliberately small and runtime-agnostic: it contains the
//! reactive observable primitive that stores are built on and the
//! identifier newtypes used across the backend boundary, nothing else.
//!
//! Application logic lives in `keywarden-app`; this crate must never grow
//! a dependency on an async runtime or on the backend bridge.

#![forbid(unsafe_code)]

/// Item and tag identifier newtypes
pub mod identifiers;

/// Observable values with poll-based change subscriptions
pub mod reactive;

pub use identifiers::{ItemId, TagId};
pub use reactive::{Observable, Watcher};
