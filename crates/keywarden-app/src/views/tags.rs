//! Tag metadata as reported by the backend.

use keywarden_core::TagId;
use serde::{Deserialize, Serialize};

/// A user-defined tag attached to vault items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Backend identifier, used as the search filter parameter
    pub id: TagId,
    /// Display name; unique per vault
    pub name: String,
    /// Optional display color (CSS-style hex string)
    pub color: Option<String>,
}
