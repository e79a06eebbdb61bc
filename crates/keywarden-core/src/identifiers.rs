//! Identifier types used across the Keywarden vault core
//!
//! The backend addresses vault items and tags by numeric row identifiers.
//! These newtypes keep the two id spaces from being mixed up at compile
//! time and give call sites a vocabulary (`ItemId`, `TagId`) instead of
//! bare integers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a vault item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl ItemId {
    /// Get the raw numeric id.
    pub fn raw(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item-{}", self.0)
    }
}

impl From<i64> for ItemId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

/// Identifier of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(pub i64);

impl TagId {
    /// Get the raw numeric id.
    pub fn raw(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tag-{}", self.0)
    }
}

impl From<i64> for TagId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(ItemId(7).to_string(), "item-7");
        assert_eq!(TagId(3).to_string(), "tag-3");
    }

    #[test]
    fn test_serde_transparent() {
        let id: ItemId = serde_json::from_str("42").unwrap();
        assert_eq!(id, ItemId(42));
        assert_eq!(serde_json::to_string(&TagId(9)).unwrap(), "9");
    }
}
