//! # Vault Item Projections
//!
//! Two shapes for the same entity: [`VaultItemOverview`] is what the
//! list renders (no secret material), [`VaultItemDetail`] is the full
//! record including secrets, fetched only when an item is opened.
//!
//! A detail narrows to an overview via
//! [`to_overview`](VaultItemDetail::to_overview) so a freshly fetched
//! record can be written back into the list without going through the
//! backend again. The narrowing direction is always detail → overview;
//! the stores never overwrite a cached detail with list data.

use keywarden_core::ItemId;
use serde::{Deserialize, Serialize};

/// Lightweight list projection of a vault item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultItemOverview {
    /// Backend identifier
    pub id: ItemId,
    /// Display title
    pub title: String,
    /// Item category ("login", "card", "note", ...), free-form
    pub category: String,
    /// Tag names attached to this item
    pub tags: Vec<String>,
    /// Account name, if the item has one
    pub username: Option<String>,
    /// Primary URL, if the item has one
    pub url: Option<String>,
    /// Display color override
    pub color: Option<String>,
    /// Whether the user pinned this item as a favorite
    pub favorite: bool,
    /// Creation time (ms since epoch)
    pub created_at_ms: u64,
    /// Last modification time (ms since epoch)
    pub updated_at_ms: u64,
}

/// A free-form extra field on a vault item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    /// Field label shown in the UI
    pub label: String,
    /// Field value
    pub value: String,
    /// Whether the value is masked until revealed
    pub concealed: bool,
}

/// Full vault item record, including secret fields.
///
/// Superset of [`VaultItemOverview`]. Lives only in the detail cache and
/// in open-item views; the list never holds one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultItemDetail {
    /// Backend identifier
    pub id: ItemId,
    /// Display title
    pub title: String,
    /// Item category, free-form
    pub category: String,
    /// Tag names attached to this item
    pub tags: Vec<String>,
    /// Account name
    pub username: Option<String>,
    /// Primary URL
    pub url: Option<String>,
    /// Display color override
    pub color: Option<String>,
    /// Whether the user pinned this item as a favorite
    pub favorite: bool,
    /// Creation time (ms since epoch)
    pub created_at_ms: u64,
    /// Last modification time (ms since epoch)
    pub updated_at_ms: u64,

    /// The stored password
    pub password: Option<String>,
    /// Base32 TOTP secret, if the item has a one-time code configured
    pub totp_secret: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
    /// Additional user-defined fields
    pub custom_fields: Vec<CustomField>,
}

impl VaultItemDetail {
    /// Narrow this record to its list projection.
    pub fn to_overview(&self) -> VaultItemOverview {
        VaultItemOverview {
            id: self.id,
            title: self.title.clone(),
            category: self.category.clone(),
            tags: self.tags.clone(),
            username: self.username.clone(),
            url: self.url.clone(),
            color: self.color.clone(),
            favorite: self.favorite,
            created_at_ms: self.created_at_ms,
            updated_at_ms: self.updated_at_ms,
        }
    }

    /// Whether this item has a one-time code configured.
    pub fn has_totp(&self) -> bool {
        self.totp_secret.as_deref().is_some_and(|s| !s.is_empty())
    }
}
