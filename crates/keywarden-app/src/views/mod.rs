//! # View Data Types
//!
//! Plain data types that cross the bridge boundary and land in store
//! state. They are serializable, clonable, and carry no behavior beyond
//! projection between the overview and detail shapes.

pub mod items;
pub mod tags;

pub use items::{CustomField, VaultItemDetail, VaultItemOverview};
pub use tags::Tag;
