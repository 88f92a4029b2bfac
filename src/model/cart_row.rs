use crate::model::{CartItem, CartKey, ItemType, Metadata, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Store-assigned row identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CartRowId(pub u32);

impl From<u32> for CartRowId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl Display for CartRowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row_{}", self.0)
    }
}

/// Represents one row of a signed-in user's remote cart.
///
/// # Actor Framework
/// This struct implements the [`ActorEntity`](crate::framework::ActorEntity) trait,
/// allowing the in-memory remote store to manage it with a
/// [`ResourceActor`](crate::framework::ResourceActor).
///
/// See [`impl ActorEntity for CartRow`](#impl-ActorEntity-for-CartRow) for details on:
/// - Creation parameters ([`CartRowCreate`])
/// - Update parameters ([`CartRowUpdate`])
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartRow {
    pub id: CartRowId,
    pub user_id: UserId,
    pub item_type: ItemType,
    pub reference_id: String,
    pub quantity: u32,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

impl CartRow {
    pub fn key(&self) -> CartKey {
        CartKey::new(self.item_type, self.reference_id.clone())
    }

    pub fn matches(&self, key: &CartKey) -> bool {
        self.item_type == key.item_type && self.reference_id == key.reference_id
    }

    /// Projects the row onto the cart shape shown to the UI.
    pub fn into_item(self) -> CartItem {
        CartItem {
            item_type: self.item_type,
            reference_id: self.reference_id,
            quantity: self.quantity,
            metadata: self.metadata,
            added_at: self.created_at,
        }
    }
}

/// Payload for inserting a row.
#[derive(Debug, Clone, PartialEq)]
pub struct CartRowCreate {
    pub user_id: UserId,
    pub item_type: ItemType,
    pub reference_id: String,
    pub quantity: u32,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

impl CartRowCreate {
    /// Builds an insert for `user_id` carrying the item's metadata and timestamp.
    pub fn from_item(user_id: UserId, item: CartItem) -> Self {
        Self {
            user_id,
            item_type: item.item_type,
            reference_id: item.reference_id,
            quantity: item.quantity,
            metadata: item.metadata,
            created_at: item.added_at,
        }
    }
}

/// Partial update of a row; `None` fields are left untouched. Metadata is never
/// rewritten once a row exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartRowUpdate {
    pub quantity: Option<u32>,
}

impl CartRowUpdate {
    pub fn quantity(quantity: u32) -> Self {
        Self {
            quantity: Some(quantity),
        }
    }
}
