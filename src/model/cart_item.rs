//! Cart line items and their composite identity.
//!
//! A [`CartItem`] is what the guest intends to book. Two items describe the same line
//! when their [`CartKey`] (item type + reference id) match; the reconciler never looks
//! inside `metadata`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Display;
use std::str::FromStr;

/// Opaque per-item data (selected dates, guest count, ...).
pub type Metadata = Map<String, Value>;

/// Catalog an item's `reference_id` belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemType {
    Property,
    Tour,
    TourPackage,
    Vehicle,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Property => "property",
            ItemType::Tour => "tour",
            ItemType::TourPackage => "tourPackage",
            ItemType::Vehicle => "vehicle",
        }
    }
}

impl Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known catalog.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Unknown item type: {0:?}")]
pub struct UnknownItemType(pub String);

impl FromStr for ItemType {
    type Err = UnknownItemType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "property" => Ok(ItemType::Property),
            "tour" => Ok(ItemType::Tour),
            "tourPackage" | "tour_package" => Ok(ItemType::TourPackage),
            "vehicle" => Ok(ItemType::Vehicle),
            other => Err(UnknownItemType(other.to_string())),
        }
    }
}

/// Composite identity of a cart line: `(item_type, reference_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartKey {
    pub item_type: ItemType,
    pub reference_id: String,
}

impl CartKey {
    pub fn new(item_type: ItemType, reference_id: impl Into<String>) -> Self {
        Self {
            item_type,
            reference_id: reference_id.into(),
        }
    }
}

impl Display for CartKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.item_type, self.reference_id)
    }
}

fn default_quantity() -> u32 {
    1
}

/// One entry of an authoritative cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub item_type: ItemType,
    pub reference_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub metadata: Metadata,
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    pub fn key(&self) -> CartKey {
        CartKey::new(self.item_type, self.reference_id.clone())
    }

    pub fn matches(&self, key: &CartKey) -> bool {
        self.item_type == key.item_type && self.reference_id == key.reference_id
    }
}

/// Payload for `add`: an item before it has been timestamped by a store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCartItem {
    pub item_type: ItemType,
    pub reference_id: String,
    pub quantity: u32,
    pub metadata: Metadata,
}

impl NewCartItem {
    /// Creates a payload with quantity 1 and no metadata.
    pub fn new(item_type: ItemType, reference_id: impl Into<String>) -> Self {
        Self {
            item_type,
            reference_id: reference_id.into(),
            quantity: 1,
            metadata: Metadata::new(),
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn key(&self) -> CartKey {
        CartKey::new(self.item_type, self.reference_id.clone())
    }

    /// Checks the constraints every add must satisfy before any store is touched.
    pub fn validate(&self) -> Result<(), String> {
        if self.reference_id.trim().is_empty() {
            return Err("referenceId must not be empty".to_string());
        }
        if self.quantity == 0 {
            return Err(format!(
                "quantity must be at least 1 for {}",
                self.key()
            ));
        }
        Ok(())
    }

    /// Timestamps the payload, producing a local cart entry.
    pub fn into_item(self, added_at: DateTime<Utc>) -> CartItem {
        CartItem {
            item_type: self.item_type,
            reference_id: self.reference_id,
            quantity: self.quantity,
            metadata: self.metadata,
            added_at,
        }
    }
}
