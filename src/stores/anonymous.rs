//! The guest's cart as one JSON blob under a namespaced local key.

use super::{LocalStore, StoreError};
use crate::model::CartItem;
use std::sync::Arc;
use tracing::{debug, warn};

/// Whole-blob access to the anonymous cart.
///
/// The cart is always read and written as a unit; writing an empty cart removes the
/// key instead of storing `[]`.
#[derive(Clone)]
pub struct AnonymousCart {
    store: Arc<dyn LocalStore>,
    key: String,
}

impl AnonymousCart {
    pub fn new(store: Arc<dyn LocalStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Reads the cart. A missing key is an empty cart.
    ///
    /// A blob that does not decode, or that holds a zero quantity, is an error and
    /// stays in place untouched. Entries repeating a key are folded into the first.
    pub async fn load(&self) -> Result<Vec<CartItem>, StoreError> {
        let Some(bytes) = self.store.get(&self.key).await? else {
            return Ok(Vec::new());
        };
        let decoded = serde_json::from_slice::<Vec<CartItem>>(&bytes).map_err(|e| {
            warn!(key = %self.key, error = %e, "Anonymous cart does not decode");
            StoreError::Local(format!("undecodable anonymous cart: {e}"))
        })?;
        let items = normalize(decoded).map_err(|reason| {
            warn!(key = %self.key, %reason, "Anonymous cart is inconsistent");
            StoreError::Local(format!("inconsistent anonymous cart: {reason}"))
        })?;
        debug!(key = %self.key, count = items.len(), "Anonymous cart loaded");
        Ok(items)
    }

    pub async fn save(&self, items: &[CartItem]) -> Result<(), StoreError> {
        if items.is_empty() {
            return self.store.remove(&self.key).await;
        }
        let bytes = serde_json::to_vec(items).map_err(|e| StoreError::Local(e.to_string()))?;
        self.store.set(&self.key, bytes).await
    }
}

fn normalize(decoded: Vec<CartItem>) -> Result<Vec<CartItem>, String> {
    let mut items: Vec<CartItem> = Vec::with_capacity(decoded.len());
    for item in decoded {
        let key = item.key();
        if item.quantity == 0 {
            return Err(format!("{key} has quantity 0"));
        }
        match items.iter_mut().find(|existing| existing.matches(&key)) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(item.quantity)
                    .ok_or_else(|| format!("quantity overflow for {key}"))?;
            }
            None => items.push(item),
        }
    }
    Ok(items)
}
