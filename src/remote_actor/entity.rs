//! ActorEntity trait implementation for [`CartRow`].
//!
//! Validation lives in the hooks so that every writer of the in-memory remote store,
//! not only the reconciler, gets the same row invariants.

use super::error::CartRowError;
use crate::framework::ActorEntity;
use crate::model::{CartRow, CartRowCreate, CartRowId, CartRowUpdate, UserId};

impl ActorEntity for CartRow {
    type Id = CartRowId;
    type Create = CartRowCreate;
    type Update = CartRowUpdate;
    type Filter = UserId;
    type Error = CartRowError;

    fn from_create_params(id: CartRowId, params: CartRowCreate) -> Result<Self, CartRowError> {
        Ok(Self {
            id,
            user_id: params.user_id,
            item_type: params.item_type,
            reference_id: params.reference_id,
            quantity: params.quantity,
            metadata: params.metadata,
            created_at: params.created_at,
        })
    }

    fn on_create(&mut self) -> Result<(), CartRowError> {
        if self.reference_id.trim().is_empty() {
            return Err(CartRowError::EmptyReference);
        }
        if self.quantity == 0 {
            return Err(CartRowError::InvalidQuantity(self.quantity));
        }
        Ok(())
    }

    /// # Fields Updated
    /// - `quantity`: must stay positive
    fn on_update(&mut self, update: CartRowUpdate) -> Result<(), CartRowError> {
        if let Some(quantity) = update.quantity {
            if quantity == 0 {
                return Err(CartRowError::InvalidQuantity(quantity));
            }
            self.quantity = quantity;
        }
        Ok(())
    }

    fn matches(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }
}
