//! # Store Collaborators
//!
//! The reconciler reaches persistence only through two traits:
//!
//! - [`LocalStore`]: byte values under namespaced keys on the guest's device.
//! - [`RemoteCartStore`]: user-scoped cart rows held by the backend.
//!
//! Every call may suspend and every call may fail with a [`StoreError`]; neither
//! trait offers timeouts, so a failing store must report an error rather than hang.

pub mod anonymous;
pub mod local;

pub use anonymous::*;
pub use local::*;

use crate::model::{CartRow, CartRowCreate, CartRowId, CartRowUpdate, UserId};
use async_trait::async_trait;
use thiserror::Error;

/// Failure of a store call.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("Local store unavailable: {0}")]
    Local(String),

    #[error("Remote store unavailable: {0}")]
    Remote(String),
}

/// Device-local key/value storage.
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Backend table of cart rows scoped to a user.
#[async_trait]
pub trait RemoteCartStore: Send + Sync {
    /// All rows owned by `user_id`, in insertion order.
    async fn list(&self, user_id: &UserId) -> Result<Vec<CartRow>, StoreError>;

    async fn insert(&self, row: CartRowCreate) -> Result<CartRow, StoreError>;

    async fn update(&self, id: CartRowId, fields: CartRowUpdate) -> Result<(), StoreError>;

    async fn delete(&self, id: CartRowId) -> Result<(), StoreError>;
}
