//! Error types for the cart session actor.

use crate::model::{CartKey, UserId};
use crate::stores::StoreError;
use thiserror::Error;

/// Errors returned by every cart operation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CartError {
    /// Malformed input, rejected before any store is touched.
    #[error("Cart validation error: {0}")]
    Validation(String),

    /// A local or remote store call failed; the cart is unchanged.
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),

    /// Some anonymous items could not be merged. They stay in the anonymous cart;
    /// everything else was committed.
    #[error("Merge for user {user_id} left {} item(s) in the anonymous cart", .failed.len())]
    PartialMergeFailure {
        user_id: UserId,
        failed: Vec<CartKey>,
    },

    /// The session actor is gone or dropped the reply.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}
