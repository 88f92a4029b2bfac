//! Error types for the remote cart row actor.

use thiserror::Error;

/// Rejections raised by [`CartRow`](crate::model::CartRow) hooks.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CartRowError {
    /// Rows always carry at least one unit.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// The catalog reference is blank.
    #[error("Cart row has an empty referenceId")]
    EmptyReference,
}
