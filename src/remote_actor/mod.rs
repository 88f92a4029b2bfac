//! # Remote Cart Actor
//!
//! In-memory stand-in for the hosted cart table: a
//! [`ResourceActor<CartRow>`](crate::framework::ResourceActor) whose rows are scoped by
//! [`UserId`](crate::model::UserId). Wrap its client in
//! [`RemoteCartClient`](crate::clients::RemoteCartClient) to use it as a
//! [`RemoteCartStore`](crate::stores::RemoteCartStore).
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](crate::framework::ActorEntity) implementation for [`CartRow`]
//! - [`error`] - [`CartRowError`] raised by row validation
//! - [`new()`] - Factory function that creates the actor and its client

pub mod entity;
pub mod error;

pub use error::*;

use crate::framework::{ResourceActor, ResourceClient};
use crate::model::CartRow;

/// Creates a new remote cart row actor and its client.
pub fn new(buffer_size: usize) -> (ResourceActor<CartRow>, ResourceClient<CartRow>) {
    ResourceActor::new(buffer_size)
}
