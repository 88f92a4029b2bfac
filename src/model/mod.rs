//! Pure data structures shared by the cart actors and the stores.
//!
//! [`CartRow`] implements the [`ActorEntity`](crate::framework::ActorEntity) trait so the
//! in-memory remote store can run it inside a [`ResourceActor`](crate::framework::ResourceActor).

pub mod cart_item;
pub mod cart_row;
pub mod user;

pub use cart_item::*;
pub use cart_row::*;
pub use user::*;
