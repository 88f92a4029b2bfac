//! Type-safe handles to the actors.
//!
//! [`CartClient`] is what the UI layer holds; [`RemoteCartClient`] adapts the
//! generic [`ResourceClient`](crate::framework::ResourceClient) of the remote row
//! actor to the [`RemoteCartStore`](crate::stores::RemoteCartStore) seam.

pub mod actor_client;
pub mod cart_client;
pub mod remote_cart_client;

pub use actor_client::*;
pub use cart_client::*;
pub use remote_cart_client::*;
