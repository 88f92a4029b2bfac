//! The cart session: one actor per browsing session.
//!
//! The [`CartActor`] decides which store is authoritative from its [`SessionState`]
//! and runs the sign-in merge. UI code talks to it through
//! [`CartClient`](crate::clients::CartClient).

pub mod actor;
pub mod error;
pub mod events;
pub mod message;
pub mod reconciler;
pub mod session;

pub use actor::CartActor;
pub use error::CartError;
pub use events::{CartChange, CartEvent, SubscriptionId};
pub use message::{CartRequest, Reply};
pub use reconciler::{MergeReport, Mutation, Reconciler};
pub use session::SessionState;

use crate::clients::CartClient;
use crate::stores::{AnonymousCart, LocalStore, RemoteCartStore};
use std::sync::Arc;

/// Creates a new cart session actor and its client.
pub fn new(
    buffer_size: usize,
    storage_key: &str,
    local: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteCartStore>,
) -> (CartActor, CartClient) {
    let reconciler = Reconciler::new(AnonymousCart::new(local, storage_key), remote);
    CartActor::new(buffer_size, reconciler)
}
