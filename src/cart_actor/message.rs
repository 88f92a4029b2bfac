//! Requests understood by the cart session actor.

use super::{CartError, CartEvent, MergeReport, SubscriptionId};
use crate::model::{CartItem, CartKey, NewCartItem, UserId};
use tokio::sync::{mpsc, oneshot};

/// Type alias for the one-shot reply channel of fallible requests.
pub type Reply<T> = oneshot::Sender<Result<T, CartError>>;

/// Internal message type sent to [`CartActor`](super::CartActor).
///
/// The actor handles one request at a time in arrival order. That single
/// ordering is what serializes same-key writes and holds `add` calls back while
/// a sign-in merge is running.
#[derive(Debug)]
pub enum CartRequest {
    List {
        respond_to: Reply<Vec<CartItem>>,
    },
    Add {
        item: NewCartItem,
        respond_to: Reply<Vec<CartItem>>,
    },
    Remove {
        key: CartKey,
        respond_to: Reply<Vec<CartItem>>,
    },
    SetQuantity {
        key: CartKey,
        quantity: i64,
        respond_to: Reply<Vec<CartItem>>,
    },
    SignIn {
        user_id: UserId,
        respond_to: Reply<MergeReport>,
    },
    SignOut {
        respond_to: Reply<()>,
    },
    Subscribe {
        respond_to: oneshot::Sender<(SubscriptionId, mpsc::UnboundedReceiver<CartEvent>)>,
    },
    Unsubscribe {
        id: SubscriptionId,
        respond_to: oneshot::Sender<bool>,
    },
}
