//! Change notifications for UI observers.

use super::SessionState;
use crate::model::{CartItem, CartKey};
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tracing::debug;

/// What a committed change did.
#[derive(Debug, Clone, PartialEq)]
pub enum CartChange {
    Added(CartKey),
    Removed(CartKey),
    QuantityChanged(CartKey),
    SignedIn { merged: usize, inserted: usize, failed: usize },
    SignedOut,
}

/// Emitted after every committed mutation and session transition.
#[derive(Debug, Clone, PartialEq)]
pub struct CartEvent {
    pub change: CartChange,
    pub session: SessionState,
    /// The authoritative cart after the change, when the actor already had it in hand.
    /// `None` means observers should call `list()` to refresh.
    pub items: Option<Vec<CartItem>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// Registry of subscribers, owned by the session actor.
#[derive(Debug, Default)]
pub struct Observers {
    next_id: u64,
    subscribers: BTreeMap<SubscriptionId, mpsc::UnboundedSender<CartEvent>>,
}

impl Observers {
    pub fn subscribe(&mut self) -> (SubscriptionId, mpsc::UnboundedReceiver<CartEvent>) {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers.insert(id, sender);
        (id, receiver)
    }

    /// Returns whether `id` was subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Delivers `event` to every subscriber, dropping those whose receiver is gone.
    pub fn emit(&mut self, event: CartEvent) {
        self.subscribers.retain(|id, sender| {
            let alive = sender.send(event.clone()).is_ok();
            if !alive {
                debug!(subscription = id.0, "Dropping closed subscriber");
            }
            alive
        });
    }
}
