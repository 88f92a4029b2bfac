//! Source of the signed-in user.

use crate::model::UserId;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::info;

/// A sign-in (`Some`) or sign-out (`None`).
pub type IdentityTransition = Option<UserId>;

#[derive(Debug, Default)]
struct State {
    current: Option<UserId>,
    listeners: Vec<mpsc::UnboundedSender<IdentityTransition>>,
}

/// Holds the current user id (or none) and delivers every transition, in order, to
/// each subscriber.
///
/// [`CartSystem::follow_identity`](crate::lifecycle::CartSystem::follow_identity)
/// turns these transitions into sign-in merges and sign-outs.
#[derive(Debug, Default)]
pub struct IdentityProvider {
    state: Mutex<State>,
}

impl IdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, transition: IdentityTransition) {
        let mut state = self.lock();
        state.current = transition.clone();
        state
            .listeners
            .retain(|listener| listener.send(transition.clone()).is_ok());
    }

    pub fn sign_in(&self, user_id: impl Into<UserId>) {
        let user_id = user_id.into();
        info!(%user_id, "Identity signed in");
        self.publish(Some(user_id));
    }

    pub fn sign_out(&self) {
        info!("Identity signed out");
        self.publish(None);
    }

    pub fn current(&self) -> Option<UserId> {
        self.lock().current.clone()
    }

    /// Transitions from now on. A user already signed in arrives first.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<IdentityTransition> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut state = self.lock();
        if state.current.is_some() {
            let _ = sender.send(state.current.clone());
        }
        state.listeners.push(sender);
        receiver
    }
}
