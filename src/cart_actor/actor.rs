use super::events::Observers;
use super::reconciler::{Mutation, Reconciler};
use super::{CartChange, CartError, CartEvent, CartRequest, MergeReport, SessionState};
use crate::clients::CartClient;
use crate::model::{CartItem, UserId};
use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// The per-session actor.
///
/// Owns the session state and the observer registry, and drives the [`Reconciler`]
/// one request at a time. Requests that arrive during a sign-in merge wait in the
/// mailbox until it finishes.
pub struct CartActor {
    receiver: mpsc::Receiver<CartRequest>,
    reconciler: Reconciler,
    session: watch::Sender<SessionState>,
    observers: Observers,
}

impl CartActor {
    pub fn new(buffer_size: usize, reconciler: Reconciler) -> (Self, CartClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let (session, session_rx) = watch::channel(SessionState::Anonymous);
        let actor = Self {
            receiver,
            reconciler,
            session,
            observers: Observers::default(),
        };
        (actor, CartClient::new(sender, session_rx))
    }

    pub async fn run(mut self) {
        info!("Cart session started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                CartRequest::List { respond_to } => {
                    let user_id = self.user_id();
                    let result = self.reconciler.list(user_id.as_ref()).await;
                    let _ = respond_to.send(result);
                }
                CartRequest::Add { item, respond_to } => {
                    debug!(?item, "Add");
                    let key = item.key();
                    let user_id = self.user_id();
                    let result = self
                        .reconciler
                        .add(user_id.as_ref(), item, Utc::now())
                        .await;
                    let _ = respond_to.send(self.commit(CartChange::Added(key), result));
                }
                CartRequest::Remove { key, respond_to } => {
                    debug!(%key, "Remove");
                    let user_id = self.user_id();
                    let result = self.reconciler.remove(user_id.as_ref(), &key).await;
                    let _ = respond_to.send(self.commit(CartChange::Removed(key), result));
                }
                CartRequest::SetQuantity {
                    key,
                    quantity,
                    respond_to,
                } => {
                    debug!(%key, quantity, "SetQuantity");
                    let user_id = self.user_id();
                    let result = self
                        .reconciler
                        .set_quantity(user_id.as_ref(), &key, quantity)
                        .await;
                    let change = if quantity <= 0 {
                        CartChange::Removed(key)
                    } else {
                        CartChange::QuantityChanged(key)
                    };
                    let _ = respond_to.send(self.commit(change, result));
                }
                CartRequest::SignIn {
                    user_id,
                    respond_to,
                } => {
                    let result = self.sign_in(user_id).await;
                    let _ = respond_to.send(result);
                }
                CartRequest::SignOut { respond_to } => {
                    let result = self.sign_out().await;
                    let _ = respond_to.send(result);
                }
                CartRequest::Subscribe { respond_to } => {
                    let (id, events) = self.observers.subscribe();
                    debug!(subscription = id.0, "Subscribed");
                    let _ = respond_to.send((id, events));
                }
                CartRequest::Unsubscribe { id, respond_to } => {
                    let removed = self.observers.unsubscribe(id);
                    debug!(subscription = id.0, removed, "Unsubscribed");
                    let _ = respond_to.send(removed);
                }
            }
        }

        info!(session = %*self.session.borrow(), "Cart session shutdown");
    }

    fn user_id(&self) -> Option<UserId> {
        self.session.borrow().user_id().cloned()
    }

    fn emit(&mut self, change: CartChange, items: Option<Vec<CartItem>>) {
        let session = self.session.borrow().clone();
        self.observers.emit(CartEvent {
            change,
            session,
            items,
        });
    }

    /// Logs the outcome and notifies observers when a store was written.
    fn commit(
        &mut self,
        change: CartChange,
        result: Result<Mutation, CartError>,
    ) -> Result<Vec<CartItem>, CartError> {
        match result {
            Ok(mutation) => {
                if mutation.changed {
                    info!(?change, size = mutation.items.len(), "Cart changed");
                    self.emit(change, Some(mutation.items.clone()));
                }
                Ok(mutation.items)
            }
            Err(e) => {
                warn!(?change, error = %e, "Cart operation failed");
                Err(e)
            }
        }
    }

    async fn sign_in(&mut self, user_id: UserId) -> Result<MergeReport, CartError> {
        info!(%user_id, "Sign-in, merging anonymous cart");
        self.session
            .send_replace(SessionState::Merging(user_id.clone()));

        let result = self.reconciler.merge(&user_id).await;
        self.session
            .send_replace(SessionState::Authenticated(user_id.clone()));

        match result {
            Ok(report) => {
                let change = CartChange::SignedIn {
                    merged: report.merged,
                    inserted: report.inserted,
                    failed: report.failed.len(),
                };
                self.emit(change, report.items.clone());
                if report.failed.is_empty() {
                    Ok(report)
                } else {
                    warn!(%user_id, failed = report.failed.len(), "Merge partially failed");
                    Err(CartError::PartialMergeFailure {
                        user_id,
                        failed: report.failed,
                    })
                }
            }
            Err(e) => {
                warn!(%user_id, error = %e, "Merge failed");
                let change = CartChange::SignedIn {
                    merged: 0,
                    inserted: 0,
                    failed: 0,
                };
                self.emit(change, None);
                Err(e)
            }
        }
    }

    /// Returns to the anonymous cart. The remote cart is never copied back; the local
    /// cart keeps only items a partial merge left behind.
    async fn sign_out(&mut self) -> Result<(), CartError> {
        let Some(user_id) = self.user_id() else {
            debug!("Sign-out while anonymous ignored");
            return Ok(());
        };

        self.session.send_replace(SessionState::Anonymous);
        let items = match self.reconciler.list(None).await {
            Ok(items) => {
                if !items.is_empty() {
                    info!(%user_id, kept = items.len(), "Signed out with unmerged items");
                }
                Some(items)
            }
            Err(e) => {
                warn!(%user_id, error = %e, "Anonymous cart unreadable after sign-out");
                None
            }
        };
        info!(%user_id, "Signed out");
        self.emit(CartChange::SignedOut, items);
        Ok(())
    }
}
