use crate::cart_actor::{
    CartError, CartEvent, CartRequest, MergeReport, Reply, SessionState, SubscriptionId,
};
use crate::model::{CartItem, CartKey, ItemType, NewCartItem, UserId};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, instrument};

/// Handle to a cart session, used by the UI layer.
///
/// Every mutating call returns the authoritative cart after the change.
#[derive(Clone)]
pub struct CartClient {
    sender: mpsc::Sender<CartRequest>,
    session: watch::Receiver<SessionState>,
}

fn closed() -> CartError {
    CartError::ActorCommunicationError("Actor closed".into())
}

fn dropped() -> CartError {
    CartError::ActorCommunicationError("Actor dropped response channel".into())
}

impl CartClient {
    pub fn new(sender: mpsc::Sender<CartRequest>, session: watch::Receiver<SessionState>) -> Self {
        Self { sender, session }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> CartRequest,
    ) -> Result<T, CartError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| closed())?;
        response.await.map_err(|_| dropped())?
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<CartItem>, CartError> {
        debug!("Sending request");
        self.request(|respond_to| CartRequest::List { respond_to })
            .await
    }

    #[instrument(skip(self, item), fields(item_type = %item.item_type, reference_id = %item.reference_id))]
    pub async fn add(&self, item: NewCartItem) -> Result<Vec<CartItem>, CartError> {
        debug!(?item, "Sending request");
        self.request(|respond_to| CartRequest::Add { item, respond_to })
            .await
    }

    #[instrument(skip(self))]
    pub async fn remove(
        &self,
        item_type: ItemType,
        reference_id: &str,
    ) -> Result<Vec<CartItem>, CartError> {
        debug!("Sending request");
        let key = CartKey::new(item_type, reference_id);
        self.request(|respond_to| CartRequest::Remove { key, respond_to })
            .await
    }

    /// Overwrites the quantity; zero or less removes the item.
    #[instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        item_type: ItemType,
        reference_id: &str,
        quantity: i64,
    ) -> Result<Vec<CartItem>, CartError> {
        debug!("Sending request");
        let key = CartKey::new(item_type, reference_id);
        self.request(|respond_to| CartRequest::SetQuantity {
            key,
            quantity,
            respond_to,
        })
        .await
    }

    /// Total quantity across the cart, for badge display.
    pub async fn item_count(&self) -> Result<u64, CartError> {
        let items = self.list().await?;
        Ok(items.iter().map(|item| u64::from(item.quantity)).sum())
    }

    /// Current session state. `Merging` is only visible while a sign-in is running.
    pub fn session(&self) -> SessionState {
        self.session.borrow().clone()
    }

    /// A receiver that observes every session transition.
    pub fn watch_session(&self) -> watch::Receiver<SessionState> {
        self.session.clone()
    }

    /// Signs in and merges the anonymous cart into `user_id`'s cart.
    ///
    /// Returns [`CartError::PartialMergeFailure`] when some items could not be
    /// merged; the session is authenticated either way.
    #[instrument(skip(self))]
    pub async fn sign_in(&self, user_id: UserId) -> Result<MergeReport, CartError> {
        debug!("Sending request");
        self.request(|respond_to| CartRequest::SignIn {
            user_id,
            respond_to,
        })
        .await
    }

    /// Signs out. The anonymous cart holds only items an earlier merge could not
    /// write; the remote cart is never copied back.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<(), CartError> {
        debug!("Sending request");
        self.request(|respond_to| CartRequest::SignOut { respond_to })
            .await
    }

    /// Registers an observer. Events arrive after every committed change until the
    /// receiver is dropped or [`CartClient::unsubscribe`] is called.
    pub async fn subscribe(
        &self,
    ) -> Result<(SubscriptionId, mpsc::UnboundedReceiver<CartEvent>), CartError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(CartRequest::Subscribe { respond_to })
            .await
            .map_err(|_| closed())?;
        response.await.map_err(|_| dropped())
    }

    /// Returns whether `id` was still subscribed.
    pub async fn unsubscribe(&self, id: SubscriptionId) -> Result<bool, CartError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(CartRequest::Unsubscribe { id, respond_to })
            .await
            .map_err(|_| closed())?;
        response.await.map_err(|_| dropped())
    }
}
