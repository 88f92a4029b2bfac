use crate::clients::actor_client::ActorClient;
use crate::framework::{FrameworkError, ResourceClient};
use crate::model::{CartRow, CartRowCreate, CartRowId, CartRowUpdate, UserId};
use crate::stores::{RemoteCartStore, StoreError};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Client for the in-memory remote cart actor.
///
/// Implements [`RemoteCartStore`], so a session reconciler can use it directly.
#[derive(Clone)]
pub struct RemoteCartClient {
    inner: ResourceClient<CartRow>,
}

impl RemoteCartClient {
    pub fn new(inner: ResourceClient<CartRow>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ActorClient<CartRow> for RemoteCartClient {
    type Error = StoreError;

    fn inner(&self) -> &ResourceClient<CartRow> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        StoreError::Remote(e.to_string())
    }
}

#[async_trait]
impl RemoteCartStore for RemoteCartClient {
    #[instrument(skip(self))]
    async fn list(&self, user_id: &UserId) -> Result<Vec<CartRow>, StoreError> {
        debug!("Sending request");
        self.inner
            .list(user_id.clone())
            .await
            .map_err(Self::map_error)
    }

    #[instrument(skip(self, row), fields(user_id = %row.user_id, item_type = %row.item_type))]
    async fn insert(&self, row: CartRowCreate) -> Result<CartRow, StoreError> {
        debug!(?row, "Sending request");
        self.inner.create(row).await.map_err(Self::map_error)
    }

    #[instrument(skip(self))]
    async fn update(&self, id: CartRowId, fields: CartRowUpdate) -> Result<(), StoreError> {
        debug!("Sending request");
        self.inner
            .update(id, fields)
            .await
            .map(|_| ())
            .map_err(Self::map_error)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: CartRowId) -> Result<(), StoreError> {
        debug!("Sending request");
        self.inner.delete(id).await.map_err(Self::map_error)
    }
}
