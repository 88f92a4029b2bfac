use crate::clients::{CartClient, RemoteCartClient};
use crate::config::CartConfig;
use crate::identity::IdentityTransition;
use crate::model::UserId;
use crate::stores::{FileLocalStore, LocalStore, MemoryLocalStore, RemoteCartStore};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Runs one cart session and the stores behind it.
///
/// `CartSystem` is responsible for:
/// - **Lifecycle Management**: Starting and stopping the session actor and, when it
///   owns one, the in-memory remote cart actor
/// - **Dependency Wiring**: Handing both stores to the session's reconciler
/// - **Identity Following**: Turning identity transitions into sign-in merges and
///   sign-outs
///
/// # Example
///
/// ```ignore
/// let system = CartSystem::new(&CartConfig::from_env()?);
///
/// system.cart_client.add(NewCartItem::new(ItemType::Tour, "T1")).await?;
/// system.cart_client.sign_in(UserId::from("U1")).await?;
///
/// system.shutdown().await?;
/// ```
pub struct CartSystem {
    /// Client for the cart session actor
    pub cart_client: CartClient,

    /// Client for the in-memory remote cart, when this system runs it
    pub remote_client: Option<RemoteCartClient>,

    /// Actor tasks, awaited in order on shutdown
    handles: Vec<JoinHandle<()>>,

    /// Identity forwarding tasks, aborted on shutdown
    forwarders: Vec<JoinHandle<()>>,
}

impl CartSystem {
    /// Starts a session backed by an in-memory remote cart actor.
    ///
    /// The anonymous cart lives in files under `config.local_dir` when set,
    /// otherwise in memory.
    pub fn new(config: &CartConfig) -> Self {
        let local: Arc<dyn LocalStore> = match &config.local_dir {
            Some(dir) => {
                info!(dir = %dir.display(), "Using file-backed local store");
                Arc::new(FileLocalStore::new(dir.clone()))
            }
            None => Arc::new(MemoryLocalStore::new()),
        };

        let (remote_actor, remote) = crate::remote_actor::new(config.remote_buffer);
        let remote_handle = tokio::spawn(remote_actor.run());
        let remote_client = RemoteCartClient::new(remote);

        let mut system = Self::with_stores(config, local, Arc::new(remote_client.clone()));
        // The session holds a remote client, so the remote actor stops after it.
        system.handles.push(remote_handle);
        system.remote_client = Some(remote_client);
        system
    }

    /// Starts a session over caller-provided stores.
    pub fn with_stores(
        config: &CartConfig,
        local: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteCartStore>,
    ) -> Self {
        let (cart_actor, cart_client) =
            crate::cart_actor::new(config.mailbox_size, &config.storage_key, local, remote);
        let cart_handle = tokio::spawn(cart_actor.run());

        Self {
            cart_client,
            remote_client: None,
            handles: vec![cart_handle],
            forwarders: Vec::new(),
        }
    }

    /// Drives the session from an identity source.
    ///
    /// Every transition is applied in arrival order: a user id triggers a sign-in
    /// merge, `None` a sign-out, and a switch between users both in that order.
    /// Repeating the current state is skipped. Failures are logged; the next
    /// transition is still applied.
    pub fn follow_identity(&mut self, mut transitions: mpsc::UnboundedReceiver<IdentityTransition>) {
        let client = self.cart_client.clone();
        let handle = tokio::spawn(async move {
            let mut applied: Option<UserId> = None;
            while let Some(next) = transitions.recv().await {
                if next == applied {
                    debug!(user_id = ?next, "Identity unchanged");
                    continue;
                }
                apply_transition(&client, applied.as_ref(), next.as_ref()).await;
                applied = next;
            }
            debug!("Identity source closed");
        });
        self.forwarders.push(handle);
    }

    /// Gracefully shuts down the session.
    ///
    /// Stops identity forwarding, drops the clients so the actors see their
    /// channels close, then waits for every actor task.
    ///
    /// # Returns
    ///
    /// - `Ok(())` if all actors shut down cleanly
    /// - `Err(String)` if any actor task failed or panicked
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down cart system...");

        for forwarder in self.forwarders {
            forwarder.abort();
            if let Err(e) = forwarder.await {
                if !e.is_cancelled() {
                    warn!("Identity forwarder failed: {:?}", e);
                }
            }
        }

        drop(self.cart_client);
        drop(self.remote_client);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("Cart system shutdown complete.");
        Ok(())
    }
}

async fn apply_transition(client: &CartClient, from: Option<&UserId>, to: Option<&UserId>) {
    if let Some(previous) = from {
        if let Err(e) = client.sign_out().await {
            warn!(user_id = %previous, error = %e, "Sign-out after identity change failed");
        }
    }
    if let Some(user_id) = to {
        match client.sign_in(user_id.clone()).await {
            Ok(report) => {
                debug!(%user_id, merged = report.merged, inserted = report.inserted, "Identity sign-in applied");
            }
            Err(e) => warn!(%user_id, error = %e, "Sign-in after identity change failed"),
        }
    }
}
