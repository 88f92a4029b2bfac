//! Store doubles shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use cart_reconciler::clients::{ActorClient, RemoteCartClient};
use cart_reconciler::config::CartConfig;
use cart_reconciler::lifecycle::CartSystem;
use cart_reconciler::model::{CartRow, CartRowCreate, CartRowId, CartRowUpdate, UserId};
use cart_reconciler::stores::{LocalStore, MemoryLocalStore, RemoteCartStore, StoreError};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Spawns an in-memory remote cart actor.
pub fn remote_cart() -> RemoteCartClient {
    let (actor, client) = cart_reconciler::remote_actor::new(32);
    tokio::spawn(actor.run());
    RemoteCartClient::new(client)
}

/// A session over the given stores with default settings.
pub fn system(local: Arc<dyn LocalStore>, remote: Arc<dyn RemoteCartStore>) -> CartSystem {
    CartSystem::with_stores(&CartConfig::default(), local, remote)
}

/// Remote store that fails chosen calls and can hold inserts until released.
pub struct FlakyRemote {
    inner: RemoteCartClient,
    failing_refs: Mutex<HashSet<String>>,
    fail_list: AtomicBool,
    gate_armed: AtomicBool,
    pub entered: Notify,
    pub release: Notify,
}

impl FlakyRemote {
    pub fn new(inner: RemoteCartClient) -> Self {
        Self {
            inner,
            failing_refs: Mutex::new(HashSet::new()),
            fail_list: AtomicBool::new(false),
            gate_armed: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Inserts, updates and deletes touching `reference_id` fail.
    pub fn fail_reference(&self, reference_id: &str) {
        self.failing_refs
            .lock()
            .unwrap()
            .insert(reference_id.to_string());
    }

    pub fn heal(&self) {
        self.failing_refs.lock().unwrap().clear();
        self.fail_list.store(false, Ordering::SeqCst);
    }

    pub fn fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    /// The next insert signals `entered` and waits for `release`.
    pub fn arm_gate(&self) {
        self.gate_armed.store(true, Ordering::SeqCst);
    }

    fn refuses(&self, reference_id: &str) -> bool {
        self.failing_refs.lock().unwrap().contains(reference_id)
    }
}

#[async_trait]
impl RemoteCartStore for FlakyRemote {
    async fn list(&self, user_id: &UserId) -> Result<Vec<CartRow>, StoreError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(StoreError::Remote("list unavailable".into()));
        }
        self.inner.list(user_id).await
    }

    async fn insert(&self, row: CartRowCreate) -> Result<CartRow, StoreError> {
        if self.gate_armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        if self.refuses(&row.reference_id) {
            return Err(StoreError::Remote(format!("insert of {} refused", row.reference_id)));
        }
        self.inner.insert(row).await
    }

    async fn update(&self, id: CartRowId, fields: CartRowUpdate) -> Result<(), StoreError> {
        let row = self.inner.get(id).await?;
        if row.is_some_and(|row| self.refuses(&row.reference_id)) {
            return Err(StoreError::Remote(format!("update of {id} refused")));
        }
        self.inner.update(id, fields).await
    }

    async fn delete(&self, id: CartRowId) -> Result<(), StoreError> {
        let row = self.inner.get(id).await?;
        if row.is_some_and(|row| self.refuses(&row.reference_id)) {
            return Err(StoreError::Remote(format!("delete of {id} refused")));
        }
        self.inner.delete(id).await
    }
}

/// Local store whose writes can be switched off.
#[derive(Default)]
pub struct FailingLocal {
    pub inner: MemoryLocalStore,
    fail_writes: AtomicBool,
}

impl FailingLocal {
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Local("quota exceeded".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl LocalStore for FailingLocal {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.check()?;
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check()?;
        self.inner.remove(key).await
    }
}
