//! Cart semantics over the two stores.
//!
//! [`Reconciler`] is stateless apart from its store handles: every call receives the
//! current session user (or `None`) and reads what it needs. The session actor is the
//! only caller, which is what keeps calls from interleaving.

use super::CartError;
use crate::model::{
    CartItem, CartKey, CartRow, CartRowCreate, CartRowUpdate, NewCartItem, UserId,
};
use crate::stores::{AnonymousCart, RemoteCartStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Outcome of `add`, `remove` or `set_quantity`.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    /// Authoritative cart after the call, ordered by `added_at`.
    pub items: Vec<CartItem>,
    /// Whether a store was written. No-ops leave this `false`.
    pub changed: bool,
}

impl Mutation {
    fn changed(items: Vec<CartItem>) -> Self {
        Self {
            items: sorted(items),
            changed: true,
        }
    }

    fn unchanged(items: Vec<CartItem>) -> Self {
        Self {
            items: sorted(items),
            changed: false,
        }
    }
}

/// Summary of a sign-in merge.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeReport {
    pub user_id: UserId,
    /// Local items folded into an existing remote row.
    pub merged: usize,
    /// Local items inserted as new remote rows.
    pub inserted: usize,
    /// Keys that failed and were kept in the anonymous cart.
    pub failed: Vec<CartKey>,
    /// Remote cart after the merge, when rows were read.
    pub items: Option<Vec<CartItem>>,
}

impl MergeReport {
    fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            merged: 0,
            inserted: 0,
            failed: Vec::new(),
            items: None,
        }
    }
}

enum MergeStep {
    Merged,
    Inserted,
}

/// Orders by `added_at`; the sort is stable so ties keep insertion order.
fn sorted(mut items: Vec<CartItem>) -> Vec<CartItem> {
    items.sort_by_key(|item| item.added_at);
    items
}

fn rows_to_items(rows: Vec<CartRow>) -> Vec<CartItem> {
    rows.into_iter().map(CartRow::into_item).collect()
}

fn add_quantity(current: u32, added: u32, key: &CartKey) -> Result<u32, CartError> {
    current
        .checked_add(added)
        .ok_or_else(|| CartError::Validation(format!("quantity overflow for {key}")))
}

pub struct Reconciler {
    anonymous: AnonymousCart,
    remote: Arc<dyn RemoteCartStore>,
}

impl Reconciler {
    pub fn new(anonymous: AnonymousCart, remote: Arc<dyn RemoteCartStore>) -> Self {
        Self { anonymous, remote }
    }

    pub async fn list(&self, user_id: Option<&UserId>) -> Result<Vec<CartItem>, CartError> {
        let items = match user_id {
            None => self.anonymous.load().await?,
            Some(user_id) => rows_to_items(self.remote.list(user_id).await?),
        };
        Ok(sorted(items))
    }

    /// Adds `item`, folding it into an existing entry with the same key. The existing
    /// entry keeps its metadata and `added_at`.
    pub async fn add(
        &self,
        user_id: Option<&UserId>,
        item: NewCartItem,
        now: DateTime<Utc>,
    ) -> Result<Mutation, CartError> {
        item.validate().map_err(CartError::Validation)?;
        match user_id {
            None => self.add_local(item, now).await,
            Some(user_id) => self.add_remote(user_id, item, now).await,
        }
    }

    async fn add_local(&self, item: NewCartItem, now: DateTime<Utc>) -> Result<Mutation, CartError> {
        let mut items = self.anonymous.load().await?;
        let key = item.key();
        match items.iter_mut().find(|existing| existing.matches(&key)) {
            Some(existing) => {
                existing.quantity = add_quantity(existing.quantity, item.quantity, &key)?;
            }
            None => items.push(item.into_item(now)),
        }
        self.anonymous.save(&items).await?;
        Ok(Mutation::changed(items))
    }

    async fn add_remote(
        &self,
        user_id: &UserId,
        item: NewCartItem,
        now: DateTime<Utc>,
    ) -> Result<Mutation, CartError> {
        let mut rows = self.remote.list(user_id).await?;
        let key = item.key();
        match rows.iter_mut().find(|row| row.matches(&key)) {
            Some(row) => {
                let quantity = add_quantity(row.quantity, item.quantity, &key)?;
                self.remote
                    .update(row.id, CartRowUpdate::quantity(quantity))
                    .await?;
                row.quantity = quantity;
            }
            None => {
                let create = CartRowCreate::from_item(user_id.clone(), item.into_item(now));
                rows.push(self.remote.insert(create).await?);
            }
        }
        Ok(Mutation::changed(rows_to_items(rows)))
    }

    /// Removes the entry for `key`. An absent key writes nothing.
    pub async fn remove(
        &self,
        user_id: Option<&UserId>,
        key: &CartKey,
    ) -> Result<Mutation, CartError> {
        match user_id {
            None => {
                let mut items = self.anonymous.load().await?;
                let before = items.len();
                items.retain(|item| !item.matches(key));
                if items.len() == before {
                    debug!(%key, "Remove of absent local item");
                    return Ok(Mutation::unchanged(items));
                }
                self.anonymous.save(&items).await?;
                Ok(Mutation::changed(items))
            }
            Some(user_id) => {
                let mut rows = self.remote.list(user_id).await?;
                let Some(position) = rows.iter().position(|row| row.matches(key)) else {
                    debug!(%key, %user_id, "Remove of absent remote row");
                    return Ok(Mutation::unchanged(rows_to_items(rows)));
                };
                self.remote.delete(rows[position].id).await?;
                rows.remove(position);
                Ok(Mutation::changed(rows_to_items(rows)))
            }
        }
    }

    /// Overwrites the quantity of `key`. Zero or less removes the entry; an absent key
    /// or an unchanged quantity writes nothing.
    pub async fn set_quantity(
        &self,
        user_id: Option<&UserId>,
        key: &CartKey,
        quantity: i64,
    ) -> Result<Mutation, CartError> {
        if quantity <= 0 {
            return self.remove(user_id, key).await;
        }
        let quantity = u32::try_from(quantity)
            .map_err(|_| CartError::Validation(format!("quantity {quantity} is too large for {key}")))?;

        match user_id {
            None => {
                let mut items = self.anonymous.load().await?;
                match items.iter_mut().find(|item| item.matches(key)) {
                    Some(item) if item.quantity != quantity => item.quantity = quantity,
                    _ => return Ok(Mutation::unchanged(items)),
                }
                self.anonymous.save(&items).await?;
                Ok(Mutation::changed(items))
            }
            Some(user_id) => {
                let mut rows = self.remote.list(user_id).await?;
                let Some(row) = rows
                    .iter_mut()
                    .find(|row| row.matches(key) && row.quantity != quantity)
                else {
                    return Ok(Mutation::unchanged(rows_to_items(rows)));
                };
                self.remote
                    .update(row.id, CartRowUpdate::quantity(quantity))
                    .await?;
                row.quantity = quantity;
                Ok(Mutation::changed(rows_to_items(rows)))
            }
        }
    }

    /// Folds the anonymous cart into `user_id`'s remote cart.
    ///
    /// Matching rows get the local quantity added and keep their own metadata; other
    /// items are inserted with their local metadata and `added_at`. Each item succeeds
    /// or fails on its own, and failed items stay in the anonymous cart so a later
    /// sign-in retries only those. An empty anonymous cart makes no remote call and no
    /// local write.
    ///
    /// An item leaves the anonymous cart before its remote write and is put back if
    /// that write fails. A local write failure stops the merge with the unprocessed
    /// items still stored locally, so no quantity is ever merged twice.
    pub async fn merge(&self, user_id: &UserId) -> Result<MergeReport, CartError> {
        let local = self.anonymous.load().await?;
        let mut report = MergeReport::new(user_id.clone());
        if local.is_empty() {
            debug!(%user_id, "Nothing to merge");
            return Ok(report);
        }

        let mut rows = match self.remote.list(user_id).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(%user_id, error = %e, pending = local.len(), "Merge could not read remote cart");
                report.failed = local.iter().map(CartItem::key).collect();
                return Ok(report);
            }
        };

        let mut retained: Vec<CartItem> = Vec::new();
        for (index, item) in local.iter().enumerate() {
            let key = item.key();
            let unprocessed = &local[index + 1..];
            self.write_pending(user_id, &key, &retained, unprocessed, &report)
                .await?;

            match self.merge_item(user_id, &mut rows, item).await {
                Ok(MergeStep::Merged) => report.merged += 1,
                Ok(MergeStep::Inserted) => report.inserted += 1,
                Err(e) => {
                    warn!(%user_id, %key, error = %e, "Merge of item failed");
                    report.failed.push(key.clone());
                    retained.push(item.clone());
                    self.write_pending(user_id, &key, &retained, unprocessed, &report)
                        .await?;
                }
            }
        }

        info!(
            %user_id,
            merged = report.merged,
            inserted = report.inserted,
            failed = report.failed.len(),
            "Anonymous cart merged"
        );
        report.items = Some(sorted(rows_to_items(rows)));
        Ok(report)
    }

    /// Stores the items still owed to the remote cart: earlier failures followed by
    /// the unprocessed tail.
    async fn write_pending(
        &self,
        user_id: &UserId,
        key: &CartKey,
        retained: &[CartItem],
        unprocessed: &[CartItem],
        report: &MergeReport,
    ) -> Result<(), CartError> {
        let pending: Vec<CartItem> = retained.iter().chain(unprocessed).cloned().collect();
        self.anonymous.save(&pending).await.map_err(|e| {
            error!(
                %user_id,
                %key,
                error = %e,
                merged = report.merged,
                inserted = report.inserted,
                "Merge stopped, anonymous cart could not be updated"
            );
            CartError::from(e)
        })
    }

    async fn merge_item(
        &self,
        user_id: &UserId,
        rows: &mut Vec<CartRow>,
        item: &CartItem,
    ) -> Result<MergeStep, CartError> {
        let key = item.key();
        if let Some(row) = rows.iter_mut().find(|row| row.matches(&key)) {
            let quantity = add_quantity(row.quantity, item.quantity, &key)?;
            self.remote
                .update(row.id, CartRowUpdate::quantity(quantity))
                .await?;
            row.quantity = quantity;
            return Ok(MergeStep::Merged);
        }

        let create = CartRowCreate::from_item(user_id.clone(), item.clone());
        rows.push(self.remote.insert(create).await?);
        Ok(MergeStep::Inserted)
    }

}
