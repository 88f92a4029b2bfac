mod common;

use cart_reconciler::cart_actor::{CartChange, CartError, SessionState};
use cart_reconciler::identity::IdentityProvider;
use cart_reconciler::model::{CartKey, CartRowCreate, ItemType, Metadata, NewCartItem, UserId};
use cart_reconciler::stores::{AnonymousCart, LocalStore, MemoryLocalStore, RemoteCartStore};
use chrono::Utc;
use common::{remote_cart, system, FailingLocal, FlakyRemote};
use serde_json::json;
use std::sync::Arc;

fn metadata(key: &str, value: serde_json::Value) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert(key.to_string(), value);
    metadata
}

#[tokio::test]
async fn test_repeated_guest_adds_collapse_into_one_entry() {
    let system = system(Arc::new(MemoryLocalStore::new()), Arc::new(remote_cart()));
    let cart = &system.cart_client;

    for _ in 0..3 {
        cart.add(NewCartItem::new(ItemType::Tour, "T1").with_quantity(2))
            .await
            .expect("add failed");
    }

    let items = cart.list().await.expect("list failed");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 6);
}

#[tokio::test]
async fn test_removing_absent_item_mutates_nothing_and_emits_nothing() {
    let local = Arc::new(MemoryLocalStore::new());
    let system = system(local.clone(), Arc::new(remote_cart()));
    let cart = &system.cart_client;
    cart.add(NewCartItem::new(ItemType::Tour, "T1")).await.unwrap();
    let (_id, mut events) = cart.subscribe().await.unwrap();
    let writes = local.writes();

    let items = cart.remove(ItemType::Property, "P1").await.expect("remove failed");
    assert_eq!(items.len(), 1);
    assert_eq!(local.writes(), writes);

    cart.add(NewCartItem::new(ItemType::Vehicle, "V1")).await.unwrap();
    let event = events.recv().await.unwrap();
    assert_eq!(
        event.change,
        CartChange::Added(CartKey::new(ItemType::Vehicle, "V1"))
    );
}

#[tokio::test]
async fn test_merge_sums_quantity_and_keeps_remote_metadata() {
    let local = Arc::new(MemoryLocalStore::new());
    let remote = remote_cart();
    let user = UserId::from("U1");
    remote
        .insert(CartRowCreate {
            user_id: user.clone(),
            item_type: ItemType::Tour,
            reference_id: "T1".into(),
            quantity: 1,
            metadata: metadata("date", json!("2025-01-01")),
            created_at: Utc::now(),
        })
        .await
        .unwrap();

    let system = system(local.clone(), Arc::new(remote.clone()));
    let cart = &system.cart_client;
    cart.add(
        NewCartItem::new(ItemType::Tour, "T1")
            .with_quantity(2)
            .with_metadata(metadata("date", json!("2025-03-03"))),
    )
    .await
    .unwrap();

    let report = cart.sign_in(user.clone()).await.expect("merge failed");
    assert_eq!(report.merged, 1);

    let rows = remote.list(&user).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].quantity, 3);
    assert_eq!(rows[0].metadata, metadata("date", json!("2025-01-01")));
    assert_eq!(local.get("cart:anonymous").await.unwrap(), None);
}

#[tokio::test]
async fn test_merge_inserts_unmatched_item_with_local_metadata() {
    let local = Arc::new(MemoryLocalStore::new());
    let remote = remote_cart();
    let system = system(local.clone(), Arc::new(remote.clone()));
    let cart = &system.cart_client;
    let guests = metadata("guests", json!(4));
    cart.add(NewCartItem::new(ItemType::Property, "P9").with_metadata(guests.clone()))
        .await
        .unwrap();
    let added_at = cart.list().await.unwrap()[0].added_at;

    let report = cart.sign_in(UserId::from("U1")).await.unwrap();
    assert_eq!(report.inserted, 1);

    let rows = remote.list(&UserId::from("U1")).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].item_type, ItemType::Property);
    assert_eq!(rows[0].metadata, guests);
    assert_eq!(rows[0].created_at, added_at);
    assert!(AnonymousCart::new(local, "cart:anonymous")
        .load()
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_set_quantity_zero_drops_item_from_list() {
    let system = system(Arc::new(MemoryLocalStore::new()), Arc::new(remote_cart()));
    let cart = &system.cart_client;
    cart.add(NewCartItem::new(ItemType::Tour, "T1")).await.unwrap();
    cart.add(NewCartItem::new(ItemType::Vehicle, "V1")).await.unwrap();

    cart.set_quantity(ItemType::Tour, "T1", 0).await.unwrap();

    let items = cart.list().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].key(), CartKey::new(ItemType::Vehicle, "V1"));
}

#[tokio::test]
async fn test_concurrent_signed_in_adds_land_in_arrival_order() {
    let remote = remote_cart();
    let system = system(Arc::new(MemoryLocalStore::new()), Arc::new(remote.clone()));
    let cart = &system.cart_client;
    cart.sign_in(UserId::from("U1")).await.unwrap();

    let (first, second) = tokio::join!(
        cart.add(NewCartItem::new(ItemType::Tour, "T1")),
        cart.add(NewCartItem::new(ItemType::TourPackage, "TP2")),
    );
    first.expect("first add failed");
    second.expect("second add failed");

    let refs: Vec<_> = cart
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|item| item.reference_id)
        .collect();
    assert_eq!(refs, vec!["T1", "TP2"]);
    assert_eq!(remote.list(&UserId::from("U1")).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_add_during_merge_waits_and_lands_remotely() {
    let local = Arc::new(MemoryLocalStore::new());
    let remote = Arc::new(FlakyRemote::new(remote_cart()));
    let system = system(local.clone(), remote.clone());
    let cart = system.cart_client.clone();
    cart.add(NewCartItem::new(ItemType::Tour, "T1")).await.unwrap();

    remote.arm_gate();
    let signing_in = tokio::spawn({
        let cart = cart.clone();
        async move { cart.sign_in(UserId::from("U1")).await }
    });
    remote.entered.notified().await;
    assert_eq!(cart.session(), SessionState::Merging(UserId::from("U1")));

    let adding = tokio::spawn({
        let cart = cart.clone();
        async move { cart.add(NewCartItem::new(ItemType::Vehicle, "V1")).await }
    });
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(!adding.is_finished());

    remote.release.notify_one();
    signing_in.await.unwrap().expect("merge failed");
    let items = adding.await.unwrap().expect("add failed");
    assert_eq!(items.len(), 2);

    let rows = remote.list(&UserId::from("U1")).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(local.get("cart:anonymous").await.unwrap(), None);
}

#[tokio::test]
async fn test_sign_in_during_merge_is_queued() {
    let remote = Arc::new(FlakyRemote::new(remote_cart()));
    let system = system(Arc::new(MemoryLocalStore::new()), remote.clone());
    let cart = system.cart_client.clone();
    cart.add(NewCartItem::new(ItemType::Tour, "T1")).await.unwrap();

    remote.arm_gate();
    let first = tokio::spawn({
        let cart = cart.clone();
        async move { cart.sign_in(UserId::from("U1")).await }
    });
    remote.entered.notified().await;
    let second = tokio::spawn({
        let cart = cart.clone();
        async move { cart.sign_in(UserId::from("U2")).await }
    });
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(!second.is_finished());
    remote.release.notify_one();

    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();
    assert_eq!(first.inserted, 1);
    assert_eq!((second.merged, second.inserted), (0, 0));
    assert_eq!(cart.session(), SessionState::Authenticated(UserId::from("U2")));
    assert_eq!(remote.list(&UserId::from("U1")).await.unwrap().len(), 1);
    assert!(remote.list(&UserId::from("U2")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sign_out_starts_an_empty_guest_cart() {
    let remote = remote_cart();
    let system = system(Arc::new(MemoryLocalStore::new()), Arc::new(remote.clone()));
    let cart = &system.cart_client;
    cart.sign_in(UserId::from("U1")).await.unwrap();
    cart.add(NewCartItem::new(ItemType::Tour, "T1")).await.unwrap();
    let (_id, mut events) = cart.subscribe().await.unwrap();

    cart.sign_out().await.unwrap();

    let event = events.recv().await.unwrap();
    assert_eq!(event.change, CartChange::SignedOut);
    assert_eq!(event.session, SessionState::Anonymous);
    assert_eq!(event.items, Some(Vec::new()));
    assert!(cart.list().await.unwrap().is_empty());
    assert_eq!(remote.list(&UserId::from("U1")).await.unwrap().len(), 1);

    // Signing out again is a no-op.
    cart.sign_out().await.unwrap();
}

#[tokio::test]
async fn test_failed_local_write_leaves_cart_unchanged() {
    let local = Arc::new(FailingLocal::default());
    let system = system(local.clone(), Arc::new(remote_cart()));
    let cart = &system.cart_client;
    cart.add(NewCartItem::new(ItemType::Tour, "T1")).await.unwrap();

    local.fail_writes(true);
    let result = cart.add(NewCartItem::new(ItemType::Tour, "T1")).await;
    assert!(matches!(result, Err(CartError::StoreUnavailable(_))));

    local.fail_writes(false);
    assert_eq!(cart.list().await.unwrap()[0].quantity, 1);
}

#[tokio::test]
async fn test_failed_remote_insert_is_reported_verbatim() {
    let remote = Arc::new(FlakyRemote::new(remote_cart()));
    remote.fail_reference("V1");
    let system = system(Arc::new(MemoryLocalStore::new()), remote.clone());
    let cart = &system.cart_client;
    cart.sign_in(UserId::from("U1")).await.unwrap();

    let result = cart.add(NewCartItem::new(ItemType::Vehicle, "V1")).await;
    match result {
        Err(CartError::StoreUnavailable(e)) => {
            assert_eq!(e.to_string(), "Remote store unavailable: insert of V1 refused");
        }
        other => panic!("Expected StoreUnavailable, got {:?}", other),
    }
    assert!(cart.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_validation_rejects_bad_input() {
    let system = system(Arc::new(MemoryLocalStore::new()), Arc::new(remote_cart()));
    let cart = &system.cart_client;

    let result = cart
        .add(NewCartItem::new(ItemType::Tour, "T1").with_quantity(0))
        .await;
    assert!(matches!(result, Err(CartError::Validation(_))));

    let result = cart.add(NewCartItem::new(ItemType::Tour, "  ")).await;
    assert!(matches!(result, Err(CartError::Validation(_))));
}

#[tokio::test]
async fn test_full_system_shuts_down_cleanly() {
    let system = system(Arc::new(MemoryLocalStore::new()), Arc::new(remote_cart()));
    system
        .cart_client
        .add(NewCartItem::new(ItemType::Tour, "T1"))
        .await
        .unwrap();
    system.shutdown().await.expect("shutdown failed");
}

#[tokio::test]
async fn test_failed_remote_delete_and_update_leave_cart_unchanged() {
    let remote = Arc::new(FlakyRemote::new(remote_cart()));
    let system = system(Arc::new(MemoryLocalStore::new()), remote.clone());
    let cart = &system.cart_client;
    cart.sign_in(UserId::from("U1")).await.unwrap();
    cart.add(NewCartItem::new(ItemType::Tour, "T1").with_quantity(2))
        .await
        .unwrap();
    remote.fail_reference("T1");

    let result = cart.remove(ItemType::Tour, "T1").await;
    assert!(matches!(result, Err(CartError::StoreUnavailable(_))));
    let result = cart.set_quantity(ItemType::Tour, "T1", 5).await;
    assert!(matches!(result, Err(CartError::StoreUnavailable(_))));
    let result = cart.set_quantity(ItemType::Tour, "T1", 0).await;
    assert!(matches!(result, Err(CartError::StoreUnavailable(_))));

    let items = cart.list().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 2);
    assert_eq!(remote.list(&UserId::from("U1")).await.unwrap()[0].quantity, 2);
}

#[tokio::test]
async fn test_failed_local_remove_and_update_leave_cart_unchanged() {
    let local = Arc::new(FailingLocal::default());
    let system = system(local.clone(), Arc::new(remote_cart()));
    let cart = &system.cart_client;
    cart.add(NewCartItem::new(ItemType::Vehicle, "V1").with_quantity(3))
        .await
        .unwrap();

    local.fail_writes(true);
    let result = cart.remove(ItemType::Vehicle, "V1").await;
    assert!(matches!(result, Err(CartError::StoreUnavailable(_))));
    let result = cart.set_quantity(ItemType::Vehicle, "V1", 1).await;
    assert!(matches!(result, Err(CartError::StoreUnavailable(_))));

    let items = cart.list().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 3);
}

#[tokio::test]
async fn test_corrupt_guest_cart_is_reported_and_kept() {
    let local = Arc::new(MemoryLocalStore::new());
    let blob = br#"[{"itemType":"tour","referenceId":"T1","quantity":2,"addedAt":"bad"}]"#;
    local.set("cart:anonymous", blob.to_vec()).await.unwrap();
    let system = system(local.clone(), Arc::new(remote_cart()));
    let cart = &system.cart_client;

    assert!(matches!(cart.list().await, Err(CartError::StoreUnavailable(_))));
    let result = cart.add(NewCartItem::new(ItemType::Vehicle, "V1")).await;
    assert!(matches!(result, Err(CartError::StoreUnavailable(_))));
    assert_eq!(
        local.get("cart:anonymous").await.unwrap(),
        Some(blob.to_vec())
    );
}

#[tokio::test]
async fn test_local_write_failure_during_merge_never_merges_twice() {
    let local = Arc::new(FailingLocal::default());
    let remote = remote_cart();
    let user = UserId::from("U1");
    remote
        .insert(CartRowCreate::from_item(
            user.clone(),
            NewCartItem::new(ItemType::Tour, "T1").into_item(Utc::now()),
        ))
        .await
        .unwrap();
    let system = system(local.clone(), Arc::new(remote.clone()));
    let cart = &system.cart_client;
    cart.add(NewCartItem::new(ItemType::Tour, "T1").with_quantity(2))
        .await
        .unwrap();

    local.fail_writes(true);
    let result = cart.sign_in(user.clone()).await;
    assert!(matches!(result, Err(CartError::StoreUnavailable(_))));
    assert_eq!(remote.list(&user).await.unwrap()[0].quantity, 1);

    local.fail_writes(false);
    let report = cart.sign_in(user.clone()).await.expect("retry failed");
    assert_eq!(report.merged, 1);
    assert_eq!(remote.list(&user).await.unwrap()[0].quantity, 3);
    assert_eq!(local.inner.get("cart:anonymous").await.unwrap(), None);
}

#[tokio::test]
async fn test_items_kept_by_partial_merge_survive_sign_out() {
    let remote = Arc::new(FlakyRemote::new(remote_cart()));
    remote.fail_reference("V7");
    let system = system(Arc::new(MemoryLocalStore::new()), remote.clone());
    let cart = &system.cart_client;
    cart.add(NewCartItem::new(ItemType::Tour, "T1")).await.unwrap();
    cart.add(NewCartItem::new(ItemType::Vehicle, "V7")).await.unwrap();

    let result = cart.sign_in(UserId::from("U1")).await;
    assert!(matches!(result, Err(CartError::PartialMergeFailure { .. })));
    let (_id, mut events) = cart.subscribe().await.unwrap();

    cart.sign_out().await.unwrap();
    let event = events.recv().await.unwrap();
    assert_eq!(event.change, CartChange::SignedOut);
    let kept = event.items.expect("items missing from sign-out event");
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].key(), CartKey::new(ItemType::Vehicle, "V7"));
    assert_eq!(cart.list().await.unwrap(), kept);

    remote.heal();
    let report = cart.sign_in(UserId::from("U1")).await.expect("retry failed");
    assert_eq!((report.merged, report.inserted), (0, 1));
    assert_eq!(remote.list(&UserId::from("U1")).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_identity_flapping_during_merge_applies_every_transition() {
    let remote = Arc::new(FlakyRemote::new(remote_cart()));
    let mut system = system(Arc::new(MemoryLocalStore::new()), remote.clone());
    let identity = IdentityProvider::new();
    system.follow_identity(identity.subscribe());
    let cart = system.cart_client.clone();
    cart.add(NewCartItem::new(ItemType::Tour, "T1")).await.unwrap();
    let (_id, mut events) = cart.subscribe().await.unwrap();

    remote.arm_gate();
    identity.sign_in("U1");
    remote.entered.notified().await;
    identity.sign_out();
    identity.sign_in("U1");
    remote.release.notify_one();

    let mut changes = Vec::new();
    for _ in 0..3 {
        changes.push(events.recv().await.unwrap().change);
    }
    assert_eq!(
        changes,
        vec![
            CartChange::SignedIn {
                merged: 0,
                inserted: 1,
                failed: 0
            },
            CartChange::SignedOut,
            CartChange::SignedIn {
                merged: 0,
                inserted: 0,
                failed: 0
            },
        ]
    );
    assert_eq!(cart.session(), SessionState::Authenticated(UserId::from("U1")));
}
