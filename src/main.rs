//! Walks one guest through the cart: browse signed out, sign in, sign out.

use cart_reconciler::config::CartConfig;
use cart_reconciler::identity::IdentityProvider;
use cart_reconciler::lifecycle::{setup_tracing, CartSystem};
use cart_reconciler::model::{ItemType, Metadata, NewCartItem};
use serde_json::json;
use tracing::{info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = CartConfig::from_env().map_err(|e| e.to_string())?;
    info!(storage_key = %config.storage_key, "Starting cart system");

    let mut system = CartSystem::new(&config);
    let identity = IdentityProvider::new();
    system.follow_identity(identity.subscribe());
    let cart = system.cart_client.clone();

    let span = tracing::info_span!("guest_browsing");
    async {
        let mut metadata = Metadata::new();
        metadata.insert("date".into(), json!("2025-06-01"));
        metadata.insert("guests".into(), json!(2));
        cart.add(
            NewCartItem::new(ItemType::Tour, "T1")
                .with_quantity(2)
                .with_metadata(metadata),
        )
        .await?;
        cart.add(NewCartItem::new(ItemType::Vehicle, "V3")).await?;
        cart.add(NewCartItem::new(ItemType::Tour, "T1")).await?;
        info!(items = cart.item_count().await?, "Guest cart ready");
        Ok::<_, cart_reconciler::cart_actor::CartError>(())
    }
    .instrument(span)
    .await
    .map_err(|e| e.to_string())?;

    let mut session = cart.watch_session();
    identity.sign_in("U1");
    session
        .wait_for(|state| state.user_id().is_some() && !state.is_merging())
        .await
        .map_err(|e| e.to_string())?;

    let items = cart.list().await.map_err(|e| e.to_string())?;
    for item in &items {
        info!(item_type = %item.item_type, reference_id = %item.reference_id, quantity = item.quantity, "Remote cart item");
    }

    identity.sign_out();
    session
        .wait_for(|state| state.user_id().is_none())
        .await
        .map_err(|e| e.to_string())?;
    info!(items = cart.item_count().await.map_err(|e| e.to_string())?, "Signed out");

    drop(session);
    drop(cart);
    system.shutdown().await?;
    Ok(())
}
