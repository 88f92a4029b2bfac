//! # Cart Reconciler
//!
//! One authoritative shopping cart per browsing session for a booking marketplace
//! (properties, tours, tour packages, vehicles), whether or not the guest is
//! signed in.
//!
//! - Signed out, the cart is an **anonymous cart**: a JSON blob under one
//!   namespaced key in a device-local store.
//! - Signed in, the cart is the user's **remote cart**: rows in a backend table
//!   scoped by user id.
//! - On sign-in the anonymous cart is **merged** into the remote cart, one item at a
//!   time. Items that fail stay behind and are retried on the next sign-in.
//!
//! ## Architecture
//!
//! ### Concurrency Model
//! Each session is a [`CartActor`](cart_actor::CartActor) running in its own Tokio
//! task. It handles requests one at a time, so two writes to the same key never
//! interleave and an `add` issued during a merge waits until the merge is done.
//!
//! ### Error Handling
//! Every operation returns a [`CartError`](cart_actor::CartError): `Validation`
//! before any store is touched, `StoreUnavailable` with the store's own message,
//! `PartialMergeFailure` listing the keys that stayed local. Failures are logged
//! with `tracing` as well.
//!
//! ## Module Tour
//!
//! - [`framework`]: generic `ResourceActor<T>` plus the `MockClient` test helper.
//! - [`remote_actor`]: the in-memory remote cart, a `ResourceActor<CartRow>`.
//! - [`stores`]: the `LocalStore` and `RemoteCartStore` seams and the anonymous cart blob.
//! - [`cart_actor`]: session state, the reconciler and change events.
//! - [`clients`]: [`CartClient`](clients::CartClient) for the UI layer.
//! - [`lifecycle`]: [`CartSystem`](lifecycle::CartSystem) wiring and tracing setup.
//!
//! ### Running the Demo
//!
//! ```bash
//! RUST_LOG=info cargo run
//! ```

pub mod cart_actor;
pub mod clients;
pub mod config;
pub mod framework;
pub mod identity;
pub mod lifecycle;
pub mod model;
pub mod remote_actor;
pub mod stores;
