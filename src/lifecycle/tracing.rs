//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter filtered by
//! `RUST_LOG`. Module paths are hidden (`with_target(false)`); log lines carry
//! structured fields such as `entity_type`, `user_id` and `key` instead.
//!
//! ## Levels
//!
//! - `info`: committed cart changes, sign-in/sign-out, actor start and shutdown
//! - `debug`: request payloads and no-op decisions
//! - `warn`/`error`: store failures and partial merges
//!
//! ```bash
//! RUST_LOG=info cargo run
//! RUST_LOG=debug cargo run
//! RUST_LOG=cart_reconciler::cart_actor=debug cargo run
//! ```
//!
//! A guest who adds a tour and then signs in produces, at `info`:
//!
//! ```text
//! INFO Cart changed change=Added(CartKey { .. }) size=1
//! INFO Sign-in, merging anonymous cart user_id=U1
//! INFO Created entity_type="CartRow" id=row_1 size=1
//! INFO Anonymous cart merged user_id=U1 merged=0 inserted=1 failed=0
//! ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
