//! Runtime orchestration: starting, wiring and stopping the actors, plus
//! logging setup.
//!
//! - [`CartSystem`] - owns a cart session and the stores behind it
//! - [`setup_tracing`] - initializes the tracing subscriber

pub mod cart_system;
pub mod tracing;

pub use cart_system::*;
pub use self::tracing::*;
