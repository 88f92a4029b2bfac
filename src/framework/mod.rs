//! Generic actor framework for row collections.
//!
//! # Main Components
//!
//! - [`ActorEntity`] - Trait that row types implement to be managed by actors
//! - [`ResourceActor`] - Generic actor that owns a collection of rows
//! - [`ResourceClient`] - Type-safe, cloneable handle for sending requests
//! - [`FrameworkError`] - Common error types
//!
//! # Testing
//!
//! See [`mock`] module for utilities to test clients without spawning full actors.

pub mod core;
pub mod mock;

// Re-export core types for convenience
pub use self::core::*;
