//! # Tinproxy
//!
//! Coarse-grained reactive state for Rust, built on write interception.
//!
//! Tinproxy models the simplest useful reactive system: a state object whose
//! writes are intercepted and used to re-run every registered effect.
//!
//! ## Tracked state
//!
//! - `TrackedState` - A key/value mapping that reads like a plain map
//! - Interceptors (`LogWrites`, `KindConstraint`, `ReadOnly`) that see every
//!   write first and may reject it
//! - Tagged `Value`s, validated at the write boundary
//!
//! ## Effects
//!
//! - `EffectRegistry` - Ordered effects, each run once when watched and then
//!   once per write, in registration order
//! - No dependency tracking: any write invalidates everything
//! - Panicking effects are isolated (or abort the round) per `RegistryConfig`

pub mod effect;
pub mod error;
pub mod state;
pub mod value;

// Re-export main types for convenience
pub use effect::{EffectRegistry, FailurePolicy, RegistryConfig};
pub use error::{EffectFailure, Error, Result};
pub use state::{
    Interceptor, KindConstraint, LogWrites, Mutation, ReadOnly, TrackedState, TrackedStateBuilder,
};
pub use value::{Value, ValueKind};
