//! Effect registration and fan-out.
//!
//! Effects are zero-argument callbacks. They run once when watched and again,
//! in registration order, every time a tracked write is notified.

mod config;
mod registry;

pub use config::{FailurePolicy, RegistryConfig};
pub(crate) use registry::Dispatch;
pub use registry::EffectRegistry;
