//! Tracked state: a key/value mapping whose writes are intercepted and
//! fanned out to an [`EffectRegistry`](crate::EffectRegistry).

mod trap;
mod tracked;

pub use trap::{Interceptor, KindConstraint, LogWrites, Mutation, ReadOnly};
pub use tracked::{TrackedState, TrackedStateBuilder};
