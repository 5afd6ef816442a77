//! Tagged values stored in tracked state.

mod value;

pub use value::{Value, ValueKind};
