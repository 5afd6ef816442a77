use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::trap::{Interceptor, KindConstraint, Mutation};
use crate::effect::{Dispatch, EffectRegistry};
use crate::error::{Error, Result};
use crate::value::Value;

/// A key/value mapping that notifies an [`EffectRegistry`] on every write.
///
/// Reads behave like a plain map. Every mutation first passes through the
/// installed [`Interceptor`]s, is then stored, and finally runs every effect
/// in the registry before the call returns. There is no dependency tracking:
/// any write re-runs all effects, even when the value did not change.
///
/// Cloning yields another handle to the same state. Several states may share
/// one registry, in which case a write to any of them notifies every effect.
///
/// # Examples
///
/// ```
/// use tinproxy::{EffectRegistry, TrackedState};
/// use std::sync::{Arc, Mutex};
///
/// let registry = EffectRegistry::new();
/// let state = TrackedState::new([("count", 0)], registry.clone());
/// let inner_html = Arc::new(Mutex::new(String::new()));
///
/// registry.watch({
///     let state = state.clone();
///     let inner_html = inner_html.clone();
///     move || {
///         let count = state.get_number("count").unwrap_or_default();
///         *inner_html.lock().unwrap() = format!("Counter is {count}");
///     }
/// }).unwrap();
/// assert_eq!(*inner_html.lock().unwrap(), "Counter is 0");
///
/// state.update_number("count", |n| n + 1.0).unwrap();
/// assert_eq!(*inner_html.lock().unwrap(), "Counter is 1");
/// ```
#[derive(Clone)]
pub struct TrackedState {
    values: Arc<RwLock<BTreeMap<String, Value>>>,
    traps: Arc<[Box<dyn Interceptor>]>,
    registry: EffectRegistry,
}

impl TrackedState {
    /// Wrap `initial` with no interceptors.
    pub fn new<K, V, I>(initial: I, registry: EffectRegistry) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::builder(registry).entries(initial).build()
    }

    /// Wrap `initial`, rejecting any later write that is not a number.
    pub fn numeric<K, I>(initial: I, registry: EffectRegistry) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, f64)>,
    {
        Self::builder(registry)
            .entries(initial)
            .intercept(KindConstraint::numbers_only())
            .build()
    }

    pub fn builder(registry: EffectRegistry) -> TrackedStateBuilder {
        TrackedStateBuilder {
            values: BTreeMap::new(),
            traps: Vec::new(),
            registry,
        }
    }

    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    pub fn get_number(&self, key: &str) -> Option<f64> {
        self.values.read().get(key).and_then(Value::as_number)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.values.read().keys().cloned().collect()
    }

    /// Copy of the whole mapping.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.values.read().clone()
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    /// Write `value` under `key`, then run every registered effect.
    ///
    /// A rejected write leaves the state untouched and runs no effect. If an
    /// effect fails the value stays written and the failure is returned.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let dispatch = self.registry.dispatch()?;
        self.commit(dispatch, key.into(), value.into())
    }

    /// Compute the next value from the current one and write it like
    /// [`set`](Self::set).
    pub fn update<F>(&self, key: &str, f: F) -> Result<()>
    where
        F: FnOnce(Option<&Value>) -> Value,
    {
        let dispatch = self.registry.dispatch()?;
        let current = self.get(key);
        let next = f(current.as_ref());
        self.commit(dispatch, key.to_string(), next)
    }

    /// Like [`update`](Self::update) for a key that must hold a number.
    pub fn update_number<F>(&self, key: &str, f: F) -> Result<()>
    where
        F: FnOnce(f64) -> f64,
    {
        let dispatch = self.registry.dispatch()?;
        let current = self.get_number(key).ok_or_else(|| Error::NotANumber {
            key: key.to_string(),
        })?;
        self.commit(dispatch, key.to_string(), Value::Number(f(current)))
    }

    /// Delete `key` and run every registered effect.
    ///
    /// Removing a key that is not present does nothing and returns `None`.
    pub fn remove(&self, key: &str) -> Result<Option<Value>> {
        let dispatch = self.registry.dispatch()?;
        if !self.contains_key(key) {
            return Ok(None);
        }
        dispatch.nested(|| self.intercept(&Mutation::Remove { key }))?;

        tracing::debug!(key, "tracked removal");
        let removed = self.values.write().remove(key);
        dispatch.notify()?;
        Ok(removed)
    }

    fn commit(&self, dispatch: Dispatch<'_>, key: String, value: Value) -> Result<()> {
        dispatch.nested(|| {
            self.intercept(&Mutation::Set {
                key: &key,
                value: &value,
            })
        })?;

        tracing::debug!(key = %key, value = %value, "tracked write");
        self.values.write().insert(key, value);
        dispatch.notify()
    }

    fn intercept(&self, mutation: &Mutation<'_>) -> Result<()> {
        self.traps
            .iter()
            .try_for_each(|trap| trap.intercept(mutation))
    }
}

impl std::fmt::Debug for TrackedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedState")
            .field("values", &*self.values.read())
            .field("traps", &self.traps.len())
            .finish()
    }
}

/// Builder for a [`TrackedState`] with interceptors.
///
/// Initial entries are stored as given; interceptors only see later writes.
pub struct TrackedStateBuilder {
    values: BTreeMap<String, Value>,
    traps: Vec<Box<dyn Interceptor>>,
    registry: EffectRegistry,
}

impl TrackedStateBuilder {
    #[must_use]
    pub fn entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn entries<K, V, I>(mut self, entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.values
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Install an interceptor after the ones already added.
    #[must_use]
    pub fn intercept(mut self, trap: impl Interceptor + 'static) -> Self {
        self.traps.push(Box::new(trap));
        self
    }

    pub fn build(self) -> TrackedState {
        TrackedState {
            values: Arc::new(RwLock::new(self.values)),
            traps: self.traps.into(),
            registry: self.registry,
        }
    }
}
