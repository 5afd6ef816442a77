use std::any::Any;
use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard, RwLock};

use super::config::{FailurePolicy, RegistryConfig};
use crate::error::{EffectFailure, Error, Result};

type EffectFn = Arc<dyn Fn() + Send + Sync>;

/// Re-entrancy bookkeeping kept under the dispatch lock.
#[derive(Debug, Clone, Copy, Default)]
struct Nesting {
    // notification rounds and interceptor calls currently on the stack
    depth: usize,
    // rounds started since the outermost write began
    rounds: usize,
}

struct RegistryInner {
    effects: RwLock<Vec<EffectFn>>,
    // Held for the whole of a write and its notification round. Reentrant so
    // effects can read and write state on the same thread.
    dispatch: ReentrantMutex<Cell<Nesting>>,
    config: RegistryConfig,
}

/// Ordered collection of effects, notified on every tracked write.
///
/// Cloning an `EffectRegistry` yields another handle to the same effects.
///
/// # Examples
///
/// ```
/// use tinproxy::EffectRegistry;
/// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
///
/// let registry = EffectRegistry::new();
/// let runs = Arc::new(AtomicUsize::new(0));
///
/// registry.watch({
///     let runs = runs.clone();
///     move || {
///         runs.fetch_add(1, Ordering::SeqCst);
///     }
/// }).unwrap();
///
/// // Watching runs the effect once
/// assert_eq!(runs.load(Ordering::SeqCst), 1);
///
/// registry.notify_all().unwrap();
/// assert_eq!(runs.load(Ordering::SeqCst), 2);
/// ```
#[derive(Clone)]
pub struct EffectRegistry {
    inner: Arc<RegistryInner>,
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                effects: RwLock::new(Vec::new()),
                dispatch: ReentrantMutex::new(Cell::new(Nesting::default())),
                config,
            }),
        }
    }

    pub fn config(&self) -> RegistryConfig {
        self.inner.config
    }

    /// Number of registered effects.
    pub fn len(&self) -> usize {
        self.inner.effects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of notification rounds and interceptor calls currently running
    /// on this registry.
    pub fn depth(&self) -> usize {
        self.inner.dispatch.lock().get().depth
    }

    /// Register an effect and run it once.
    ///
    /// The effect stays registered even if the initial run panics; the panic
    /// is reported as [`Error::EffectFailed`]. Registering the same closure
    /// twice gives two independent effects.
    pub fn watch<F>(&self, update: F) -> Result<()>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let _dispatch = self.inner.dispatch.lock();
        let effect: EffectFn = Arc::new(update);
        let index = {
            let mut effects = self.inner.effects.write();
            effects.push(Arc::clone(&effect));
            effects.len() - 1
        };
        tracing::debug!(index, "effect registered");

        run_effect(index, &effect).map_err(|failure| Error::EffectFailed {
            failures: vec![failure],
        })
    }

    /// Run every registered effect once, in registration order.
    pub fn notify_all(&self) -> Result<()> {
        self.dispatch()?.notify()
    }

    /// Take the dispatch lock for a write, refusing if nesting is too deep or
    /// the outermost write has used up its round budget.
    pub(crate) fn dispatch(&self) -> Result<Dispatch<'_>> {
        let guard = self.inner.dispatch.lock();
        let Nesting { depth, rounds } = guard.get();
        if depth == 0 {
            // outermost write: start a fresh round budget
            guard.set(Nesting::default());
            return Ok(Dispatch {
                guard,
                inner: &self.inner,
            });
        }
        if depth >= self.inner.config.max_depth {
            tracing::warn!(depth, "re-entrant write rejected");
            return Err(Error::RecursionLimit { depth });
        }
        if rounds >= self.inner.config.max_rounds {
            tracing::warn!(rounds, "re-entrant write over the round budget rejected");
            return Err(Error::RoundBudget { rounds });
        }
        Ok(Dispatch {
            guard,
            inner: &self.inner,
        })
    }
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EffectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectRegistry")
            .field("effects", &self.len())
            .field("config", &self.inner.config)
            .finish()
    }
}

/// Exclusive right to perform one write and its notification round.
pub(crate) struct Dispatch<'a> {
    guard: ReentrantMutexGuard<'a, Cell<Nesting>>,
    inner: &'a RegistryInner,
}

impl Dispatch<'_> {
    /// Run `f` one nesting level deeper, so writes it issues count against
    /// `max_depth`. Used for interceptor calls.
    pub(crate) fn nested<R>(&self, f: impl FnOnce() -> R) -> R {
        let _level = Level::enter(&self.guard);
        f()
    }

    /// Run the notification round and release the dispatch lock.
    pub(crate) fn notify(self) -> Result<()> {
        // Snapshot so effects may watch new effects without deadlocking.
        let effects: Vec<EffectFn> = self.inner.effects.read().clone();
        let mut nesting = self.guard.get();
        nesting.rounds += 1;
        self.guard.set(nesting);

        let level = Level::enter(&self.guard);
        tracing::debug!(
            effects = effects.len(),
            depth = level.depth(),
            rounds = nesting.rounds,
            "notifying effects"
        );

        let mut failures = Vec::new();
        for (index, effect) in effects.iter().enumerate() {
            if let Err(failure) = run_effect(index, effect) {
                failures.push(failure);
                if self.inner.config.failure_policy == FailurePolicy::Abort {
                    break;
                }
            }
        }

        drop(level);

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::EffectFailed { failures })
        }
    }
}

/// One level of nesting, released on drop even if the nested call unwinds.
struct Level<'a> {
    cell: &'a Cell<Nesting>,
}

impl<'a> Level<'a> {
    fn enter(cell: &'a Cell<Nesting>) -> Self {
        let mut nesting = cell.get();
        nesting.depth += 1;
        cell.set(nesting);
        Self { cell }
    }

    fn depth(&self) -> usize {
        self.cell.get().depth
    }
}

impl Drop for Level<'_> {
    fn drop(&mut self) {
        let mut nesting = self.cell.get();
        nesting.depth -= 1;
        self.cell.set(nesting);
    }
}

fn run_effect(index: usize, effect: &EffectFn) -> std::result::Result<(), EffectFailure> {
    catch_unwind(AssertUnwindSafe(|| effect())).map_err(|payload| {
        let message = panic_message(payload.as_ref());
        tracing::error!(index, %message, "effect panicked");
        EffectFailure { index, message }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
