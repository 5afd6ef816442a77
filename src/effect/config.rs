/// What a notification round does when an effect panics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log the failure, keep running the remaining effects, report every
    /// failure once the round is over.
    #[default]
    Isolate,
    /// Stop the round at the first failing effect and report it.
    Abort,
}

/// Settings for an [`EffectRegistry`](crate::EffectRegistry).
///
/// # Examples
///
/// ```
/// use tinproxy::{EffectRegistry, FailurePolicy, RegistryConfig};
///
/// let registry = EffectRegistry::with_config(
///     RegistryConfig::new()
///         .max_depth(4)
///         .failure_policy(FailurePolicy::Abort),
/// );
/// assert_eq!(registry.config().max_depth, 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Maximum number of nested notification rounds and interceptor calls. A
    /// write issued from an effect or an interceptor while this many levels
    /// are in progress is rejected.
    ///
    /// This bounds how deep writes may nest, not how much work one write
    /// causes: with `k` effects that each write, a single top-level write can
    /// fan out to roughly `k^max_depth` effect runs. `max_rounds` caps that.
    pub max_depth: usize,
    /// Maximum number of notification rounds one top-level write may start,
    /// counting every nested round. Re-entrant writes past the budget are
    /// rejected; the top-level round itself is always allowed.
    pub max_rounds: usize,
    pub failure_policy: FailurePolicy,
}

impl RegistryConfig {
    pub const DEFAULT_MAX_DEPTH: usize = 16;
    pub const DEFAULT_MAX_ROUNDS: usize = 1024;

    pub fn new() -> Self {
        Self::default()
    }

    /// Set the nesting bound. Values below 1 are raised to 1 so a top-level
    /// write is always allowed.
    #[must_use]
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Set the per-write round budget. Values below 1 are raised to 1.
    #[must_use]
    pub fn max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    #[must_use]
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_rounds: Self::DEFAULT_MAX_ROUNDS,
            failure_policy: FailurePolicy::Isolate,
        }
    }
}
