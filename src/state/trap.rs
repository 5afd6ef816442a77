use crate::error::{Error, Result};
use crate::value::{Value, ValueKind};

/// A mutation about to be applied to tracked state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mutation<'a> {
    Set { key: &'a str, value: &'a Value },
    Remove { key: &'a str },
}

impl<'a> Mutation<'a> {
    pub fn key(&self) -> &'a str {
        match self {
            Self::Set { key, .. } | Self::Remove { key } => *key,
        }
    }
}

/// A hook that sees every mutation before it is applied.
///
/// Returning an error rejects the mutation: nothing is written and no effect
/// runs. Interceptors run in the order they were installed and the first
/// rejection wins.
///
/// An interceptor may itself write to tracked state. Each interceptor call
/// counts as one nesting level against
/// [`RegistryConfig::max_depth`](crate::RegistryConfig::max_depth), so a
/// trap that keeps writing to its own state is refused with
/// [`Error::RecursionLimit`] instead of recursing without bound.
pub trait Interceptor: Send + Sync {
    fn intercept(&self, mutation: &Mutation<'_>) -> Result<()>;
}

impl<F> Interceptor for F
where
    F: Fn(&Mutation<'_>) -> Result<()> + Send + Sync,
{
    fn intercept(&self, mutation: &Mutation<'_>) -> Result<()> {
        self(mutation)
    }
}

/// Logs every mutation at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogWrites;

impl Interceptor for LogWrites {
    fn intercept(&self, mutation: &Mutation<'_>) -> Result<()> {
        match mutation {
            Mutation::Set { key, value } => {
                tracing::info!("Setting value \"{value}\" for property \"{key}\".");
            }
            Mutation::Remove { key } => {
                tracing::info!("Removing property \"{key}\".");
            }
        }
        Ok(())
    }
}

/// Only accepts values of one kind. Removals are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindConstraint {
    kind: ValueKind,
}

impl KindConstraint {
    pub fn new(kind: ValueKind) -> Self {
        Self { kind }
    }

    pub fn numbers_only() -> Self {
        Self::new(ValueKind::Number)
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }
}

impl Interceptor for KindConstraint {
    fn intercept(&self, mutation: &Mutation<'_>) -> Result<()> {
        let Mutation::Set { key, value } = mutation else {
            return Ok(());
        };
        if value.kind() == self.kind {
            return Ok(());
        }
        tracing::warn!(
            key,
            expected = %self.kind,
            found = %value.kind(),
            "rejected write of the wrong kind"
        );
        Err(Error::InvalidValue {
            key: (*key).to_string(),
            expected: self.kind,
            found: value.kind(),
        })
    }
}

/// Rejects every mutation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOnly;

impl Interceptor for ReadOnly {
    fn intercept(&self, mutation: &Mutation<'_>) -> Result<()> {
        Err(Error::ReadOnly {
            key: mutation.key().to_string(),
        })
    }
}
