//! Error types for tracked state and effect dispatch.

use thiserror::Error;

use crate::value::ValueKind;

pub type Result<T> = std::result::Result<T, Error>;

/// A single effect that panicked during a notification round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectFailure {
    /// Registration index of the effect (0 is the first one watched).
    pub index: usize,
    pub message: String,
}

impl std::fmt::Display for EffectFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "effect #{} panicked: {}", self.index, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("could not set \"{key}\": expected a {expected} value, got a {found} value")]
    InvalidValue {
        key: String,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("\"{key}\" is read only")]
    ReadOnly { key: String },

    #[error("\"{key}\" does not hold a number")]
    NotANumber { key: String },

    #[error("re-entrant write rejected at notification depth {depth}")]
    RecursionLimit { depth: usize },

    #[error("re-entrant write rejected after {rounds} notification rounds")]
    RoundBudget { rounds: usize },

    #[error("{} effect(s) failed: {}", .failures.len(), join_failures(.failures))]
    EffectFailed { failures: Vec<EffectFailure> },
}

impl Error {
    /// Failures recorded for an [`Error::EffectFailed`], empty otherwise.
    #[must_use]
    pub fn failures(&self) -> &[EffectFailure] {
        match self {
            Self::EffectFailed { failures } => failures,
            _ => &[],
        }
    }

    /// Whether the write this error came from was applied to the state.
    ///
    /// Only effect failures happen after the write; every other variant is
    /// raised before anything is stored.
    #[must_use]
    pub fn write_applied(&self) -> bool {
        matches!(self, Self::EffectFailed { .. })
    }
}

fn join_failures(failures: &[EffectFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_message() {
        let err = Error::InvalidValue {
            key: "b".to_string(),
            expected: ValueKind::Number,
            found: ValueKind::Text,
        };
        assert_eq!(
            err.to_string(),
            "could not set \"b\": expected a number value, got a text value"
        );
        assert!(!err.write_applied());
    }

    #[test]
    fn effect_failed_lists_every_failure() {
        let err = Error::EffectFailed {
            failures: vec![
                EffectFailure {
                    index: 0,
                    message: "boom".to_string(),
                },
                EffectFailure {
                    index: 2,
                    message: "bang".to_string(),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "2 effect(s) failed: effect #0 panicked: boom; effect #2 panicked: bang"
        );
        assert_eq!(err.failures().len(), 2);
        assert!(err.write_applied());
    }
}
