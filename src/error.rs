//! Error type shared by the automaton engine and predicate algebras.
//!
//! The engine has a single recoverable failure mode: an operation ran out of budget.
//! Running out of wall-clock time, being cancelled from the outside, and exceeding the
//! state ceiling of a subset construction are all reported as [`Error::Timeout`], with the
//! [`Cause`] telling them apart.

use std::time::Duration;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced by automaton operations and predicate algebras.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    /// The operation exceeded its budget and was aborted.
    #[error("{operation} aborted: {cause}")]
    Timeout {
        /// Name of the operation that observed the exhausted budget.
        operation: &'static str,
        /// Which part of the budget ran out.
        cause: Cause,
    },
}

/// The reason behind an [`Error::Timeout`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Cause {
    /// The wall-clock budget elapsed.
    #[error("time budget of {limit:?} exhausted")]
    Deadline { limit: Duration },

    /// The computation was cancelled through a [`CancelToken`](crate::budget::CancelToken).
    #[error("cancelled")]
    Cancelled,

    /// A subset construction discovered more states than allowed.
    #[error("out of memory: {states} states exceed the limit of {limit}")]
    OutOfMemory { states: usize, limit: usize },
}

impl Error {
    pub fn timeout(operation: &'static str, cause: Cause) -> Self {
        Error::Timeout { operation, cause }
    }

    /// Returns the name of the operation that failed.
    pub fn operation(&self) -> &'static str {
        match self {
            Error::Timeout { operation, .. } => operation,
        }
    }

    /// Returns the cause of the failure.
    pub fn cause(&self) -> &Cause {
        match self {
            Error::Timeout { cause, .. } => cause,
        }
    }

    /// Returns `true` if the failure came from the state ceiling rather than the clock.
    pub fn is_out_of_memory(&self) -> bool {
        matches!(self.cause(), Cause::OutOfMemory { .. })
    }
}
