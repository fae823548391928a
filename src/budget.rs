//! Time and resource budgets for long-running operations.
//!
//! Every worklist loop in the engine polls a [`Deadline`] once per iteration. A deadline
//! is derived from a [`Budget`], which bundles the three limits an operation can run into:
//!
//! - a wall-clock `timeout`,
//! - a `max_states` ceiling on the number of states a subset construction may discover,
//! - a [`CancelToken`] that another thread can trip at any time.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use sfa_rs::budget::{Budget, CancelToken};
//!
//! let token = CancelToken::new();
//! let budget = Budget::with_timeout(Duration::from_secs(5))
//!     .max_states(10_000)
//!     .cancel_token(token.clone());
//!
//! let deadline = budget.start();
//! assert!(deadline.check("example").is_ok());
//!
//! token.cancel();
//! assert!(deadline.check("example").is_err());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Cause, Error, Result};

/// A shared flag used to cancel a running computation from the outside.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Operations observe it at their next poll.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Limits applied to a single engine operation.
///
/// `Budget::default()` imposes no limit at all.
#[derive(Debug, Clone, Default)]
pub struct Budget {
    /// Wall-clock limit for the whole operation.
    pub timeout: Option<Duration>,
    /// Maximal number of states a subset construction may discover.
    pub max_states: Option<usize>,
    /// Cooperative cancellation flag.
    pub cancel: Option<CancelToken>,
}

impl Budget {
    /// A budget without any limit.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// A budget limited only by wall-clock time.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Self::default()
        }
    }

    /// Sets the state ceiling for subset constructions.
    pub fn max_states(mut self, limit: usize) -> Self {
        self.max_states = Some(limit);
        self
    }

    /// Attaches a cancellation token.
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Starts the clock.
    pub fn start(&self) -> Deadline {
        Deadline {
            started: Instant::now(),
            timeout: self.timeout,
            max_states: self.max_states,
            cancel: self.cancel.clone(),
        }
    }
}

/// A running budget, created by [`Budget::start`].
#[derive(Debug, Clone)]
pub struct Deadline {
    started: Instant,
    timeout: Option<Duration>,
    max_states: Option<usize>,
    cancel: Option<CancelToken>,
}

impl Deadline {
    /// A deadline that never expires.
    pub fn unbounded() -> Self {
        Budget::unlimited().start()
    }

    /// Time spent since the deadline was started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Fails if the operation was cancelled or ran out of time.
    pub fn check(&self, operation: &'static str) -> Result<()> {
        if let Some(token) = &self.cancel {
            if token.is_cancelled() {
                return Err(Error::timeout(operation, Cause::Cancelled));
            }
        }
        if let Some(limit) = self.timeout {
            if self.started.elapsed() >= limit {
                return Err(Error::timeout(operation, Cause::Deadline { limit }));
            }
        }
        Ok(())
    }

    /// Like [`check`](Self::check), and additionally fails if `states` exceeds the
    /// state ceiling.
    pub fn check_states(&self, operation: &'static str, states: usize) -> Result<()> {
        if let Some(limit) = self.max_states {
            if states > limit {
                return Err(Error::timeout(
                    operation,
                    Cause::OutOfMemory { states, limit },
                ));
            }
        }
        self.check(operation)
    }
}
