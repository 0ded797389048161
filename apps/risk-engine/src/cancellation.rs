//! Cooperative cancellation for batch computations.
//!
//! Nothing in the engine blocks on I/O, so cancellation is checked at
//! batch boundaries (grid batches for payoff curves, draw batches for
//! Monte Carlo). A cancelled computation returns [`EngineError::Cancelled`]
//! and discards any partial results.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::{EngineError, EngineResult};

/// Cancellation token with an optional deadline.
///
/// Clones share the same token, so a handle kept by the caller can cancel a
/// computation running on another thread. A host that already owns a
/// shutdown token can pass a child of it through [`from_token`](Self::from_token).
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// Create a signal that never fires unless [`cancel`](Self::cancel) is called.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing token.
    #[must_use]
    pub const fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Create a signal that fires once `timeout` has elapsed.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// The underlying token.
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether cancellation was requested or the deadline passed.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Return `Err(Cancelled)` if the signal has fired.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Cancelled`] when cancelled.
    pub fn check(&self) -> EngineResult<()> {
        if self.is_cancelled() {
            Err(EngineError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Check an optional cancellation signal.
pub(crate) fn check(cancel: Option<&Cancellation>) -> EngineResult<()> {
    cancel.map_or(Ok(()), Cancellation::check)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_signal_is_not_cancelled() {
        let c = Cancellation::new();
        assert!(!c.is_cancelled());
        assert!(c.check().is_ok());
    }

    #[test]
    fn test_cancel_is_visible_through_clones() {
        let c = Cancellation::new();
        let handle = c.clone();
        handle.cancel();
        assert!(c.is_cancelled());
        assert_eq!(c.check(), Err(EngineError::Cancelled));
    }

    #[test]
    fn test_zero_timeout_fires_immediately() {
        let c = Cancellation::with_timeout(Duration::ZERO);
        assert!(c.is_cancelled());
    }

    #[test]
    fn test_parent_token_cancels_child() {
        let shutdown = CancellationToken::new();
        let c = Cancellation::from_token(shutdown.child_token());
        assert!(!c.is_cancelled());
        shutdown.cancel();
        assert!(c.is_cancelled());
        assert!(c.token().is_cancelled());
    }

    #[test]
    fn test_optional_check() {
        assert!(check(None).is_ok());
        let c = Cancellation::new();
        c.cancel();
        assert!(check(Some(&c)).is_err());
    }
}
