//! Cooperative cancellation.
//!
//! A [`CancelToken`] is cheap to clone; all clones observe the same flag.
//! Loops that may run for a long time call [`CancelToken::check`] once per
//! iteration and bail out with [`Canceled`] as soon as the flag is raised.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Marker returned by [`CancelToken::check`] once cancellation was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canceled;

impl fmt::Display for Canceled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "operation canceled")
    }
}

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that has not been canceled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag. Every clone of this token observes it.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether [`cancel`](Self::cancel) has been called on any clone.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Poll the flag.
    ///
    /// # Errors
    ///
    /// Returns [`Canceled`] if cancellation was requested.
    pub fn check(&self) -> Result<(), Canceled> {
        if self.is_canceled() {
            Err(Canceled)
        } else {
            Ok(())
        }
    }
}
