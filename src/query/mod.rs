pub mod assemble;
pub mod dissociate;
pub mod error;
pub mod resolver;
pub mod stats;
pub mod strategy;
pub mod types;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::query::error::QueryError;

/// Caller-supplied cancellation handle, checked inside resolver scans.
///
/// Carries an explicit cancel flag and an optional deadline. A request that
/// observes either fails whole with [`QueryError::Cancelled`] — never a
/// partial difference.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// A token that never cancels.
    pub fn none() -> Self {
        Self::default()
    }

    /// A token that cancels once `timeout` has elapsed.
    pub fn with_deadline(timeout: Duration) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Request cancellation. Visible to every clone of this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.cancelled.load(Ordering::Relaxed) {
            return true;
        }
        match self.deadline {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }

    /// Fail with [`QueryError::Cancelled`] if cancellation was requested or
    /// the deadline passed.
    pub fn check(&self) -> Result<(), QueryError> {
        if self.is_cancelled() {
            Err(QueryError::Cancelled)
        } else {
            Ok(())
        }
    }
}
