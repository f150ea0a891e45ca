//! Cooperative cancellation for strip programs.
//!
//! Cancellation is never preemptive: the runner raises a token and the
//! running program is expected to poll it between discrete steps (pixel
//! writes, renders, frame delays) and return promptly once it reads true.
//!
//! Tokens form a hierarchy. The runner holds the scheduling token for a
//! run and hands each program invocation a [`CancelToken::child`] of it,
//! so one `cancel` on the outer token reaches the program transitively
//! while the program's token can be retired without disturbing the run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Granularity of [`CancelToken::sleep`] polling.
const SLEEP_SLICE: Duration = Duration::from_millis(10);

/// A clonable, hierarchical cancellation token.
///
/// Clones share state with the original. A child token reads as cancelled
/// whenever any of its ancestors is cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    parent: Option<Arc<Inner>>,
}

impl CancelToken {
    /// Creates a fresh, un-cancelled root token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives a child token.
    ///
    /// The child observes cancellation of this token (and its ancestors);
    /// cancelling the child leaves this token untouched.
    pub fn child(&self) -> Self {
        CancelToken {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                parent: Some(Arc::clone(&self.inner)),
            }),
        }
    }

    /// Requests cancellation on this token and, transitively, its children.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns true once this token or any ancestor has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        let mut node: &Inner = &self.inner;
        loop {
            if node.cancelled.load(Ordering::SeqCst) {
                return true;
            }
            match &node.parent {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    /// Sleeps for `duration`, waking early if cancellation is requested.
    ///
    /// Polls in 10 ms slices so even programs with long frame delays honor
    /// a stop request within roughly one slice. Returns `true` when the
    /// full duration elapsed and `false` when cut short.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_cancelled() {
                return false;
            }
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return true;
            };
            thread::sleep(remaining.min(SLEEP_SLICE));
        }
    }
}
