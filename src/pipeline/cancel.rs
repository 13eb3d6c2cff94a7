//! Cooperative cancellation.
//!
//! A run stops only where it polls its [`CancellationToken`]:
//! - the scanner before each type
//! - the merger before each partition
//! - the dispatcher before each symbol and each `Once` call
//!
//! A validator call that is already running is never interrupted. Once every phase has seen
//! the token, [`crate::Pipeline::run`] returns a report with
//! [`crate::RunOutcome::Cancelled`] instead of an error.
//!
//! # Thread Safety
//!
//! The flag is one shared [`AtomicBool`]. Any clone can cancel from any thread, including from
//! inside a validator, and every other clone observes it.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// A cancellation flag shared by every phase of a run.
///
/// Cloning shares the flag. Cancelling never raises; each phase polls the token at its own
/// granularity (per type while scanning, per partition while merging, per symbol while
/// dispatching) and stops as soon as it sees it.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// A token that has not been cancelled
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns `true` once [`CancellationToken::cancel`] was called on any clone
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
