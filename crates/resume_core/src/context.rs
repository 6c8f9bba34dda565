//! Per-request cancellation and deadline context.
//!
//! # Responsibility
//! - Carry a cancel flag and an optional deadline through every I/O-bound
//!   step of a request.
//!
//! # Invariants
//! - Cancellation is sticky: once observed, every later `check` fails.
//! - A context never retries or extends its own deadline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Reason a request stopped before completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Cancelled {
    #[error("request cancelled")]
    Cancelled,
    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

/// Cloneable handle used by the caller to cancel an in-flight request.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Context threaded through one request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancelHandle,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancel: CancelHandle::default(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Returns a handle that cancels this context and all its clones.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fails when the context was cancelled or its deadline has passed.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.cancel.is_cancelled() {
            return Err(Cancelled::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Cancelled::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cancelled, RequestContext};
    use std::time::{Duration, Instant};

    #[test]
    fn background_context_is_always_active() {
        assert_eq!(RequestContext::background().check(), Ok(()));
    }

    #[test]
    fn cancel_handle_cancels_every_clone() {
        let ctx = RequestContext::background();
        let clone = ctx.clone();
        ctx.cancel_handle().cancel();
        assert_eq!(clone.check(), Err(Cancelled::Cancelled));
    }

    #[test]
    fn elapsed_deadline_is_reported() {
        let ctx = RequestContext::background().with_deadline(Instant::now());
        assert_eq!(ctx.check(), Err(Cancelled::DeadlineExceeded));

        let ctx = RequestContext::with_timeout(Duration::from_secs(3600));
        assert_eq!(ctx.check(), Ok(()));
    }
}
