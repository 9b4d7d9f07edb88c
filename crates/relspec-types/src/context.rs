//! The execution context threaded through every evaluation call.
//!
//! It carries the ambient clock read by `now`, and the cancellation signals the
//! driver polls between map/list entries and before function invocations.

use crate::error::{EvalError, EvalResult};
use chrono::{DateTime, Utc};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant, for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A cancellation flag that can be tripped from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Ambient state for one evaluation.
#[derive(Clone)]
pub struct Context {
    clock: Rc<dyn Clock>,
    cancel: Option<CancelHandle>,
    deadline: Option<Instant>,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            clock: Rc::new(SystemClock),
            cancel: None,
            deadline: None,
        }
    }
}

impl Context {
    /// A context using the system clock, with no cancellation.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Rc::new(clock);
        self
    }

    pub fn with_cancel(mut self, handle: CancelHandle) -> Self {
        self.cancel = Some(handle);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// The current time according to the installed clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Fail if the context has been canceled or its deadline has passed.
    pub fn check(&self) -> EvalResult<()> {
        if self.cancel.as_ref().is_some_and(CancelHandle::is_canceled) {
            tracing::debug!("evaluation canceled");
            return Err(EvalError::Canceled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            tracing::debug!("evaluation deadline exceeded");
            return Err(EvalError::DeadlineExceeded);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("now", &self.now())
            .field("cancel", &self.cancel)
            .field("deadline", &self.deadline)
            .finish()
    }
}
