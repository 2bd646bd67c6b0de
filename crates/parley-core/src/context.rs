//! The calling context: caller-supplied cancellation and deadline.
//!
//! Repositories check the context once, on entry, before validating input or
//! taking any lock. An operation that is already running is never
//! interrupted.

use std::{
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
  time::{Duration, Instant},
};

use crate::{Error, Result};

/// Cancellation and deadline state for one logical request.
///
/// Cloning is cheap and clones share the cancellation flag, so a clone handed
/// to a spawned task observes [`Context::cancel`] on the original.
#[derive(Debug, Clone, Default)]
pub struct Context {
  cancelled: Arc<AtomicBool>,
  deadline:  Option<Instant>,
}

impl Context {
  /// A context that is never cancelled and has no deadline.
  pub fn background() -> Self { Self::default() }

  /// A context that expires at `deadline`.
  pub fn with_deadline(deadline: Instant) -> Self {
    Self { cancelled: Arc::default(), deadline: Some(deadline) }
  }

  /// A context that expires `timeout` from now.
  pub fn with_timeout(timeout: Duration) -> Self {
    Self::with_deadline(Instant::now() + timeout)
  }

  /// Mark this context (and every clone of it) as cancelled.
  pub fn cancel(&self) { self.cancelled.store(true, Ordering::Release); }

  pub fn is_cancelled(&self) -> bool {
    self.cancelled.load(Ordering::Acquire)
  }

  pub fn deadline(&self) -> Option<Instant> { self.deadline }

  /// Return an error if the caller has given up on this request.
  ///
  /// Cancellation takes precedence over an elapsed deadline.
  pub fn check(&self) -> Result<()> {
    if self.is_cancelled() {
      return Err(Error::Cancelled);
    }
    match self.deadline {
      Some(deadline) if Instant::now() >= deadline => Err(Error::DeadlineExceeded),
      _ => Ok(()),
    }
  }
}
