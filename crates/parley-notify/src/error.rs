//! Error and delivery-report types for `parley-notify`.

use std::fmt;

use thiserror::Error;

use crate::SubscriberId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("post id must not be empty")]
  EmptyPostId,

  /// The caller tried to publish a comment to a post it does not belong to.
  #[error("comment belongs to post {actual}, not {expected}")]
  PostIdMismatch { expected: String, actual: String },

  /// Some subscribers were skipped. Never fatal: every other subscriber was
  /// still attempted.
  #[error("{0}")]
  Delivery(DeliveryReport),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Delivery report ─────────────────────────────────────────────────────────

/// Why a subscriber did not receive an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
  /// The subscriber has not consumed its previous event yet.
  Full,
  /// The subscriber unsubscribed while the event was in flight.
  Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedDelivery {
  pub subscriber: SubscriberId,
  pub reason:     SkipReason,
}

/// The outcome of one [`publish`](crate::CommentNotifier::publish) call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
  pub delivered: usize,
  pub skipped:   Vec<SkippedDelivery>,
}

impl DeliveryReport {
  pub fn attempted(&self) -> usize { self.delivered + self.skipped.len() }

  /// `true` if every subscriber in the snapshot received the event.
  pub fn is_complete(&self) -> bool { self.skipped.is_empty() }

  /// Convert into the number of deliveries, or [`Error::Delivery`] if any
  /// subscriber was skipped.
  pub fn into_result(self) -> Result<usize> {
    if self.is_complete() {
      Ok(self.delivered)
    } else {
      Err(Error::Delivery(self))
    }
  }
}

impl fmt::Display for DeliveryReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "delivered to {} of {} subscribers",
      self.delivered,
      self.attempted()
    )?;
    for skipped in &self.skipped {
      write!(f, "; {} skipped ({})", skipped.subscriber, skipped.reason)?;
    }
    Ok(())
  }
}
