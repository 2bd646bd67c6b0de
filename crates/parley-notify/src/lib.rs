//! Live comment notifications.
//!
//! [`CommentNotifier`] is a per-post publish/subscribe hub. It knows nothing
//! about storage: whoever creates a comment publishes it afterwards, and every
//! live subscriber of that post gets a copy if it has room for one.
//!
//! Delivery is at-most-once and never blocks the publisher. A subscriber
//! whose single-slot buffer is still full misses the event; nothing is queued
//! or retried.

mod notifier;

pub mod error;

pub use error::{DeliveryReport, Error, Result, SkipReason, SkippedDelivery};
pub use notifier::{
  CommentNotifier, DELIVERY_BUFFER, SubscriberId, Subscription, Unsubscribe,
};
