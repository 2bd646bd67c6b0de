//! [`CommentNotifier`] — the per-post subscriber registry.

use std::{
  collections::HashMap,
  fmt,
  sync::{
    Arc, PoisonError, RwLock, Weak,
    atomic::{AtomicBool, AtomicU64, Ordering},
  },
};

use parley_core::comment::Comment;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::{DeliveryReport, Error, Result, SkipReason, SkippedDelivery};

/// Capacity of each subscriber's delivery buffer.
pub const DELIVERY_BUFFER: usize = 1;

type Registry = HashMap<String, Vec<Arc<Subscriber>>>;

// ─── Notifier ────────────────────────────────────────────────────────────────

/// Fans newly created comments out to live subscribers of their post.
///
/// The registry has its own lock, independent of any store. Publishing only
/// holds it long enough to copy the subscriber list; sends happen afterwards
/// and never wait.
///
/// Clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct CommentNotifier {
  inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
  registry: RwLock<Registry>,
  next_id:  AtomicU64,
}

/// Identifies one subscription in logs and delivery reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "subscriber#{}", self.0)
  }
}

/// A registry entry. The registry holds the only long-lived reference, so
/// removing the entry drops the sender and ends the subscriber's stream.
#[derive(Debug)]
struct Subscriber {
  id:     SubscriberId,
  tx:     mpsc::Sender<Arc<Comment>>,
  closed: Arc<AtomicBool>,
}

impl Subscriber {
  fn try_deliver(&self, comment: &Arc<Comment>) -> Result<(), SkipReason> {
    if self.closed.load(Ordering::Acquire) {
      return Err(SkipReason::Closed);
    }
    self.tx.try_send(Arc::clone(comment)).map_err(|e| match e {
      TrySendError::Full(_) => SkipReason::Full,
      TrySendError::Closed(_) => SkipReason::Closed,
    })
  }
}

impl CommentNotifier {
  pub fn new() -> Self { Self::default() }

  /// Register a new subscriber for comments on `post_id`.
  pub fn subscribe(&self, post_id: &str) -> Result<Subscription> {
    if post_id.is_empty() {
      return Err(Error::EmptyPostId);
    }

    let id = SubscriberId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
    let (tx, rx) = mpsc::channel(DELIVERY_BUFFER);
    let closed = Arc::new(AtomicBool::new(false));

    self
      .inner
      .write_registry()
      .entry(post_id.to_owned())
      .or_default()
      .push(Arc::new(Subscriber { id, tx, closed: Arc::clone(&closed) }));
    debug!(post_id, subscriber = %id, "subscribed to comments");

    Ok(Subscription {
      rx,
      unsubscribe: Unsubscribe {
        registry: Arc::downgrade(&self.inner),
        post_id: post_id.to_owned(),
        id,
        closed,
      },
    })
  }

  /// Offer `comment` to every current subscriber of `post_id`.
  ///
  /// Fails only on invalid input. Skipped deliveries are listed in the
  /// returned report; see [`DeliveryReport::into_result`] to treat them as an
  /// error.
  pub fn publish(&self, post_id: &str, comment: &Comment) -> Result<DeliveryReport> {
    if post_id.is_empty() {
      return Err(Error::EmptyPostId);
    }
    if comment.post_id != post_id {
      return Err(Error::PostIdMismatch {
        expected: post_id.to_owned(),
        actual:   comment.post_id.clone(),
      });
    }

    let snapshot: Vec<Arc<Subscriber>> = self
      .inner
      .read_registry()
      .get(post_id)
      .cloned()
      .unwrap_or_default();

    let payload = Arc::new(comment.clone());
    let mut report = DeliveryReport::default();
    for subscriber in &snapshot {
      match subscriber.try_deliver(&payload) {
        Ok(()) => report.delivered += 1,
        Err(reason) => {
          warn!(post_id, subscriber = %subscriber.id, %reason, "comment delivery skipped");
          report.skipped.push(SkippedDelivery { subscriber: subscriber.id, reason });
        }
      }
    }
    Ok(report)
  }

  /// Number of live subscribers for `post_id`.
  pub fn subscriber_count(&self, post_id: &str) -> usize {
    self.inner.read_registry().get(post_id).map_or(0, Vec::len)
  }
}

impl Inner {
  // Every write is a single push or retain; a poisoned map is still whole.
  fn read_registry(&self) -> std::sync::RwLockReadGuard<'_, Registry> {
    self.registry.read().unwrap_or_else(PoisonError::into_inner)
  }

  fn write_registry(&self) -> std::sync::RwLockWriteGuard<'_, Registry> {
    self.registry.write().unwrap_or_else(PoisonError::into_inner)
  }
}

// ─── Subscription ────────────────────────────────────────────────────────────

/// The receiving end of a subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
  rx:          mpsc::Receiver<Arc<Comment>>,
  unsubscribe: Unsubscribe,
}

impl Subscription {
  pub fn id(&self) -> SubscriberId { self.unsubscribe.id }

  pub fn post_id(&self) -> &str { &self.unsubscribe.post_id }

  /// Wait for the next comment. Returns `None` once unsubscribed and drained.
  pub async fn recv(&mut self) -> Option<Arc<Comment>> { self.rx.recv().await }

  /// Take a delivered comment if one is waiting.
  pub fn try_recv(&mut self) -> Option<Arc<Comment>> { self.rx.try_recv().ok() }

  /// A detached handle that can cancel this subscription from elsewhere.
  pub fn unsubscriber(&self) -> Unsubscribe { self.unsubscribe.clone() }

  pub fn unsubscribe(&self) -> bool { self.unsubscribe.unsubscribe() }
}

impl Drop for Subscription {
  fn drop(&mut self) { self.unsubscribe.unsubscribe(); }
}

/// Cancels one subscription. Safe to call any number of times, from any
/// clone; only the first call has an effect.
#[derive(Debug, Clone)]
pub struct Unsubscribe {
  registry: Weak<Inner>,
  post_id:  String,
  id:       SubscriberId,
  closed:   Arc<AtomicBool>,
}

impl Unsubscribe {
  /// Remove the subscriber and close its stream. Returns `true` if this call
  /// did the removal.
  pub fn unsubscribe(&self) -> bool {
    if self.closed.swap(true, Ordering::AcqRel) {
      return false;
    }
    let Some(inner) = self.registry.upgrade() else {
      return true;
    };

    let mut registry = inner.write_registry();
    if let Some(bucket) = registry.get_mut(&self.post_id) {
      bucket.retain(|s| s.id != self.id);
      if bucket.is_empty() {
        registry.remove(&self.post_id);
      }
    }
    debug!(post_id = %self.post_id, subscriber = %self.id, "unsubscribed from comments");
    true
  }

  pub fn is_unsubscribed(&self) -> bool { self.closed.load(Ordering::Acquire) }
}
