//! Configuration for [`MemoryStore`](crate::MemoryStore) expiry.

use std::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// Expiry settings for an in-memory store.
///
/// ```
/// use std::time::Duration;
/// use parley_store_memory::StoreConfig;
///
/// let config = StoreConfig::default()
///   .with_ttl(Duration::from_secs(3600))
///   .with_prune_interval(Duration::from_secs(30));
/// assert_eq!(config.ttl_secs, 3600);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
  /// Maximum age of any entity, in seconds. Zero or negative disables
  /// expiry entirely.
  pub ttl_secs:            i64,
  /// Minimum spacing between two lazy prune passes, in seconds.
  pub prune_interval_secs: u64,
  /// Run a background sweeper task in addition to lazy pruning.
  pub sweep:               bool,
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self { ttl_secs: 24 * 60 * 60, prune_interval_secs: 60, sweep: false }
  }
}

impl StoreConfig {
  pub fn new() -> Self { Self::default() }

  /// A configuration under which nothing ever expires.
  pub fn without_ttl() -> Self { Self { ttl_secs: 0, ..Self::default() } }

  /// Set the TTL, rounded up to whole seconds. A zero duration disables
  /// expiry; any non-zero duration keeps it enabled.
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    let secs = ttl.as_secs().saturating_add(u64::from(ttl.subsec_nanos() > 0));
    self.ttl_secs = i64::try_from(secs).unwrap_or(i64::MAX);
    self
  }

  pub fn with_prune_interval(mut self, interval: Duration) -> Self {
    self.prune_interval_secs = interval.as_secs();
    self
  }

  pub fn with_sweeper(mut self, sweep: bool) -> Self {
    self.sweep = sweep;
    self
  }

  /// The effective TTL, or `None` when expiry is disabled.
  pub fn ttl(&self) -> Option<TimeDelta> {
    (self.ttl_secs > 0).then(|| TimeDelta::seconds(self.ttl_secs))
  }

  pub fn prune_interval(&self) -> Duration {
    Duration::from_secs(self.prune_interval_secs)
  }
}
