//! [`MemoryStore`] — the shared state behind the in-memory repositories.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, TimeDelta, Utc};
use parley_core::{Error, Result, account::Account};
use tracing::debug;
use uuid::Uuid;

use crate::{
  MemoryAccountRepo, MemoryCommentRepo, MemoryPostRepo, StoreConfig,
  state::{PruneReport, StoreStats, Tables},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Accounts, posts and comments held in process memory with TTL expiry.
///
/// One lock guards every table and index, so cascades (post → comments) are
/// atomic across kinds. Expiry is lazy: each operation first runs a prune
/// pass, at most once per configured interval, under the write lock. Reads
/// then release it and re-acquire the lock for reading.
///
/// Clones share the same tables.
#[derive(Debug, Clone)]
pub struct MemoryStore {
  inner: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
  tables:         RwLock<Tables>,
  ttl:            Option<TimeDelta>,
  prune_interval: TimeDelta,
}

impl Default for MemoryStore {
  fn default() -> Self { Self::new() }
}

impl MemoryStore {
  /// A store with the default one-day TTL.
  pub fn new() -> Self { Self::with_config(&StoreConfig::default()) }

  /// A store in which nothing ever expires. Useful for deterministic tests.
  pub fn without_ttl() -> Self { Self::with_config(&StoreConfig::without_ttl()) }

  pub fn with_config(config: &StoreConfig) -> Self {
    let prune_interval =
      TimeDelta::from_std(config.prune_interval()).unwrap_or(TimeDelta::MAX);
    Self {
      inner: Arc::new(Shared {
        tables: RwLock::new(Tables::default()),
        ttl: config.ttl(),
        prune_interval,
      }),
    }
  }

  pub fn ttl(&self) -> Option<TimeDelta> { self.inner.ttl }

  // ── Facades ───────────────────────────────────────────────────────────────

  pub fn accounts(&self) -> MemoryAccountRepo { MemoryAccountRepo::new(self.clone()) }

  pub fn posts(&self) -> MemoryPostRepo { MemoryPostRepo::new(self.clone()) }

  pub fn comments(&self) -> MemoryCommentRepo { MemoryCommentRepo::new(self.clone()) }

  // ── Direct operations ─────────────────────────────────────────────────────

  /// Store an account, generating an identifier if `account.id` is empty.
  pub fn insert_account(&self, mut account: Account) -> Result<Account> {
    if account.id.is_empty() {
      account.id = Uuid::new_v4().to_string();
    }
    let now = Utc::now();
    let mut tables = self.write_at(now)?;
    tables.insert_account(account.clone(), now)?;
    Ok(account)
  }

  /// Run a full prune pass now, ignoring the rate limit.
  pub fn prune_now(&self) -> Result<PruneReport> { self.prune_at(Utc::now()) }

  /// Run a full prune pass as if the current time were `now`.
  pub fn prune_at(&self, now: DateTime<Utc>) -> Result<PruneReport> {
    let Some(ttl) = self.inner.ttl else {
      return Ok(PruneReport::default());
    };
    let report = self.lock_write()?.prune(now, ttl);
    log_report(&report);
    Ok(report)
  }

  pub fn stats(&self) -> Result<StoreStats> {
    Ok(self.read_at(Utc::now())?.stats())
  }

  // ── Locking ───────────────────────────────────────────────────────────────

  fn lock_write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
    self.inner.tables.write().map_err(|_| Error::LockPoisoned)
  }

  /// Take the write lock, running a lazy prune pass first if one is due.
  pub(crate) fn write_at(
    &self,
    now: DateTime<Utc>,
  ) -> Result<RwLockWriteGuard<'_, Tables>> {
    let mut tables = self.lock_write()?;
    if let Some(report) =
      tables.maybe_prune(now, self.inner.ttl, self.inner.prune_interval)
    {
      log_report(&report);
    }
    Ok(tables)
  }

  /// Run the lazy prune check under a short write lock, then take the read
  /// lock for the actual read.
  pub(crate) fn read_at(
    &self,
    now: DateTime<Utc>,
  ) -> Result<RwLockReadGuard<'_, Tables>> {
    drop(self.write_at(now)?);
    self.inner.tables.read().map_err(|_| Error::LockPoisoned)
  }

  #[cfg(test)]
  pub(crate) fn check_indices(&self) -> std::result::Result<(), String> {
    self.lock_write().map_err(|e| e.to_string())?.check_indices()
  }

  #[cfg(test)]
  pub(crate) fn with_tables<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> T {
    let mut tables = self.inner.tables.write().unwrap();
    f(&mut tables)
  }
}

fn log_report(report: &PruneReport) {
  if !report.is_empty() {
    debug!(
      posts = report.posts,
      accounts = report.accounts,
      comments = report.comments,
      "pruned expired entities"
    );
  }
}
