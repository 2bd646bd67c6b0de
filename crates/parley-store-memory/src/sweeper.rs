//! Optional background sweeper.
//!
//! Lazy pruning only runs when the store is being used. A long-lived process
//! that wants expiry enforced while idle can spawn a sweeper, which takes the
//! same write lock on a timer and stops when its handle is shut down or
//! dropped.

use std::time::Duration;

use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, error};

use crate::MemoryStore;

/// Owns a running sweeper task. Dropping the handle stops the task.
#[derive(Debug)]
pub struct SweeperHandle {
  shutdown_tx: watch::Sender<bool>,
  task:        Option<JoinHandle<()>>,
}

impl SweeperHandle {
  /// Signal the sweeper to stop and wait for it to finish.
  pub async fn shutdown(mut self) {
    let _ = self.shutdown_tx.send(true);
    if let Some(task) = self.task.take()
      && let Err(e) = task.await
    {
      error!(error = %e, "sweeper task failed");
    }
  }
}

impl Drop for SweeperHandle {
  fn drop(&mut self) { let _ = self.shutdown_tx.send(true); }
}

impl MemoryStore {
  /// Spawn a task that prunes the store every `interval` (at least one
  /// millisecond).
  ///
  /// # Panics
  ///
  /// Panics if called outside of a Tokio runtime.
  pub fn spawn_sweeper(&self, interval: Duration) -> SweeperHandle {
    let interval = interval.max(Duration::from_millis(1));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(sweep(self.clone(), interval, shutdown_rx));
    debug!(?interval, "sweeper started");
    SweeperHandle { shutdown_tx, task: Some(task) }
  }
}

async fn sweep(
  store: MemoryStore,
  interval: Duration,
  mut shutdown_rx: watch::Receiver<bool>,
) {
  let mut ticker = tokio::time::interval(interval);
  // The first tick completes immediately; wait a full interval instead.
  ticker.tick().await;

  loop {
    tokio::select! {
      _ = ticker.tick() => {
        if let Err(e) = store.prune_now() {
          error!(error = %e, "sweep failed");
        }
      }
      changed = shutdown_rx.changed() => {
        if changed.is_err() || *shutdown_rx.borrow() {
          break;
        }
      }
    }
  }

  debug!("sweeper stopped");
}
