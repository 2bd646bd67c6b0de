//! Error types for `parley-core`.
//!
//! There is no "not found" variant: every lookup reports a missing entity as
//! `Ok(None)`.

use thiserror::Error;

/// The entity kinds held by a repository backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum EntityKind {
  Account,
  Post,
  Comment,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("identifier must not be empty")]
  EmptyId,

  #[error("{kind} already exists: {id}")]
  AlreadyExists { kind: EntityKind, id: String },

  #[error("operation cancelled")]
  Cancelled,

  #[error("deadline exceeded")]
  DeadlineExceeded,

  #[error(
    "parent comment {parent_id} belongs to post {parent_post_id}, not {post_id}"
  )]
  ParentPostMismatch {
    parent_id:      String,
    parent_post_id: String,
    post_id:        String,
  },

  #[error("store lock poisoned")]
  LockPoisoned,

  /// Failure reported by a persistent backend implementing the same traits.
  #[error("backend error: {0}")]
  Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// `true` for errors raised by the calling [`Context`](crate::Context)
  /// rather than by the store.
  pub fn is_cancellation(&self) -> bool {
    matches!(self, Self::Cancelled | Self::DeadlineExceeded)
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
