//! Error type for `parley-service`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Store(#[from] parley_core::Error),

  #[error(transparent)]
  Notify(#[from] parley_notify::Error),

  #[error("invalid input: {0}")]
  Validation(&'static str),

  #[error("post not found: {0}")]
  PostNotFound(String),

  #[error("comments are disabled for post {0}")]
  CommentsDisabled(String),

  #[error("parent comment not found: {0}")]
  ParentNotFound(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
