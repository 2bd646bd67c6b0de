//! Post — the root of a comment thread.

use serde::{Deserialize, Serialize};

use crate::{comment::Comment, page::Connection, page::Identified};

/// A published post.
///
/// Only `comments_enabled` may change after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
  pub id:               String,
  pub title:            String,
  pub body:             String,
  /// Identifier of the authoring [`Account`](crate::account::Account).
  pub author_id:        String,
  pub comments_enabled: bool,
  /// Always empty when returned by a repository; comments are fetched
  /// separately with [`CommentRepo::list_by_parent`].
  ///
  /// [`CommentRepo::list_by_parent`]: crate::repository::CommentRepo::list_by_parent
  pub comments:         Connection<Comment>,
}

impl Identified for Post {
  fn id(&self) -> &str { &self.id }
}

/// Input to [`crate::repository::PostRepo::create`].
/// The identifier is always generated by the repository.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostInput {
  pub author_id:        String,
  pub title:            String,
  pub body:             String,
  /// Defaults to `true` when unset.
  #[serde(default)]
  pub comments_enabled: Option<bool>,
}

impl CreatePostInput {
  pub fn new(
    author_id: impl Into<String>,
    title: impl Into<String>,
    body: impl Into<String>,
  ) -> Self {
    Self {
      author_id:        author_id.into(),
      title:            title.into(),
      body:             body.into(),
      comments_enabled: None,
    }
  }

  /// Build the stored post under the given generated identifier.
  pub fn into_post(self, id: String) -> Post {
    Post {
      id,
      title: self.title,
      body: self.body,
      author_id: self.author_id,
      comments_enabled: self.comments_enabled.unwrap_or(true),
      comments: Connection::empty(),
    }
  }
}
