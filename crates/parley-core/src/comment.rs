//! Comments — threaded replies to a post.
//!
//! A comment either sits at the root of its post's thread (`parent_id` is
//! `None`, depth 0) or replies to another comment on the same post (depth is
//! the parent's depth plus one).

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::page::{Connection, Identified};

// ─── Comment ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
  pub id:             String,
  pub post_id:        String,
  /// Identifier of the authoring account; may no longer resolve.
  pub author_id:      String,
  pub body:           String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub parent_id:      Option<String>,
  pub depth:          u32,
  /// Number of live direct replies, maintained by the store.
  pub children_count: u32,
  /// Always empty when returned by a repository.
  pub children:       Connection<Comment>,
  /// Server-assigned; drives both expiry and ordering.
  pub created_at:     DateTime<Utc>,
}

impl Comment {
  pub fn is_root(&self) -> bool { self.parent_id.is_none() }

  /// Key of the parent-index bucket holding this comment; root comments
  /// share the empty key.
  pub fn parent_key(&self) -> &str { self.parent_id.as_deref().unwrap_or("") }
}

impl Identified for Comment {
  fn id(&self) -> &str { &self.id }
}

/// The two facts about a comment needed to place a reply under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentMeta {
  pub post_id: String,
  pub depth:   u32,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::repository::CommentRepo::create`].
///
/// The depth is computed by the caller; `id`, `children_count` and
/// `created_at` are always set by the store.
#[derive(Debug, Clone)]
pub struct NewComment {
  pub post_id:   String,
  pub author_id: String,
  pub parent_id: Option<String>,
  pub body:      String,
  pub depth:     u32,
}

impl NewComment {
  /// A root comment on `post_id`.
  pub fn root(
    post_id: impl Into<String>,
    author_id: impl Into<String>,
    body: impl Into<String>,
  ) -> Self {
    Self {
      post_id:   post_id.into(),
      author_id: author_id.into(),
      parent_id: None,
      body:      body.into(),
      depth:     0,
    }
  }

  /// A reply to `parent_id` at the given depth.
  pub fn reply(
    post_id: impl Into<String>,
    author_id: impl Into<String>,
    parent_id: impl Into<String>,
    body: impl Into<String>,
    depth: u32,
  ) -> Self {
    Self {
      post_id: post_id.into(),
      author_id: author_id.into(),
      parent_id: Some(parent_id.into()),
      body: body.into(),
      depth,
    }
  }

  /// Build the stored comment under the given identifier and timestamp.
  /// An empty parent identifier is treated as "no parent".
  pub fn into_comment(self, id: String, created_at: DateTime<Utc>) -> Comment {
    Comment {
      id,
      post_id: self.post_id,
      author_id: self.author_id,
      body: self.body,
      parent_id: self.parent_id.filter(|p| !p.is_empty()),
      depth: self.depth,
      children_count: 0,
      children: Connection::empty(),
      created_at,
    }
  }
}

/// Unvalidated input for adding a comment through the service layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCommentInput {
  pub post_id:   String,
  pub author_id: String,
  #[serde(default)]
  pub parent_id: Option<String>,
  pub body:      String,
}

// ─── Ordering ────────────────────────────────────────────────────────────────

/// Sort order for comment listings.
///
/// Both orders are total: ties on `created_at` are broken by identifier.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum CommentOrder {
  /// Most recent first; ties by descending identifier.
  #[default]
  Newest,
  /// Oldest first; ties by ascending identifier.
  Oldest,
}

impl CommentOrder {
  /// Parse an order name, falling back to [`CommentOrder::Newest`] for
  /// anything unrecognised.
  pub fn parse_or_default(s: &str) -> Self { s.parse().unwrap_or_default() }

  pub fn compare(self, a: &Comment, b: &Comment) -> Ordering {
    let oldest_first = (a.created_at, a.id.as_str()).cmp(&(b.created_at, b.id.as_str()));
    match self {
      Self::Oldest => oldest_first,
      Self::Newest => oldest_first.reverse(),
    }
  }
}

// ─── Query ───────────────────────────────────────────────────────────────────

/// Parameters for [`crate::repository::CommentRepo::list_by_parent`].
#[derive(Debug, Clone, Default)]
pub struct CommentQuery {
  pub post_id:   String,
  /// `None` lists the post's root comments.
  pub parent_id: Option<String>,
  pub first:     i32,
  pub after:     Option<String>,
  /// `None` means [`CommentOrder::Newest`].
  pub order:     Option<CommentOrder>,
}

impl CommentQuery {
  /// Root comments of `post_id`.
  pub fn roots(post_id: impl Into<String>) -> Self {
    Self { post_id: post_id.into(), ..Self::default() }
  }

  /// Direct replies to `parent_id` on `post_id`.
  pub fn replies(post_id: impl Into<String>, parent_id: impl Into<String>) -> Self {
    Self {
      post_id: post_id.into(),
      parent_id: Some(parent_id.into()),
      ..Self::default()
    }
  }

  pub fn first(mut self, first: i32) -> Self {
    self.first = first;
    self
  }

  pub fn after(mut self, cursor: impl Into<String>) -> Self {
    self.after = Some(cursor.into());
    self
  }

  pub fn order(mut self, order: CommentOrder) -> Self {
    self.order = Some(order);
    self
  }

  /// Key of the parent-index bucket this query reads.
  pub fn parent_key(&self) -> &str { self.parent_id.as_deref().unwrap_or("") }
}
