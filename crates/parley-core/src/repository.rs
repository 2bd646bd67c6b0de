//! Repository traits for accounts, posts and comments.
//!
//! The traits are implemented by storage backends (e.g.
//! `parley-store-memory`). The service layer and resolvers depend on this
//! abstraction, so an in-memory backend and a persistent one can be swapped
//! without touching callers.
//!
//! Conventions shared by every method:
//!
//! - The [`Context`] is checked before anything else; a cancelled caller
//!   never reaches the store.
//! - Empty required identifiers fail with [`Error::EmptyId`] before any lock
//!   is taken.
//! - A missing entity is `Ok(None)`, never an error.
//! - Returned entities are copies; mutating them never affects stored state.
//!
//! [`Error::EmptyId`]: crate::Error::EmptyId

use std::future::Future;

use crate::{
  Context, Result,
  account::Account,
  comment::{Comment, CommentMeta, CommentQuery, NewComment},
  page::Page,
  post::{CreatePostInput, Post},
};

// ─── Accounts ────────────────────────────────────────────────────────────────

pub trait AccountRepo: Send + Sync {
  /// Retrieve an account by identifier.
  fn get_by_id<'a>(
    &'a self,
    ctx: &'a Context,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Account>>> + Send + 'a;

  /// Page through all accounts in lexicographic identifier order.
  fn list<'a>(
    &'a self,
    ctx: &'a Context,
    first: i32,
    after: Option<&'a str>,
  ) -> impl Future<Output = Result<Page<Account>>> + Send + 'a;

  /// Store a new account. A blank identifier is replaced by a generated one;
  /// an identifier that is already taken fails with
  /// [`Error::AlreadyExists`](crate::Error::AlreadyExists).
  fn create<'a>(
    &'a self,
    ctx: &'a Context,
    account: Account,
  ) -> impl Future<Output = Result<Account>> + Send + 'a;
}

// ─── Posts ───────────────────────────────────────────────────────────────────

pub trait PostRepo: Send + Sync {
  /// Retrieve a post by identifier.
  fn get_by_id<'a>(
    &'a self,
    ctx: &'a Context,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Post>>> + Send + 'a;

  /// Create a post under a freshly generated identifier.
  ///
  /// Field-level validation is the caller's job; the repository only
  /// defaults `comments_enabled` to `true`.
  fn create<'a>(
    &'a self,
    ctx: &'a Context,
    input: CreatePostInput,
  ) -> impl Future<Output = Result<Post>> + Send + 'a;

  /// Page through posts in creation order.
  fn list<'a>(
    &'a self,
    ctx: &'a Context,
    first: i32,
    after: Option<&'a str>,
  ) -> impl Future<Output = Result<Page<Post>>> + Send + 'a;

  /// Toggle whether a post accepts comments. Returns `None` if the post does
  /// not exist.
  fn set_comments_enabled<'a>(
    &'a self,
    ctx: &'a Context,
    id: &'a str,
    enabled: bool,
  ) -> impl Future<Output = Result<Option<Post>>> + Send + 'a;
}

// ─── Comments ────────────────────────────────────────────────────────────────

pub trait CommentRepo: Send + Sync {
  /// The owning post and depth of a comment, or `None` if it does not exist.
  fn get_meta<'a>(
    &'a self,
    ctx: &'a Context,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<CommentMeta>>> + Send + 'a;

  /// Store a new comment with zero children and bump its parent's
  /// `children_count`. If the parent has already expired the comment is
  /// stored anyway, as an orphan.
  fn create<'a>(
    &'a self,
    ctx: &'a Context,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment>> + Send + 'a;

  /// Page through the direct children of `query.parent_id` (or the root
  /// comments) that belong to `query.post_id`.
  fn list_by_parent<'a>(
    &'a self,
    ctx: &'a Context,
    query: &'a CommentQuery,
  ) -> impl Future<Output = Result<Page<Comment>>> + Send + 'a;
}
