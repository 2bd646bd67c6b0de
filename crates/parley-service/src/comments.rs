//! [`CommentService`] — validated comment creation with live fan-out.

use parley_core::{
  Context,
  comment::{AddCommentInput, Comment, CommentQuery, NewComment},
  page::Page,
  repository::{CommentRepo, PostRepo},
};
use parley_notify::{CommentNotifier, Subscription};
use tracing::warn;

use crate::{Error, MAX_BODY_LEN, Result};

pub struct CommentService<P, C> {
  posts:    P,
  comments: C,
  notifier: CommentNotifier,
}

impl<P: PostRepo, C: CommentRepo> CommentService<P, C> {
  pub fn new(posts: P, comments: C, notifier: CommentNotifier) -> Self {
    Self { posts, comments, notifier }
  }

  pub fn repo(&self) -> &C { &self.comments }

  pub fn notifier(&self) -> &CommentNotifier { &self.notifier }

  /// Validate, store and publish a new comment.
  ///
  /// The post must exist and accept comments, and a parent (if given) must
  /// exist on the same post. Publishing happens after the write and cannot
  /// fail it: skipped deliveries are only logged.
  pub async fn add(&self, ctx: &Context, input: AddCommentInput) -> Result<Comment> {
    if input.post_id.is_empty() {
      return Err(Error::Validation("post id is required"));
    }
    if input.author_id.is_empty() {
      return Err(Error::Validation("author id is required"));
    }
    let body = input.body.trim();
    if body.is_empty() {
      return Err(Error::Validation("comment body is required"));
    }
    if body.chars().count() > MAX_BODY_LEN {
      return Err(Error::Validation("comment body is too long"));
    }

    let post = self
      .posts
      .get_by_id(ctx, &input.post_id)
      .await?
      .ok_or_else(|| Error::PostNotFound(input.post_id.clone()))?;
    if !post.comments_enabled {
      return Err(Error::CommentsDisabled(post.id));
    }

    let parent_id = input.parent_id.filter(|p| !p.is_empty());
    let depth = self
      .resolve_depth(ctx, &input.post_id, parent_id.as_deref())
      .await?;

    let comment = self
      .comments
      .create(ctx, NewComment {
        post_id: input.post_id,
        author_id: input.author_id,
        parent_id,
        body: body.to_owned(),
        depth,
      })
      .await?;

    match self.notifier.publish(&comment.post_id, &comment) {
      Ok(report) if !report.is_complete() => {
        warn!(comment_id = %comment.id, %report, "comment not delivered to every subscriber");
      }
      Ok(_) => {}
      Err(e) => warn!(comment_id = %comment.id, error = %e, "comment publish failed"),
    }
    Ok(comment)
  }

  /// Depth for a new comment: 0 at the root, otherwise one below the parent.
  ///
  /// The parent must exist and belong to `post_id`.
  pub async fn resolve_depth(
    &self,
    ctx: &Context,
    post_id: &str,
    parent_id: Option<&str>,
  ) -> Result<u32> {
    let Some(parent_id) = parent_id else {
      return Ok(0);
    };
    let meta = self
      .comments
      .get_meta(ctx, parent_id)
      .await?
      .ok_or_else(|| Error::ParentNotFound(parent_id.to_owned()))?;
    if meta.post_id != post_id {
      return Err(
        parley_core::Error::ParentPostMismatch {
          parent_id:      parent_id.to_owned(),
          parent_post_id: meta.post_id,
          post_id:        post_id.to_owned(),
        }
        .into(),
      );
    }
    Ok(meta.depth + 1)
  }

  pub async fn list(&self, ctx: &Context, query: &CommentQuery) -> Result<Page<Comment>> {
    Ok(self.comments.list_by_parent(ctx, query).await?)
  }

  /// Subscribe to comments created on `post_id` from now on.
  pub fn subscribe(&self, post_id: &str) -> Result<Subscription> {
    Ok(self.notifier.subscribe(post_id)?)
  }
}
