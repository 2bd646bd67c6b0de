//! Comment facade.

use chrono::Utc;
use parley_core::{
  Context, Error, Result,
  comment::{Comment, CommentMeta, CommentQuery, NewComment},
  page::{Page, paginate},
  repository::CommentRepo,
};
use tracing::{debug, error};
use uuid::Uuid;

use crate::MemoryStore;

/// [`CommentRepo`] over a shared [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryCommentRepo {
  store: MemoryStore,
}

impl MemoryCommentRepo {
  pub fn new(store: MemoryStore) -> Self { Self { store } }
}

impl CommentRepo for MemoryCommentRepo {
  async fn get_meta(&self, ctx: &Context, id: &str) -> Result<Option<CommentMeta>> {
    ctx.check()?;
    if id.is_empty() {
      error!("comment lookup rejected: empty id");
      return Err(Error::EmptyId);
    }

    let tables = self.store.read_at(Utc::now())?;
    Ok(tables.comments.get(id).map(|c| CommentMeta {
      post_id: c.post_id.clone(),
      depth:   c.depth,
    }))
  }

  async fn create(&self, ctx: &Context, input: NewComment) -> Result<Comment> {
    ctx.check()?;
    if input.post_id.is_empty() || input.author_id.is_empty() {
      error!("comment creation rejected: empty post or author id");
      return Err(Error::EmptyId);
    }

    let now = Utc::now();
    let comment = input.into_comment(Uuid::new_v4().to_string(), now);
    let mut tables = self.store.write_at(now)?;
    tables.insert_comment(comment.clone()).inspect_err(|e| {
      error!(error = %e, post_id = %comment.post_id, "comment creation failed");
    })?;
    debug!(comment_id = %comment.id, post_id = %comment.post_id, "comment created");
    Ok(comment)
  }

  async fn list_by_parent(
    &self,
    ctx:   &Context,
    query: &CommentQuery,
  ) -> Result<Page<Comment>> {
    ctx.check()?;
    if query.post_id.is_empty() {
      error!("comment listing rejected: empty post id");
      return Err(Error::EmptyId);
    }
    let order = query.order.unwrap_or_default();

    let tables = self.store.read_at(Utc::now())?;
    let Some(bucket) = tables.by_parent.get(query.parent_key()) else {
      return Ok(Page::empty());
    };

    // The bucket is keyed by parent only; filter out anything filed under it
    // from another post.
    let mut siblings: Vec<&Comment> = bucket
      .iter()
      .filter_map(|id| tables.comments.get(id))
      .filter(|c| c.post_id == query.post_id)
      .collect();
    siblings.sort_by(|a, b| order.compare(a, b));

    let ids: Vec<&str> = siblings.iter().map(|c| c.id.as_str()).collect();
    let comments = paginate(&ids, query.after.as_deref(), query.first)
      .iter()
      .filter_map(|id| tables.comments.get(*id).cloned())
      .collect();
    Ok(Page::new(comments))
  }
}
