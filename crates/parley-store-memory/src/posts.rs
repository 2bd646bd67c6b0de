//! Post facade.

use chrono::Utc;
use parley_core::{
  Context, Error, Result,
  page::{Page, paginate},
  post::{CreatePostInput, Post},
  repository::PostRepo,
};
use tracing::{debug, error};
use uuid::Uuid;

use crate::MemoryStore;

/// [`PostRepo`] over a shared [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryPostRepo {
  store: MemoryStore,
}

impl MemoryPostRepo {
  pub fn new(store: MemoryStore) -> Self { Self { store } }
}

impl PostRepo for MemoryPostRepo {
  async fn get_by_id(&self, ctx: &Context, id: &str) -> Result<Option<Post>> {
    ctx.check()?;
    if id.is_empty() {
      error!("post lookup rejected: empty id");
      return Err(Error::EmptyId);
    }

    let tables = self.store.read_at(Utc::now())?;
    Ok(tables.posts.get(id).cloned())
  }

  async fn create(&self, ctx: &Context, input: CreatePostInput) -> Result<Post> {
    ctx.check()?;

    let post = input.into_post(Uuid::new_v4().to_string());
    let now = Utc::now();
    let mut tables = self.store.write_at(now)?;
    tables.insert_post(post.clone(), now).inspect_err(|e| {
      error!(error = %e, "post creation failed");
    })?;
    debug!(post_id = %post.id, "post created");
    Ok(post)
  }

  async fn list(
    &self,
    ctx:   &Context,
    first: i32,
    after: Option<&str>,
  ) -> Result<Page<Post>> {
    ctx.check()?;

    let tables = self.store.read_at(Utc::now())?;
    let posts = paginate(&tables.post_order, after, first)
      .iter()
      .filter_map(|id| tables.posts.get(id).cloned())
      .collect();
    Ok(Page::new(posts))
  }

  async fn set_comments_enabled(
    &self,
    ctx:     &Context,
    id:      &str,
    enabled: bool,
  ) -> Result<Option<Post>> {
    ctx.check()?;
    if id.is_empty() {
      error!("comment toggle rejected: empty post id");
      return Err(Error::EmptyId);
    }

    let mut tables = self.store.write_at(Utc::now())?;
    Ok(tables.posts.get_mut(id).map(|post| {
      post.comments_enabled = enabled;
      post.clone()
    }))
  }
}
