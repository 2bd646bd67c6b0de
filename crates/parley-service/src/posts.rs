//! [`PostService`] — validated post creation.

use parley_core::{
  Context,
  post::{CreatePostInput, Post},
  repository::PostRepo,
};

use crate::{Error, MAX_BODY_LEN, MAX_TITLE_LEN, Result};

pub struct PostService<P> {
  posts: P,
}

impl<P: PostRepo> PostService<P> {
  pub fn new(posts: P) -> Self { Self { posts } }

  pub fn repo(&self) -> &P { &self.posts }

  /// Validate and store a new post. Title and body are trimmed before they
  /// are checked and stored.
  pub async fn create(&self, ctx: &Context, input: CreatePostInput) -> Result<Post> {
    let input = validate(input)?;
    Ok(self.posts.create(ctx, input).await?)
  }
}

fn validate(mut input: CreatePostInput) -> Result<CreatePostInput> {
  if input.author_id.is_empty() {
    return Err(Error::Validation("author id is required"));
  }

  input.title = input.title.trim().to_owned();
  if input.title.is_empty() {
    return Err(Error::Validation("title is required"));
  }
  if input.title.chars().count() > MAX_TITLE_LEN {
    return Err(Error::Validation("title is too long"));
  }

  input.body = input.body.trim().to_owned();
  if input.body.is_empty() {
    return Err(Error::Validation("body is required"));
  }
  if input.body.chars().count() > MAX_BODY_LEN {
    return Err(Error::Validation("body is too long"));
  }

  Ok(input)
}
