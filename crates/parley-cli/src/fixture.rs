//! JSON seed data for a development store.

use std::{collections::VecDeque, path::Path};

use anyhow::Context as _;
use parley_core::{
  Context,
  account::Account,
  comment::AddCommentInput,
  post::CreatePostInput,
  repository::{CommentRepo, PostRepo},
};
use parley_service::{CommentService, PostService};
use parley_store_memory::MemoryStore;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Fixture {
  pub accounts: Vec<Account>,
  pub posts:    Vec<FixturePost>,
}

#[derive(Debug, Deserialize)]
pub struct FixturePost {
  pub author_id:        String,
  pub title:            String,
  pub body:             String,
  pub comments_enabled: Option<bool>,
  #[serde(default)]
  pub comments:         Vec<FixtureComment>,
}

#[derive(Debug, Deserialize)]
pub struct FixtureComment {
  pub author_id: String,
  pub body:      String,
  #[serde(default)]
  pub replies:   Vec<FixtureComment>,
}

/// Totals written by [`Fixture::seed`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Seeded {
  pub accounts: usize,
  pub posts:    usize,
  pub comments: usize,
}

impl Fixture {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading fixture {}", path.display()))?;
    serde_json::from_str(&raw)
      .with_context(|| format!("parsing fixture {}", path.display()))
  }

  /// Write the fixture through the service layer so every entry is validated
  /// exactly as a live request would be.
  pub async fn seed<P: PostRepo, C: CommentRepo>(
    self,
    ctx: &Context,
    store: &MemoryStore,
    posts: &PostService<P>,
    comments: &CommentService<P, C>,
  ) -> anyhow::Result<Seeded> {
    let mut seeded = Seeded::default();

    for account in self.accounts {
      let account = store
        .insert_account(account)
        .context("seeding account")?;
      info!(account_id = %account.id, "seeded account");
      seeded.accounts += 1;
    }

    for fixture in self.posts {
      let mut input = CreatePostInput::new(fixture.author_id, fixture.title, fixture.body);
      input.comments_enabled = fixture.comments_enabled;
      let post = posts.create(ctx, input).await.context("seeding post")?;
      seeded.posts += 1;

      // Parents are created before their replies.
      let mut queue: VecDeque<(Option<String>, FixtureComment)> =
        fixture.comments.into_iter().map(|c| (None, c)).collect();
      while let Some((parent_id, comment)) = queue.pop_front() {
        let created = comments
          .add(ctx, AddCommentInput {
            post_id: post.id.clone(),
            author_id: comment.author_id,
            parent_id,
            body: comment.body,
          })
          .await
          .with_context(|| format!("seeding comment on post {}", post.id))?;
        seeded.comments += 1;
        queue.extend(
          comment
            .replies
            .into_iter()
            .map(|reply| (Some(created.id.clone()), reply)),
        );
      }
    }

    info!(
      accounts = seeded.accounts,
      posts = seeded.posts,
      comments = seeded.comments,
      "fixture loaded"
    );
    Ok(seeded)
  }
}
