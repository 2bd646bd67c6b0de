//! `parley` — development driver for the in-memory Parley store.
//!
//! Loads configuration, seeds a store from a JSON fixture, and prints every
//! page of posts (each with its first page of root comments) as JSON.
//!
//! # Usage
//!
//! ```
//! parley --fixture crates/parley-cli/fixtures/sample.json --page-size 2
//! PARLEY_STORE__TTL_SECS=0 parley --config parley.toml
//! ```

mod fixture;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use fixture::Fixture;
use parley_core::{
  Context,
  comment::CommentQuery,
  page::Connection,
  repository::{CommentRepo, PostRepo},
};
use parley_notify::CommentNotifier;
use parley_service::{CommentService, PostService};
use parley_store_memory::MemoryStore;
use settings::AppConfig;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "parley", version, about = "Development driver for the Parley store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "parley.toml")]
  config: PathBuf,

  /// JSON fixture to seed the store with.
  #[arg(short, long, value_name = "FILE")]
  fixture: Option<PathBuf>,

  /// Items per printed page; overrides the configured value.
  #[arg(long)]
  page_size: Option<i32>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let mut cfg = AppConfig::load(&cli.config)?;
  if let Some(page_size) = cli.page_size {
    cfg.page_size = page_size;
  }

  let store = MemoryStore::with_config(&cfg.store);
  let sweeper = cfg
    .store
    .sweep
    .then(|| store.spawn_sweeper(cfg.store.prune_interval()));

  let ctx = Context::background();
  let posts = PostService::new(store.posts());
  let comments = CommentService::new(store.posts(), store.comments(), CommentNotifier::new());

  if let Some(path) = &cli.fixture {
    Fixture::load(path)?
      .seed(&ctx, &store, &posts, &comments)
      .await?;
  }

  print_posts(&ctx, &posts, &comments, cfg.page_size).await?;

  let stats = store.stats().context("reading store stats")?;
  info!(
    accounts = stats.accounts,
    posts = stats.posts,
    comments = stats.comments,
    "done"
  );

  if let Some(sweeper) = sweeper {
    sweeper.shutdown().await;
  }
  Ok(())
}

/// Walk every post page and print it as a connection, each post carrying its
/// first page of root comments.
async fn print_posts<P: PostRepo, C: CommentRepo>(
  ctx: &Context,
  posts: &PostService<P>,
  comments: &CommentService<P, C>,
  page_size: i32,
) -> anyhow::Result<()> {
  let mut after: Option<String> = None;
  loop {
    let mut page = posts
      .repo()
      .list(ctx, page_size, after.as_deref())
      .await
      .context("listing posts")?;
    if page.is_empty() {
      break;
    }

    for post in &mut page.items {
      let roots = comments
        .list(ctx, &CommentQuery::roots(post.id.as_str()).first(page_size))
        .await
        .with_context(|| format!("listing comments on post {}", post.id))?;
      post.comments = Connection::from(roots);
    }

    after = page.next_cursor.clone();
    let connection = Connection::from(page);
    println!("{}", serde_json::to_string_pretty(&connection)?);
  }
  Ok(())
}
