//! Tests for `MemoryStore` and its repository facades.

use std::time::Duration;

use chrono::{TimeDelta, Utc};
use parley_core::{
  Context, EntityKind, Error,
  account::Account,
  comment::{CommentOrder, CommentQuery, NewComment},
  post::CreatePostInput,
  repository::{AccountRepo, CommentRepo, PostRepo},
};

use crate::{MemoryStore, StoreConfig, StoreStats};

fn ctx() -> Context { Context::background() }

fn store() -> MemoryStore { MemoryStore::without_ttl() }

/// A store with a one-minute TTL whose lazy pruning never kicks in on its
/// own during a test; passes are driven with `prune_at`.
fn expiring_store() -> MemoryStore {
  MemoryStore::with_config(
    &StoreConfig::default()
      .with_ttl(Duration::from_secs(60))
      .with_prune_interval(Duration::from_secs(3600)),
  )
}

fn post_input(title: &str) -> CreatePostInput {
  CreatePostInput::new("author", title, "body")
}

fn assert_indices(store: &MemoryStore) {
  if let Err(violation) = store.check_indices() {
    panic!("index invariant violated: {violation}");
  }
}

// ─── Posts ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_post() {
  let posts = store().posts();

  let post = posts.create(&ctx(), post_input("hello")).await.unwrap();
  assert!(!post.id.is_empty());
  assert!(post.comments_enabled);
  assert_eq!(post.comments.total_count, 0);

  let fetched = posts.get_by_id(&ctx(), &post.id).await.unwrap();
  assert_eq!(fetched, Some(post));
}

#[tokio::test]
async fn get_missing_post_returns_none() {
  let posts = store().posts();
  assert!(posts.get_by_id(&ctx(), "nope").await.unwrap().is_none());
}

#[tokio::test]
async fn empty_ids_are_rejected() {
  let s = store();
  assert!(matches!(s.posts().get_by_id(&ctx(), "").await, Err(Error::EmptyId)));
  assert!(matches!(s.accounts().get_by_id(&ctx(), "").await, Err(Error::EmptyId)));
  assert!(matches!(s.comments().get_meta(&ctx(), "").await, Err(Error::EmptyId)));
  assert!(matches!(
    s.posts().set_comments_enabled(&ctx(), "", false).await,
    Err(Error::EmptyId)
  ));
  assert!(matches!(
    s.comments().create(&ctx(), NewComment::root("", "u1", "x")).await,
    Err(Error::EmptyId)
  ));
  assert!(matches!(
    s.comments().create(&ctx(), NewComment::root("p1", "", "x")).await,
    Err(Error::EmptyId)
  ));
  assert!(matches!(
    s.comments().list_by_parent(&ctx(), &CommentQuery::roots("")).await,
    Err(Error::EmptyId)
  ));
}

#[tokio::test]
async fn duplicate_post_id_is_a_conflict() {
  let s = store();
  let post = s.posts().create(&ctx(), post_input("a")).await.unwrap();

  let result = s.with_tables(|t| t.insert_post(post.clone(), Utc::now()));
  assert!(matches!(
    result,
    Err(Error::AlreadyExists { kind: EntityKind::Post, ref id }) if *id == post.id
  ));
  assert_eq!(s.stats().unwrap().posts, 1);
}

#[tokio::test]
async fn list_posts_pages_in_creation_order() {
  let posts = store().posts();
  let a = posts.create(&ctx(), post_input("A")).await.unwrap();
  let b = posts.create(&ctx(), post_input("B")).await.unwrap();
  let c = posts.create(&ctx(), post_input("C")).await.unwrap();

  let first = posts.list(&ctx(), 2, None).await.unwrap();
  let ids: Vec<_> = first.items.iter().map(|p| p.id.clone()).collect();
  assert_eq!(ids, [a.id.clone(), b.id.clone()]);
  assert_eq!(first.next_cursor.as_deref(), Some(b.id.as_str()));

  let second = posts.list(&ctx(), 2, Some(&b.id)).await.unwrap();
  assert_eq!(second.items.len(), 1);
  assert_eq!(second.items[0].id, c.id);
  assert_eq!(second.next_cursor.as_deref(), Some(c.id.as_str()));

  let last = posts.list(&ctx(), 2, Some(&c.id)).await.unwrap();
  assert!(last.is_empty());
  assert!(last.next_cursor.is_none());
}

#[tokio::test]
async fn list_posts_on_empty_store_has_no_cursor() {
  let page = store().posts().list(&ctx(), 10, None).await.unwrap();
  assert!(page.is_empty());
  assert!(page.next_cursor.is_none());
}

#[tokio::test]
async fn walking_post_cursors_visits_each_post_once() {
  let posts = store().posts();
  let mut created = Vec::new();
  for i in 0..25 {
    created.push(posts.create(&ctx(), post_input(&format!("p{i}"))).await.unwrap().id);
  }

  let mut seen = Vec::new();
  let mut after: Option<String> = None;
  loop {
    let page = posts.list(&ctx(), 7, after.as_deref()).await.unwrap();
    if page.is_empty() {
      assert!(page.next_cursor.is_none());
      break;
    }
    seen.extend(page.items.into_iter().map(|p| p.id));
    after = page.next_cursor;
  }
  assert_eq!(seen, created);
}

#[tokio::test]
async fn set_comments_enabled_updates_only_that_flag() {
  let posts = store().posts();
  let post = posts.create(&ctx(), post_input("t")).await.unwrap();

  let updated = posts
    .set_comments_enabled(&ctx(), &post.id, false)
    .await
    .unwrap()
    .unwrap();
  assert!(!updated.comments_enabled);
  assert_eq!(updated.title, post.title);

  let fetched = posts.get_by_id(&ctx(), &post.id).await.unwrap().unwrap();
  assert!(!fetched.comments_enabled);
}

#[tokio::test]
async fn set_comments_enabled_on_missing_post_returns_none() {
  let posts = store().posts();
  let result = posts.set_comments_enabled(&ctx(), "ghost", true).await.unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn returned_posts_are_copies() {
  let posts = store().posts();
  let mut post = posts.create(&ctx(), post_input("original")).await.unwrap();
  post.title = "mutated".into();
  post.comments_enabled = false;

  let fetched = posts.get_by_id(&ctx(), &post.id).await.unwrap().unwrap();
  assert_eq!(fetched.title, "original");
  assert!(fetched.comments_enabled);
}

// ─── Context ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn cancelled_context_never_touches_the_store() {
  let s = store();
  let cancelled = Context::background();
  cancelled.cancel();

  assert!(matches!(
    s.posts().create(&cancelled, post_input("x")).await,
    Err(Error::Cancelled)
  ));
  assert!(matches!(
    s.comments().create(&cancelled, NewComment::root("p1", "u1", "x")).await,
    Err(Error::Cancelled)
  ));
  // Cancellation is checked before input validation.
  assert!(matches!(s.posts().get_by_id(&cancelled, "").await, Err(Error::Cancelled)));
  assert_eq!(s.stats().unwrap().posts, 0);
  assert_eq!(s.stats().unwrap().comments, 0);
}

#[tokio::test]
async fn expired_deadline_short_circuits() {
  let posts = store().posts();
  let ctx = Context::with_timeout(Duration::ZERO);
  assert!(matches!(
    posts.list(&ctx, 10, None).await,
    Err(Error::DeadlineExceeded)
  ));
}

// ─── Accounts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn accounts_list_in_lexicographic_order() {
  let accounts = store().accounts();
  for id in ["carol", "alice", "bob"] {
    accounts.create(&ctx(), Account::new(id, id.to_uppercase())).await.unwrap();
  }

  let first = accounts.list(&ctx(), 2, None).await.unwrap();
  let ids: Vec<_> = first.items.iter().map(|a| a.id.as_str()).collect();
  assert_eq!(ids, ["alice", "bob"]);
  assert_eq!(first.next_cursor.as_deref(), Some("bob"));

  let rest = accounts.list(&ctx(), 2, Some("bob")).await.unwrap();
  assert_eq!(rest.items[0].id, "carol");
}

#[tokio::test]
async fn account_with_blank_id_gets_generated_one() {
  let accounts = store().accounts();
  let account = accounts.create(&ctx(), Account::new("", "Anon")).await.unwrap();
  assert!(!account.id.is_empty());
  let fetched = accounts.get_by_id(&ctx(), &account.id).await.unwrap();
  assert_eq!(fetched.map(|a| a.username), Some("Anon".to_string()));
}

#[tokio::test]
async fn duplicate_account_is_a_conflict() {
  let accounts = store().accounts();
  accounts.create(&ctx(), Account::new("alice", "Alice")).await.unwrap();
  let result = accounts.create(&ctx(), Account::new("alice", "Other")).await;
  assert!(matches!(
    result,
    Err(Error::AlreadyExists { kind: EntityKind::Account, .. })
  ));
  let kept = accounts.get_by_id(&ctx(), "alice").await.unwrap().unwrap();
  assert_eq!(kept.username, "Alice");
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reply_is_listed_under_its_parent() {
  let s = store();
  let comments = s.comments();

  let root = comments.create(&ctx(), NewComment::root("p1", "u1", "root")).await.unwrap();
  let reply = comments
    .create(&ctx(), NewComment::reply("p1", "u2", &root.id, "child", 1))
    .await
    .unwrap();

  let page = comments
    .list_by_parent(&ctx(), &CommentQuery::replies("p1", &root.id))
    .await
    .unwrap();
  assert_eq!(page.items.len(), 1);
  assert_eq!(page.items[0].id, reply.id);
  assert_eq!(page.items[0].depth, 1);

  let roots = comments.list_by_parent(&ctx(), &CommentQuery::roots("p1")).await.unwrap();
  assert_eq!(roots.items.len(), 1);
  assert_eq!(roots.items[0].id, root.id);
  assert_eq!(roots.items[0].children_count, 1);

  assert_indices(&s);
}

#[tokio::test]
async fn children_count_tracks_every_reply() {
  let s = store();
  let comments = s.comments();
  let root = comments.create(&ctx(), NewComment::root("p1", "u1", "root")).await.unwrap();
  for i in 0..5 {
    comments
      .create(&ctx(), NewComment::reply("p1", "u2", &root.id, format!("r{i}"), 1))
      .await
      .unwrap();
  }

  let roots = comments.list_by_parent(&ctx(), &CommentQuery::roots("p1")).await.unwrap();
  assert_eq!(roots.items[0].children_count, 5);
  assert_indices(&s);
}

#[tokio::test]
async fn get_meta_reports_post_and_depth() {
  let comments = store().comments();
  let root = comments.create(&ctx(), NewComment::root("p1", "u1", "root")).await.unwrap();
  let reply = comments
    .create(&ctx(), NewComment::reply("p1", "u1", &root.id, "r", 1))
    .await
    .unwrap();

  let meta = comments.get_meta(&ctx(), &reply.id).await.unwrap().unwrap();
  assert_eq!(meta.post_id, "p1");
  assert_eq!(meta.depth, 1);
  assert!(comments.get_meta(&ctx(), "missing").await.unwrap().is_none());
}

#[tokio::test]
async fn root_listing_ignores_other_posts() {
  let comments = store().comments();
  let mine = comments.create(&ctx(), NewComment::root("p1", "u1", "mine")).await.unwrap();
  comments.create(&ctx(), NewComment::root("p2", "u1", "theirs")).await.unwrap();

  let page = comments.list_by_parent(&ctx(), &CommentQuery::roots("p1")).await.unwrap();
  assert_eq!(page.items.len(), 1);
  assert_eq!(page.items[0].id, mine.id);
}

#[tokio::test]
async fn parent_from_another_post_is_rejected() {
  let s = store();
  let comments = s.comments();
  let root = comments.create(&ctx(), NewComment::root("p1", "u1", "root")).await.unwrap();

  let result = comments
    .create(&ctx(), NewComment::reply("p2", "u1", &root.id, "stray", 1))
    .await;
  assert!(matches!(result, Err(Error::ParentPostMismatch { .. })));

  let roots = comments.list_by_parent(&ctx(), &CommentQuery::roots("p1")).await.unwrap();
  assert_eq!(roots.items[0].children_count, 0);
  assert_indices(&s);
}

#[tokio::test]
async fn reply_to_vanished_parent_is_stored_as_orphan() {
  let s = store();
  let comments = s.comments();
  let orphan = comments
    .create(&ctx(), NewComment::reply("p1", "u1", "expired-parent", "late", 1))
    .await
    .unwrap();

  let page = comments
    .list_by_parent(&ctx(), &CommentQuery::replies("p1", "expired-parent"))
    .await
    .unwrap();
  assert_eq!(page.items.len(), 1);
  assert_eq!(page.items[0].id, orphan.id);
  assert_indices(&s);
}

#[tokio::test]
async fn comment_order_breaks_time_ties_by_id() {
  let s = store();
  let t0 = Utc::now();
  let t1 = t0 + TimeDelta::seconds(1);
  s.with_tables(|t| {
    for (id, at) in [("a", t0), ("b", t1), ("c", t1), ("d", t0)] {
      t.insert_comment(NewComment::root("p1", "u1", id).into_comment(id.into(), at))
        .unwrap();
    }
  });
  let comments = s.comments();

  let newest = comments
    .list_by_parent(&ctx(), &CommentQuery::roots("p1").order(CommentOrder::Newest))
    .await
    .unwrap();
  let ids: Vec<_> = newest.items.iter().map(|c| c.id.as_str()).collect();
  assert_eq!(ids, ["c", "b", "d", "a"]);

  let oldest = comments
    .list_by_parent(&ctx(), &CommentQuery::roots("p1").order(CommentOrder::Oldest))
    .await
    .unwrap();
  let ids: Vec<_> = oldest.items.iter().map(|c| c.id.as_str()).collect();
  assert_eq!(ids, ["a", "d", "b", "c"]);

  // Unspecified order is newest-first.
  let default = comments.list_by_parent(&ctx(), &CommentQuery::roots("p1")).await.unwrap();
  assert_eq!(default.items, newest.items);
}

#[tokio::test]
async fn comment_pages_resume_after_cursor() {
  let s = store();
  let t0 = Utc::now();
  s.with_tables(|t| {
    for i in 0..5 {
      let id = format!("c{i}");
      let at = t0 + TimeDelta::seconds(i);
      t.insert_comment(NewComment::root("p1", "u1", "x").into_comment(id, at)).unwrap();
    }
  });

  let query = CommentQuery::roots("p1").order(CommentOrder::Oldest).first(2);
  let first = s.comments().list_by_parent(&ctx(), &query).await.unwrap();
  assert_eq!(first.next_cursor.as_deref(), Some("c1"));

  let query = query.after("c1");
  let second = s.comments().list_by_parent(&ctx(), &query).await.unwrap();
  let ids: Vec<_> = second.items.iter().map(|c| c.id.as_str()).collect();
  assert_eq!(ids, ["c2", "c3"]);
}

#[tokio::test]
async fn empty_bucket_lists_nothing() {
  let page = store()
    .comments()
    .list_by_parent(&ctx(), &CommentQuery::replies("p1", "nobody"))
    .await
    .unwrap();
  assert!(page.is_empty());
  assert!(page.next_cursor.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_replies_keep_counts_consistent() {
  let s = store();
  let root = s
    .comments()
    .create(&ctx(), NewComment::root("p1", "u1", "root"))
    .await
    .unwrap();

  let mut tasks = Vec::new();
  for i in 0..32 {
    let comments = s.comments();
    let parent = root.id.clone();
    tasks.push(tokio::spawn(async move {
      comments
        .create(&Context::background(), NewComment::reply("p1", "u2", parent, format!("{i}"), 1))
        .await
    }));
  }
  for task in tasks {
    task.await.unwrap().unwrap();
  }

  let roots = s.comments().list_by_parent(&ctx(), &CommentQuery::roots("p1")).await.unwrap();
  assert_eq!(roots.items[0].children_count, 32);
  assert_indices(&s);
}

// ─── Expiry ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn expired_post_cascades_to_its_comments_only() {
  let s = expiring_store();
  let posts = s.posts();
  let comments = s.comments();

  let old = posts.create(&ctx(), post_input("old")).await.unwrap();
  let fresh = posts.create(&ctx(), post_input("fresh")).await.unwrap();
  let root = comments.create(&ctx(), NewComment::root(&old.id, "u1", "a")).await.unwrap();
  comments
    .create(&ctx(), NewComment::reply(&old.id, "u1", &root.id, "b", 1))
    .await
    .unwrap();
  let kept = comments.create(&ctx(), NewComment::root(&fresh.id, "u1", "c")).await.unwrap();

  let past = Utc::now() - TimeDelta::minutes(5);
  s.with_tables(|t| t.post_created.insert(old.id.clone(), past));

  let report = s.prune_now().unwrap();
  assert_eq!(report.posts, 1);
  assert_eq!(report.comments, 2);

  assert!(posts.get_by_id(&ctx(), &old.id).await.unwrap().is_none());
  assert!(comments.get_meta(&ctx(), &root.id).await.unwrap().is_none());
  assert!(comments.get_meta(&ctx(), &kept.id).await.unwrap().is_some());
  let listed = posts.list(&ctx(), 10, None).await.unwrap();
  assert_eq!(listed.items.len(), 1);
  assert_eq!(listed.items[0].id, fresh.id);
  assert_indices(&s);
}

#[tokio::test]
async fn everything_expires_after_ttl() {
  let s = expiring_store();
  s.insert_account(Account::new("alice", "Alice")).unwrap();
  let post = s.posts().create(&ctx(), post_input("t")).await.unwrap();
  s.comments().create(&ctx(), NewComment::root(&post.id, "alice", "x")).await.unwrap();

  let report = s.prune_at(Utc::now() + TimeDelta::seconds(61)).unwrap();
  assert_eq!(report.posts, 1);
  assert_eq!(report.accounts, 1);
  assert_eq!(report.comments, 1);

  let stats = s.with_tables(|t| t.stats());
  assert_eq!(stats, StoreStats::default());
}

#[tokio::test]
async fn account_expiry_leaves_authored_content() {
  let s = expiring_store();
  s.insert_account(Account::new("alice", "Alice")).unwrap();
  let post = s
    .posts()
    .create(&ctx(), CreatePostInput::new("alice", "t", "b"))
    .await
    .unwrap();

  let past = Utc::now() - TimeDelta::minutes(5);
  s.with_tables(|t| t.account_created.insert("alice".into(), past));
  s.prune_now().unwrap();

  assert!(s.accounts().get_by_id(&ctx(), "alice").await.unwrap().is_none());
  let post = s.posts().get_by_id(&ctx(), &post.id).await.unwrap().unwrap();
  assert_eq!(post.author_id, "alice");
}

#[tokio::test]
async fn expired_comment_leaves_younger_replies_in_place() {
  let s = expiring_store();
  let comments = s.comments();
  let root = comments.create(&ctx(), NewComment::root("p1", "u1", "root")).await.unwrap();
  let mid = comments
    .create(&ctx(), NewComment::reply("p1", "u1", &root.id, "mid", 1))
    .await
    .unwrap();
  let leaf = comments
    .create(&ctx(), NewComment::reply("p1", "u1", &mid.id, "leaf", 2))
    .await
    .unwrap();

  let now = Utc::now();
  s.with_tables(|t| {
    if let Some(c) = t.comments.get_mut(&mid.id) {
      c.created_at = now - TimeDelta::seconds(61);
    }
    if let Some(c) = t.comments.get_mut(&leaf.id) {
      c.created_at = now - TimeDelta::seconds(30);
    }
  });
  let report = s.prune_at(now).unwrap();
  assert_eq!(report.comments, 1);

  assert!(comments.get_meta(&ctx(), &mid.id).await.unwrap().is_none());
  let meta = comments.get_meta(&ctx(), &leaf.id).await.unwrap().unwrap();
  assert_eq!(meta.depth, 2);

  // The surviving reply is still listed under its vanished parent.
  let orphans = comments
    .list_by_parent(&ctx(), &CommentQuery::replies("p1", &mid.id))
    .await
    .unwrap();
  assert_eq!(orphans.items.len(), 1);
  assert_eq!(orphans.items[0].id, leaf.id);

  let roots = comments.list_by_parent(&ctx(), &CommentQuery::roots("p1")).await.unwrap();
  assert_eq!(roots.items[0].children_count, 0);
  assert_indices(&s);
}

#[tokio::test]
async fn zero_ttl_disables_pruning() {
  let s = store();
  s.posts().create(&ctx(), post_input("forever")).await.unwrap();
  let report = s.prune_at(Utc::now() + TimeDelta::days(3650)).unwrap();
  assert!(report.is_empty());
  assert_eq!(s.stats().unwrap().posts, 1);
}

#[tokio::test]
async fn sub_second_ttl_still_expires_entities() {
  let s = MemoryStore::with_config(
    &StoreConfig::default()
      .with_ttl(Duration::from_millis(500))
      .with_prune_interval(Duration::from_secs(3600)),
  );
  s.posts().create(&ctx(), post_input("brief")).await.unwrap();

  let report = s.prune_at(Utc::now() + TimeDelta::days(1)).unwrap();
  assert_eq!(report.posts, 1);
  assert_eq!(s.stats().unwrap().posts, 0);
}

#[tokio::test]
async fn lazy_pruning_is_rate_limited() {
  let s = MemoryStore::with_config(
    &StoreConfig::default()
      .with_ttl(Duration::from_secs(60))
      .with_prune_interval(Duration::from_secs(60)),
  );
  let posts = s.posts();
  // The create runs the first lazy pass and stamps `last_prune`.
  let post = posts.create(&ctx(), post_input("t")).await.unwrap();
  let past = Utc::now() - TimeDelta::minutes(5);
  s.with_tables(|t| t.post_created.insert(post.id.clone(), past));

  // Within the interval: no pass, the expired post is still served.
  assert!(posts.get_by_id(&ctx(), &post.id).await.unwrap().is_some());

  // Once the interval has elapsed the next read prunes it.
  s.with_tables(|t| t.last_prune = Some(past));
  assert!(posts.get_by_id(&ctx(), &post.id).await.unwrap().is_none());
}

#[tokio::test]
async fn sweeper_prunes_without_traffic() {
  let s = MemoryStore::with_config(
    &StoreConfig::default()
      .with_ttl(Duration::from_secs(1))
      .with_prune_interval(Duration::from_secs(3600)),
  );
  let post = s.posts().create(&ctx(), post_input("t")).await.unwrap();
  let past = Utc::now() - TimeDelta::minutes(5);
  s.with_tables(|t| t.post_created.insert(post.id.clone(), past));

  let sweeper = s.spawn_sweeper(Duration::from_millis(10));
  tokio::time::sleep(Duration::from_millis(100)).await;
  sweeper.shutdown().await;

  assert_eq!(s.with_tables(|t| t.posts.len()), 0);
}

#[tokio::test]
async fn stats_count_entities_and_buckets() {
  let s = store();
  s.insert_account(Account::new("alice", "Alice")).unwrap();
  let post = s.posts().create(&ctx(), post_input("t")).await.unwrap();
  let root = s.comments().create(&ctx(), NewComment::root(&post.id, "alice", "r")).await.unwrap();
  s.comments()
    .create(&ctx(), NewComment::reply(&post.id, "alice", &root.id, "c", 1))
    .await
    .unwrap();

  let stats = s.stats().unwrap();
  assert_eq!(stats.accounts, 1);
  assert_eq!(stats.posts, 1);
  assert_eq!(stats.comments, 2);
  assert_eq!(stats.post_buckets, 1);
  assert_eq!(stats.parent_buckets, 2);
}
