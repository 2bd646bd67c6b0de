//! The tables behind a [`MemoryStore`](crate::MemoryStore) and the routines
//! that keep them consistent.
//!
//! Everything here runs with the store's write lock held (or read lock, for
//! the read-only helpers). The secondary indices are derived data: every
//! comment identifier sits in exactly one `by_parent` bucket and exactly one
//! `by_post` bucket, and removing a comment removes it from both.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use parley_core::{
  EntityKind, Error, Result, account::Account, comment::Comment, post::Post,
};

// ─── Reports ─────────────────────────────────────────────────────────────────

/// How many entities one prune pass removed, cascades included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
  pub posts:    usize,
  pub accounts: usize,
  pub comments: usize,
}

impl PruneReport {
  pub fn is_empty(&self) -> bool { self.total() == 0 }

  pub fn total(&self) -> usize { self.posts + self.accounts + self.comments }
}

/// A point-in-time census of the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
  pub accounts:       usize,
  pub posts:          usize,
  pub comments:       usize,
  /// Number of non-empty `post → comments` buckets.
  pub post_buckets:   usize,
  /// Number of non-empty `parent → children` buckets, roots included.
  pub parent_buckets: usize,
}

// ─── Tables ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub(crate) struct Tables {
  pub accounts:        HashMap<String, Account>,
  pub account_created: HashMap<String, DateTime<Utc>>,
  pub posts:           HashMap<String, Post>,
  pub post_created:    HashMap<String, DateTime<Utc>>,
  /// Post identifiers in creation order.
  pub post_order:      Vec<String>,
  /// Comments carry their own `created_at`, so they need no side table.
  pub comments:        HashMap<String, Comment>,
  pub by_post:         HashMap<String, Vec<String>>,
  /// Keyed by parent comment identifier; `""` holds root comments.
  pub by_parent:       HashMap<String, Vec<String>>,
  pub last_prune:      Option<DateTime<Utc>>,
}

impl Tables {
  // ── Inserts ───────────────────────────────────────────────────────────────

  pub fn insert_account(
    &mut self,
    account: Account,
    now: DateTime<Utc>,
  ) -> Result<()> {
    if self.accounts.contains_key(&account.id) {
      return Err(Error::AlreadyExists { kind: EntityKind::Account, id: account.id });
    }
    self.account_created.insert(account.id.clone(), now);
    self.accounts.insert(account.id.clone(), account);
    Ok(())
  }

  pub fn insert_post(&mut self, post: Post, now: DateTime<Utc>) -> Result<()> {
    if self.posts.contains_key(&post.id) {
      return Err(Error::AlreadyExists { kind: EntityKind::Post, id: post.id });
    }
    self.post_created.insert(post.id.clone(), now);
    self.post_order.push(post.id.clone());
    self.posts.insert(post.id.clone(), post);
    Ok(())
  }

  /// Register a comment under both indices and bump its parent's counter.
  ///
  /// A parent on a different post is rejected. A parent that no longer
  /// exists is not: the comment is stored as an orphan.
  pub fn insert_comment(&mut self, comment: Comment) -> Result<()> {
    if self.comments.contains_key(&comment.id) {
      return Err(Error::AlreadyExists {
        kind: EntityKind::Comment,
        id:   comment.id,
      });
    }
    if let Some(parent_id) = &comment.parent_id
      && let Some(parent) = self.comments.get(parent_id)
      && parent.post_id != comment.post_id
    {
      return Err(Error::ParentPostMismatch {
        parent_id:      parent_id.clone(),
        parent_post_id: parent.post_id.clone(),
        post_id:        comment.post_id,
      });
    }

    self
      .by_post
      .entry(comment.post_id.clone())
      .or_default()
      .push(comment.id.clone());
    self
      .by_parent
      .entry(comment.parent_key().to_owned())
      .or_default()
      .push(comment.id.clone());
    if let Some(parent_id) = &comment.parent_id
      && let Some(parent) = self.comments.get_mut(parent_id)
    {
      parent.children_count += 1;
    }

    self.comments.insert(comment.id.clone(), comment);
    Ok(())
  }

  // ── Deletes ───────────────────────────────────────────────────────────────

  /// Remove a single comment from the primary map and both indices, and
  /// decrement its parent's counter. Returns `false` if it was already gone.
  pub fn delete_comment(&mut self, id: &str) -> bool {
    let Some(comment) = self.comments.remove(id) else {
      return false;
    };
    remove_from_bucket(&mut self.by_parent, comment.parent_key(), id);
    remove_from_bucket(&mut self.by_post, &comment.post_id, id);
    if let Some(parent_id) = &comment.parent_id
      && let Some(parent) = self.comments.get_mut(parent_id)
    {
      parent.children_count = parent.children_count.saturating_sub(1);
    }
    true
  }

  /// Remove a post and, unconditionally, every comment indexed under it.
  /// Returns the number of comments removed.
  pub fn delete_post(&mut self, id: &str) -> usize {
    self.posts.remove(id);
    self.post_created.remove(id);
    self.post_order.retain(|pid| pid != id);
    let comment_ids = self.by_post.remove(id).unwrap_or_default();
    comment_ids.iter().filter(|cid| self.delete_comment(cid)).count()
  }

  // ── Expiry ────────────────────────────────────────────────────────────────

  /// Run a prune pass unless expiry is disabled or the last pass happened
  /// less than `interval` ago.
  pub fn maybe_prune(
    &mut self,
    now: DateTime<Utc>,
    ttl: Option<TimeDelta>,
    interval: TimeDelta,
  ) -> Option<PruneReport> {
    let ttl = ttl?;
    if let Some(last) = self.last_prune
      && now.signed_duration_since(last) < interval
    {
      return None;
    }
    Some(self.prune(now, ttl))
  }

  /// Remove everything older than `ttl`: posts (cascading to their comments),
  /// accounts (no cascade), then any remaining expired comments one by one.
  /// Replies younger than `ttl` outlive an expired parent as orphans.
  pub fn prune(&mut self, now: DateTime<Utc>, ttl: TimeDelta) -> PruneReport {
    self.last_prune = Some(now);
    let expired = |created: &DateTime<Utc>| now.signed_duration_since(*created) > ttl;
    let mut report = PruneReport::default();

    let posts: Vec<String> = self
      .post_created
      .iter()
      .filter(|&(_, created)| expired(created))
      .map(|(id, _)| id.clone())
      .collect();
    for id in posts {
      report.comments += self.delete_post(&id);
      report.posts += 1;
    }

    let accounts: Vec<String> = self
      .account_created
      .iter()
      .filter(|&(_, created)| expired(created))
      .map(|(id, _)| id.clone())
      .collect();
    for id in accounts {
      self.accounts.remove(&id);
      self.account_created.remove(&id);
      report.accounts += 1;
    }

    let comments: Vec<String> = self
      .comments
      .values()
      .filter(|c| expired(&c.created_at))
      .map(|c| c.id.clone())
      .collect();
    for id in comments {
      if self.delete_comment(&id) {
        report.comments += 1;
      }
    }

    report
  }

  // ── Introspection ─────────────────────────────────────────────────────────

  pub fn stats(&self) -> StoreStats {
    StoreStats {
      accounts:       self.accounts.len(),
      posts:          self.posts.len(),
      comments:       self.comments.len(),
      post_buckets:   self.by_post.len(),
      parent_buckets: self.by_parent.len(),
    }
  }

  /// Verify the cross-index invariants, describing the first violation.
  #[cfg(test)]
  pub fn check_indices(&self) -> std::result::Result<(), String> {
    for (id, comment) in &self.comments {
      let parents: Vec<&String> = self
        .by_parent
        .iter()
        .filter(|(_, ids)| ids.contains(id))
        .map(|(key, _)| key)
        .collect();
      if parents != [comment.parent_key()] {
        return Err(format!("comment {id} is in parent buckets {parents:?}"));
      }
      let posts: Vec<&String> = self
        .by_post
        .iter()
        .filter(|(_, ids)| ids.contains(id))
        .map(|(key, _)| key)
        .collect();
      if posts != [&comment.post_id] {
        return Err(format!("comment {id} is in post buckets {posts:?}"));
      }
      let live_children = self
        .comments
        .values()
        .filter(|c| c.parent_id.as_deref() == Some(id.as_str()))
        .count();
      if live_children != comment.children_count as usize {
        return Err(format!(
          "comment {id} counts {} children but has {live_children}",
          comment.children_count
        ));
      }
    }
    for (kind, index) in [("post", &self.by_post), ("parent", &self.by_parent)] {
      for (key, ids) in index {
        if ids.is_empty() {
          return Err(format!("empty {kind} bucket {key:?} was not released"));
        }
        if let Some(stale) = ids.iter().find(|id| !self.comments.contains_key(*id)) {
          return Err(format!("{kind} bucket {key:?} holds stale id {stale}"));
        }
      }
    }
    if self.post_order.len() != self.posts.len()
      || self.post_order.iter().any(|id| !self.posts.contains_key(id))
    {
      return Err("post order does not match stored posts".to_string());
    }
    Ok(())
  }
}

/// Drop `id` from the bucket at `key`, releasing the bucket once empty.
fn remove_from_bucket(index: &mut HashMap<String, Vec<String>>, key: &str, id: &str) {
  if let Some(bucket) = index.get_mut(key) {
    bucket.retain(|cid| cid != id);
    if bucket.is_empty() {
      index.remove(key);
    }
  }
}
