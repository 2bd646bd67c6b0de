//! Cursor pagination primitives shared by every repository backend.
//!
//! A cursor is the identifier of the last item on the previous page. It is
//! opaque to callers and only meaningful to the backend that issued it.
//! [`paginate`] is order-agnostic: callers sort the identifier sequence
//! first (lexicographically, by insertion, or by a composite key) and the
//! primitive only slices it by position.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Page size used when the caller asks for zero or fewer items.
pub const DEFAULT_PAGE_SIZE: usize = 10;

// ─── Identity ────────────────────────────────────────────────────────────────

/// An entity whose identifier doubles as its pagination cursor.
pub trait Identified {
  fn id(&self) -> &str;
}

// ─── Slicing ─────────────────────────────────────────────────────────────────

/// Resolve a requested page size, substituting [`DEFAULT_PAGE_SIZE`] for
/// zero or negative values.
pub fn page_size(first: i32) -> usize {
  usize::try_from(first)
    .ok()
    .filter(|n| *n > 0)
    .unwrap_or(DEFAULT_PAGE_SIZE)
}

/// Return the slice of `ids` that follows `after`, at most `first` long.
///
/// An absent, empty, or unknown cursor starts from the beginning; it is never
/// an error.
pub fn paginate<'a, S: AsRef<str>>(
  ids: &'a [S],
  after: Option<&str>,
  first: i32,
) -> &'a [S] {
  let start = after
    .filter(|cursor| !cursor.is_empty())
    .and_then(|cursor| ids.iter().position(|id| id.as_ref() == cursor))
    .map_or(0, |i| i + 1);
  let end = start.saturating_add(page_size(first)).min(ids.len());
  &ids[start.min(end)..end]
}

/// All keys of `map`, sorted lexicographically.
pub fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<String> {
  let mut keys: Vec<String> = map.keys().cloned().collect();
  keys.sort_unstable();
  keys
}

// ─── Page ────────────────────────────────────────────────────────────────────

/// One page of a repository listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
  pub items:       Vec<T>,
  /// Identifier of the last item, or `None` when the page is empty.
  pub next_cursor: Option<String>,
}

impl<T: Identified> Page<T> {
  pub fn new(items: Vec<T>) -> Self {
    let next_cursor = items.last().map(|item| item.id().to_owned());
    Self { items, next_cursor }
  }
}

impl<T> Page<T> {
  pub fn empty() -> Self { Self { items: Vec::new(), next_cursor: None } }

  pub fn is_empty(&self) -> bool { self.items.is_empty() }

  pub fn len(&self) -> usize { self.items.len() }
}

// ─── Connections ─────────────────────────────────────────────────────────────

/// Forward-pagination metadata for a [`Connection`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
  pub has_next_page: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub end_cursor:    Option<String>,
}

/// A node paired with the cursor that resumes after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge<T> {
  pub cursor: String,
  pub node:   T,
}

/// The nested edge/page-info shape expected by connection-style callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
  pub edges:       Vec<Edge<T>>,
  pub page_info:   PageInfo,
  pub total_count: usize,
}

impl<T> Connection<T> {
  /// An empty connection; the placeholder carried by freshly created posts
  /// and comments.
  pub fn empty() -> Self {
    Self { edges: Vec::new(), page_info: PageInfo::default(), total_count: 0 }
  }
}

impl<T> Default for Connection<T> {
  fn default() -> Self { Self::empty() }
}

impl<T: Identified> From<Page<T>> for Connection<T> {
  fn from(page: Page<T>) -> Self {
    let edges: Vec<Edge<T>> = page
      .items
      .into_iter()
      .map(|node| Edge { cursor: node.id().to_owned(), node })
      .collect();
    Self {
      total_count: edges.len(),
      edges,
      page_info: PageInfo { has_next_page: false, end_cursor: page.next_cursor },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, Clone, PartialEq, Serialize)]
  struct Item(String);

  impl Identified for Item {
    fn id(&self) -> &str { &self.0 }
  }

  fn ids(n: usize) -> Vec<String> { (0..n).map(|i| format!("id-{i:02}")).collect() }

  #[test]
  fn page_size_defaults_for_non_positive_values() {
    assert_eq!(page_size(0), DEFAULT_PAGE_SIZE);
    assert_eq!(page_size(-5), DEFAULT_PAGE_SIZE);
    assert_eq!(page_size(3), 3);
  }

  #[test]
  fn first_page_starts_at_beginning() {
    let all = ids(5);
    assert_eq!(paginate(&all, None, 2), &all[0..2]);
    assert_eq!(paginate(&all, Some(""), 2), &all[0..2]);
  }

  #[test]
  fn unknown_cursor_restarts_from_beginning() {
    let all = ids(5);
    assert_eq!(paginate(&all, Some("missing"), 3), &all[0..3]);
  }

  #[test]
  fn cursor_on_last_item_yields_empty_slice() {
    let all = ids(3);
    assert!(paginate(&all, Some("id-02"), 10).is_empty());
  }

  #[test]
  fn empty_sequence_yields_empty_slice() {
    let none: Vec<String> = Vec::new();
    assert!(paginate(&none, None, 10).is_empty());
  }

  #[test]
  fn walking_cursors_visits_every_id_once_in_order() {
    let all = ids(23);
    let mut seen = Vec::new();
    let mut after: Option<String> = None;
    loop {
      let slice = paginate(&all, after.as_deref(), 4);
      let Some(last) = slice.last() else { break };
      seen.extend_from_slice(slice);
      after = Some(last.clone());
    }
    assert_eq!(seen, all);
  }

  #[test]
  fn page_cursor_is_last_item_id() {
    let page = Page::new(vec![Item("a".into()), Item("b".into())]);
    assert_eq!(page.next_cursor.as_deref(), Some("b"));
    assert!(Page::<Item>::new(Vec::new()).next_cursor.is_none());
  }

  #[test]
  fn sorted_keys_are_lexicographic() {
    let map: HashMap<String, ()> =
      ["b", "c", "a"].into_iter().map(|k| (k.to_string(), ())).collect();
    assert_eq!(sorted_keys(&map), vec!["a", "b", "c"]);
  }

  #[test]
  fn connection_uses_ids_as_cursors() {
    let conn: Connection<Item> =
      Page::new(vec![Item("x".into()), Item("y".into())]).into();
    assert_eq!(conn.total_count, 2);
    assert_eq!(conn.edges[0].cursor, "x");
    assert_eq!(conn.page_info.end_cursor.as_deref(), Some("y"));
    assert!(!conn.page_info.has_next_page);
  }

  #[test]
  fn empty_connection_serialises_without_cursor() {
    let json = serde_json::to_value(Connection::<Item>::empty()).unwrap();
    assert_eq!(
      json,
      serde_json::json!({
        "edges": [],
        "pageInfo": { "hasNextPage": false },
        "totalCount": 0
      })
    );
  }
}
