//! Account — the author of posts and comments.

use serde::{Deserialize, Serialize};

use crate::page::Identified;

/// A registered author. Immutable once stored.
///
/// Posts and comments refer to accounts by identifier only. An account can
/// expire independently of the content it wrote, so an author lookup may
/// legitimately come back empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
  pub id:       String,
  /// Display name.
  pub username: String,
}

impl Account {
  pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
    Self { id: id.into(), username: username.into() }
  }
}

impl Identified for Account {
  fn id(&self) -> &str { &self.id }
}
