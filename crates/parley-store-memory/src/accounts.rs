//! Account facade.

use chrono::Utc;
use parley_core::{
  Context, Error, Result,
  account::Account,
  page::{Page, paginate, sorted_keys},
  repository::AccountRepo,
};
use tracing::error;

use crate::MemoryStore;

/// [`AccountRepo`] over a shared [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryAccountRepo {
  store: MemoryStore,
}

impl MemoryAccountRepo {
  pub fn new(store: MemoryStore) -> Self { Self { store } }
}

impl AccountRepo for MemoryAccountRepo {
  async fn get_by_id(&self, ctx: &Context, id: &str) -> Result<Option<Account>> {
    ctx.check()?;
    if id.is_empty() {
      error!("account lookup rejected: empty id");
      return Err(Error::EmptyId);
    }

    let tables = self.store.read_at(Utc::now())?;
    Ok(tables.accounts.get(id).cloned())
  }

  async fn list(
    &self,
    ctx:   &Context,
    first: i32,
    after: Option<&str>,
  ) -> Result<Page<Account>> {
    ctx.check()?;

    let tables = self.store.read_at(Utc::now())?;
    // No insertion-order index for accounts; list them by identifier.
    let ids = sorted_keys(&tables.accounts);
    let accounts = paginate(&ids, after, first)
      .iter()
      .filter_map(|id| tables.accounts.get(id).cloned())
      .collect();
    Ok(Page::new(accounts))
  }

  async fn create(&self, ctx: &Context, account: Account) -> Result<Account> {
    ctx.check()?;
    self.store.insert_account(account).inspect_err(|e| {
      error!(error = %e, "account creation failed");
    })
  }
}
