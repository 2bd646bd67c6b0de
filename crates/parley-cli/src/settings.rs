//! Binary configuration, layered from a TOML file and `PARLEY_*` variables.

use std::path::Path;

use anyhow::Context as _;
use parley_core::page::DEFAULT_PAGE_SIZE;
use parley_store_memory::StoreConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  pub store:     StoreConfig,
  /// Items per page when printing snapshots.
  pub page_size: i32,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      store:     StoreConfig::default(),
      page_size: i32::try_from(DEFAULT_PAGE_SIZE).unwrap_or(10),
    }
  }
}

impl AppConfig {
  /// Load from `path` (optional) then the environment. Nested keys use a
  /// double underscore, e.g. `PARLEY_STORE__TTL_SECS=3600`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("PARLEY").separator("__"))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise AppConfig")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_falls_back_to_defaults() {
    let cfg = AppConfig::load(Path::new("does-not-exist.toml")).unwrap();
    assert_eq!(cfg.store, StoreConfig::default());
    assert_eq!(cfg.page_size, 10);
  }
}
