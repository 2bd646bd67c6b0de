//! In-memory, TTL-expiring backend for the Parley repositories.
//!
//! A development and testing stand-in for a persistent store. All state lives
//! in one [`MemoryStore`] behind a single reader/writer lock; the three
//! facades ([`MemoryAccountRepo`], [`MemoryPostRepo`], [`MemoryCommentRepo`])
//! are cheap handles onto it. Nothing survives a process restart.

mod accounts;
mod comments;
mod posts;
mod state;
mod store;
mod sweeper;

pub mod config;

pub use accounts::MemoryAccountRepo;
pub use comments::MemoryCommentRepo;
pub use config::StoreConfig;
pub use posts::MemoryPostRepo;
pub use state::{PruneReport, StoreStats};
pub use store::MemoryStore;
pub use sweeper::SweeperHandle;

#[cfg(test)]
mod tests;
