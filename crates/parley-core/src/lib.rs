//! Core types and repository contracts for the Parley discussion store.
//!
//! This crate has no storage or async runtime dependencies.
//! Backends implement the traits in [`repository`]; the service layer and
//! any resolver above it depend on those traits, never on a concrete store.

pub mod account;
pub mod comment;
pub mod context;
pub mod error;
pub mod page;
pub mod post;
pub mod repository;

pub use context::Context;
pub use error::{EntityKind, Error, Result};
