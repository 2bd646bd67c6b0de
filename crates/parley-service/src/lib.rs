//! Service layer between resolvers and the Parley repositories.
//!
//! Repositories store what they are given; this crate decides what is worth
//! storing. It validates user input, resolves the depth of replies, refuses
//! comments on posts that have them disabled, and publishes new comments to
//! live subscribers once they are stored.

pub mod comments;
pub mod error;
pub mod posts;

pub use comments::CommentService;
pub use error::{Error, Result};
pub use posts::PostService;

/// Maximum length of a post title, in characters, after trimming.
pub const MAX_TITLE_LEN: usize = 100;

/// Maximum length of a post or comment body, in characters, after trimming.
pub const MAX_BODY_LEN: usize = 2000;
