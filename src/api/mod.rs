//! Client for the external post-search service: the capability that turns a
//! query string into a lazy, newest-first sequence of posts.

pub mod client;
pub mod types;

pub use client::{ApiError, HttpSearchClient, SearchSource};
pub use types::Post;
#[cfg(test)]
pub use types::SearchPage;
