//! Tag-based query cache.
//!
//! Queries are cached per key and labelled with [`Tag`]s. Mutations invalidate
//! tags: every entry carrying one of them becomes stale, and entries that have
//! live subscribers are re-fetched in the background exactly once per
//! invalidation. Nothing is ever patched in place.

mod cache;
mod state;
mod tag;

pub use cache::{BoxFetch, Fetcher, QueryCache, QuerySubscription};
pub use state::QueryState;
pub use tag::Tag;
