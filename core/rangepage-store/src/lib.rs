//! Ordered partition stores for rangepage.
//!
//! A store holds schema-less items grouped by a partition key and ordered by
//! a sort key. It answers exactly one kind of question: "give me the next
//! page of this partition, in this order, after this position", optionally
//! with a single attribute equality evaluated during the scan.
//!
//! # Backends
//!
//! - [`MemoryStore`]: a `BTreeMap` behind a lock, for tests and demos
//! - [`SqliteStore`]: items as JSON bodies in SQLite, keys read with `json_extract`
//!
//! Both paginate the same way: a page examines at most `limit` rows (capped by
//! the store's own maximum), the equality filter runs on the examined rows,
//! and `next` is `None` exactly when no row remains after the page.

mod error;
mod memory;
mod query;
mod schema;
mod sqlite;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use query::{CountPage, Equals, PageQuery, RawPage, SortOrder};
pub use schema::{IndexSchema, KeyAttributes, TableSchema};
pub use sqlite::SqliteStore;

use async_trait::async_trait;

/// Default ceiling on rows examined by one fetch.
pub const DEFAULT_MAX_PAGE_ITEMS: usize = 1000;

/// Abstract ordered range store.
///
/// Implementations are shared across concurrent requests and hold no
/// per-request state.
#[async_trait]
pub trait PartitionStore: Send + Sync {
    /// Key layout of the table this store serves.
    fn schema(&self) -> &TableSchema;

    /// Performs one bounded range fetch.
    async fn query(&self, query: &PageQuery) -> StoreResult<RawPage>;

    /// Performs one count-only fetch with the same paging rules as [`query`](Self::query).
    async fn count(&self, query: &PageQuery) -> StoreResult<CountPage>;
}
