//! Bounded multi-fetch query-and-reconcile engine.
//!
//! The store behind a listing can only scan one partition in sort-key order,
//! optionally with a single equality filter. Clients want pages of records
//! that already satisfy richer predicates. [`ListingEngine::list`] bridges the
//! two: it repeatedly fetches native pages, filters them with a
//! [`Predicate`], and either returns a fixed-size page with an opaque cursor
//! ([`ScanMode::Bounded`]) or walks the whole partition and returns every
//! match ([`ScanMode::Exhaustive`]).
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use rangepage_engine::{EngineConfig, ListingEngine, ListingProfile, ListingRequest};
//! # use rangepage_store::{MemoryStore, TableSchema};
//! # use tokio_util::sync::CancellationToken;
//! # async fn demo() -> rangepage_engine::EngineResult<()> {
//! let store = MemoryStore::new(TableSchema::new("productos", "local_id", "producto_id"));
//! let engine = ListingEngine::new(Arc::new(store), EngineConfig::default());
//! let page = engine
//!     .list(
//!         &ListingProfile::products(),
//!         ListingRequest::new("local-1").with_page_size(Some(20)),
//!         &CancellationToken::new(),
//!     )
//!     .await?;
//! println!("{} items, next cursor {:?}", page.items.len(), page.cursor);
//! # Ok(())
//! # }
//! ```

mod cancel;
mod config;
mod counter;
mod cursor;
mod error;
mod fetcher;
mod predicate;
mod profile;
mod reconcile;
mod request;

pub use config::EngineConfig;
pub use counter::count_partition;
pub use cursor::{MAX_CURSOR_TOKEN_LEN, decode_cursor, encode_cursor};
pub use error::{EngineError, EngineResult};
pub use fetcher::{FetchedPage, FetchedRecord, PageFetcher};
pub use predicate::{Predicate, matches_word};
pub use profile::{ListingProfile, ModePolicy};
pub use reconcile::ListingEngine;
pub use request::{ListingPage, ListingRequest, resolve_page_size};

pub use rangepage_types::{ScanMode, StopReason, TotalCount};
