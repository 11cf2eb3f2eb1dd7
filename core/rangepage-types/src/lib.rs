//! Core type definitions for rangepage.
//!
//! This crate defines the store-agnostic types shared by the store, the
//! listing engine and the HTTP front end:
//! - [`KeyValue`] and [`ResumePoint`]: key attribute values and scan positions
//! - [`Record`]: a schema-less item seen through a [`FieldLayout`]
//! - [`FilterSet`]: the filter shapes a listing accepts
//! - [`ScanMode`], [`StopReason`], [`TotalCount`]: what a listing reports back

mod filter;
mod key;
mod layout;
mod page;
mod record;

pub use filter::{FilterScope, FilterSet};
pub use key::{KeyComponent, KeyValue, ResumePoint};
pub use layout::{FieldLayout, SubItemLayout};
pub use page::{ScanMode, StopReason, TotalCount};
pub use record::{Item, Record, SubItem};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("missing field: {0}")]
    MissingField(String),

    #[error("invalid key value for {field}: {reason}")]
    InvalidKey { field: String, reason: String },
}
