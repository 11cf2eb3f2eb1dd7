//! Listing request and result types.

use rangepage_types::{FilterSet, KeyValue, Record, ScanMode, StopReason, TotalCount};

/// One client request against a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest {
    /// Partition key; `None` is rejected with `InvalidInput`.
    pub partition: Option<KeyValue>,
    pub filters: FilterSet,
    /// Raw requested page size; out-of-range values fall back to the default.
    pub page_size: Option<i64>,
    pub cursor: Option<String>,
    pub want_total: bool,
    /// Zero-based page number, honoured only without a cursor.
    pub page: Option<u64>,
}

impl ListingRequest {
    pub fn new(partition: impl Into<KeyValue>) -> Self {
        Self {
            partition: Some(partition.into()),
            filters: FilterSet::default(),
            page_size: None,
            cursor: None,
            want_total: false,
            page: None,
        }
    }

    /// A request with no partition key.
    pub fn unpartitioned() -> Self {
        Self {
            partition: None,
            ..Self::new("")
        }
    }

    #[must_use]
    pub fn with_filters(mut self, filters: FilterSet) -> Self {
        self.filters = filters;
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: Option<i64>) -> Self {
        self.page_size = page_size;
        self
    }

    #[must_use]
    pub fn with_cursor(mut self, cursor: Option<String>) -> Self {
        self.cursor = cursor;
        self
    }

    #[must_use]
    pub fn with_total(mut self, want_total: bool) -> Self {
        self.want_total = want_total;
        self
    }

    #[must_use]
    pub fn with_page(mut self, page: Option<u64>) -> Self {
        self.page = page;
        self
    }
}

/// The result of one listing request.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPage {
    pub items: Vec<Record>,
    /// Effective page size, echoed back.
    pub page_size: usize,
    /// Continuation cursor; `None` means nothing follows.
    pub cursor: Option<String>,
    pub mode: ScanMode,
    pub stop: StopReason,
    /// Store fetches issued by the main loop, counting fetches excluded.
    pub fetches: usize,
    pub total: Option<TotalCount>,
    pub page: Option<u64>,
}

/// Accepts a raw page size within `1..=max`, otherwise falls back to
/// `default`, itself kept within the same range.
#[must_use]
pub fn resolve_page_size(raw: Option<i64>, max: usize, default: usize) -> usize {
    let max = max.max(1);
    match raw.and_then(|n| usize::try_from(n).ok()) {
        Some(n) if n >= 1 && n <= max => n,
        _ => default.clamp(1, max),
    }
}
