use serde::{Deserialize, Serialize};

/// The reconciliation strategy a listing request ran under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Cursor-paginated; at most `max_bounded_fetches` store calls.
    Bounded,
    /// Whole partition scanned, every match returned, no cursor.
    Exhaustive,
}

/// Why the reconciliation loop stopped fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The requested page size was reached.
    PageFilled,
    /// The store reported the end of the partition.
    Exhausted,
    /// The per-request fetch bound was reached before the page filled.
    FetchBound,
    /// The requested page number lies past the last page; nothing was fetched.
    PastLastPage,
}

/// Total count attached to a listing when the caller asked for one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalCount {
    pub total: u64,
    pub total_pages: u64,
    /// True when post-fetch predicates were active and the total only counts
    /// records that passed the store-side filter.
    pub approximate: bool,
}

impl TotalCount {
    /// Builds a total, deriving `total_pages = ceil(total / page_size)`.
    #[must_use]
    pub fn new(total: u64, page_size: usize, approximate: bool) -> Self {
        let page_size = page_size.max(1) as u64;
        Self {
            total,
            total_pages: total.div_ceil(page_size),
            approximate,
        }
    }
}
