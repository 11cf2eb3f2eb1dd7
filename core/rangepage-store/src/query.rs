//! Query shapes understood by every [`PartitionStore`](crate::PartitionStore).

use rangepage_types::{Item, KeyValue, ResumePoint};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Direction of a scan over the sort key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// A single attribute equality the store evaluates itself.
///
/// Like DynamoDB filter expressions it runs after the page limit: rows it
/// rejects still count as examined and still advance the resume point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equals {
    pub attribute: String,
    pub value: String,
}

impl Equals {
    pub fn new(attribute: &str, value: &str) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn matches(&self, item: &Item) -> bool {
        item.get(&self.attribute).and_then(Value::as_str) == Some(self.value.as_str())
    }
}

/// One bounded range fetch within a partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub partition: KeyValue,
    /// Secondary index to scan instead of the table.
    pub index: Option<String>,
    pub order: SortOrder,
    /// Maximum rows to examine. `None` means the store's own page maximum.
    pub limit: Option<usize>,
    /// Continue right after this position.
    pub start_after: Option<ResumePoint>,
    pub filter: Option<Equals>,
}

impl PageQuery {
    /// A descending, unlimited scan of the partition from its start.
    pub fn new(partition: impl Into<KeyValue>) -> Self {
        Self {
            partition: partition.into(),
            index: None,
            order: SortOrder::Descending,
            limit: None,
            start_after: None,
            filter: None,
        }
    }

    #[must_use]
    pub fn with_index(mut self, index: Option<&str>) -> Self {
        self.index = index.map(str::to_string);
        self
    }

    #[must_use]
    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn with_start_after(mut self, start_after: Option<ResumePoint>) -> Self {
        self.start_after = start_after;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Option<Equals>) -> Self {
        self.filter = filter;
        self
    }
}

/// Result of one [`PageQuery`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPage {
    /// Rows that passed the store-side filter, in scan order.
    pub items: Vec<Item>,
    /// Rows examined, including those the filter rejected.
    pub scanned: usize,
    /// Where the next fetch continues; `None` once the partition is exhausted.
    pub next: Option<ResumePoint>,
}

/// Result of one count-only query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountPage {
    /// Rows that passed the store-side filter.
    pub count: u64,
    pub scanned: u64,
    pub next: Option<ResumePoint>,
}
