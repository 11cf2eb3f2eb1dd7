//! In-memory ordered store.

use crate::error::{StoreError, StoreResult};
use crate::query::{CountPage, PageQuery, RawPage, SortOrder};
use crate::schema::TableSchema;
use crate::{DEFAULT_MAX_PAGE_ITEMS, PartitionStore};
use async_trait::async_trait;
use rangepage_types::{Item, KeyValue, ResumePoint};
use std::collections::BTreeMap;
use std::sync::RwLock;
use tracing::debug;

/// Items kept in a map keyed by table primary key.
pub struct MemoryStore {
    schema: TableSchema,
    max_page_items: usize,
    items: RwLock<BTreeMap<(KeyValue, KeyValue), Item>>,
}

/// Rows examined by one scan step.
struct Slice {
    rows: Vec<Item>,
    next: Option<ResumePoint>,
}

impl MemoryStore {
    /// Creates an empty store for the given table.
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            max_page_items: DEFAULT_MAX_PAGE_ITEMS,
            items: RwLock::new(BTreeMap::new()),
        }
    }

    /// Caps the rows a single fetch may examine.
    #[must_use]
    pub fn with_max_page_items(mut self, max: usize) -> Self {
        self.max_page_items = max.max(1);
        self
    }

    /// Inserts or replaces an item by its table primary key.
    pub fn put(&self, item: Item) -> StoreResult<()> {
        let key = self.schema.primary_key_of(&item)?;
        let mut items = self
            .items
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))?;
        items.insert(key, item);
        Ok(())
    }

    /// Inserts every item, stopping at the first invalid one.
    pub fn put_all(&self, items: impl IntoIterator<Item = Item>) -> StoreResult<usize> {
        let mut written = 0;
        for item in items {
            self.put(item)?;
            written += 1;
        }
        Ok(written)
    }

    /// Number of items across all partitions.
    pub fn len(&self) -> usize {
        self.items.read().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn scan(&self, query: &PageQuery) -> StoreResult<Slice> {
        let index = query.index.as_deref();
        let keys = self.schema.key_attributes(index)?;
        let start = query
            .start_after
            .as_ref()
            .map(|point| self.schema.scan_key_of_point(point, index))
            .transpose()?;

        let items = self
            .items
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))?;

        let mut rows: Vec<(Vec<KeyValue>, &Item)> = items
            .values()
            .filter(|item| {
                item.get(keys.partition).and_then(KeyValue::from_json).as_ref()
                    == Some(&query.partition)
            })
            .filter_map(|item| self.schema.scan_key_of_item(item, index).map(|k| (k, item)))
            .collect();

        rows.sort_by(|a, b| a.0.cmp(&b.0));
        if query.order == SortOrder::Descending {
            rows.reverse();
        }
        if let Some(start) = &start {
            rows.retain(|(key, _)| match query.order {
                SortOrder::Ascending => key > start,
                SortOrder::Descending => key < start,
            });
        }

        let limit = query
            .limit
            .unwrap_or(self.max_page_items)
            .clamp(1, self.max_page_items);
        let has_more = rows.len() > limit;
        let rows: Vec<Item> = rows.into_iter().take(limit).map(|(_, i)| i.clone()).collect();

        let next = match rows.last() {
            Some(last) if has_more => Some(self.schema.position_of(last, index)?),
            _ => None,
        };
        Ok(Slice { rows, next })
    }
}

#[async_trait]
impl PartitionStore for MemoryStore {
    fn schema(&self) -> &TableSchema {
        &self.schema
    }

    async fn query(&self, query: &PageQuery) -> StoreResult<RawPage> {
        let slice = self.scan(query)?;
        let scanned = slice.rows.len();
        let items: Vec<Item> = match &query.filter {
            Some(filter) => slice.rows.into_iter().filter(|i| filter.matches(i)).collect(),
            None => slice.rows,
        };
        debug!(
            "memory query on {} partition {}: {} of {} rows kept, more={}",
            self.schema.name,
            query.partition,
            items.len(),
            scanned,
            slice.next.is_some()
        );
        Ok(RawPage {
            items,
            scanned,
            next: slice.next,
        })
    }

    async fn count(&self, query: &PageQuery) -> StoreResult<CountPage> {
        let slice = self.scan(query)?;
        let count = match &query.filter {
            Some(filter) => slice.rows.iter().filter(|i| filter.matches(i)).count(),
            None => slice.rows.len(),
        };
        Ok(CountPage {
            count: count as u64,
            scanned: slice.rows.len() as u64,
            next: slice.next,
        })
    }
}
