//! One store call per fetch, read through the listing's field layout.

use crate::error::{EngineError, EngineResult};
use crate::profile::ListingProfile;
use rangepage_store::{CountPage, Equals, PageQuery, PartitionStore, SortOrder};
use rangepage_types::{KeyValue, Record, ResumePoint};
use tracing::{debug, warn};

/// A fetched record and the position a scan resumes from right after it.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedRecord {
    pub record: Record,
    pub position: ResumePoint,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedPage {
    pub records: Vec<FetchedRecord>,
    pub scanned: usize,
    pub next: Option<ResumePoint>,
}

/// Issues descending range fetches over one partition of one listing.
pub struct PageFetcher<'a> {
    store: &'a dyn PartitionStore,
    profile: &'a ListingProfile,
    partition: &'a KeyValue,
    pushdown: Option<Equals>,
}

impl<'a> PageFetcher<'a> {
    pub fn new(
        store: &'a dyn PartitionStore,
        profile: &'a ListingProfile,
        partition: &'a KeyValue,
        pushdown: Option<Equals>,
    ) -> Self {
        Self {
            store,
            profile,
            partition,
            pushdown,
        }
    }

    /// Checks a decoded resume point against this listing and partition,
    /// returning it in the store's component order.
    #[must_use]
    pub fn accept(&self, point: &ResumePoint) -> Option<ResumePoint> {
        let accepted =
            self.store
                .schema()
                .canonicalize(point, self.profile.index.as_deref(), self.partition);
        if accepted.is_none() {
            debug!(
                "Discarding cursor not issued for {} partition {}",
                self.profile.name, self.partition
            );
        }
        accepted
    }

    fn query(&self, start_after: Option<ResumePoint>, limit: Option<usize>) -> PageQuery {
        PageQuery::new(self.partition.clone())
            .with_index(self.profile.index.as_deref())
            .with_order(SortOrder::Descending)
            .with_limit(limit)
            .with_start_after(start_after)
            .with_filter(self.pushdown.clone())
    }

    /// Performs exactly one store query.
    pub async fn fetch(
        &self,
        start_after: Option<ResumePoint>,
        limit: Option<usize>,
    ) -> EngineResult<FetchedPage> {
        let query = self.query(start_after, limit);
        let raw = self.store.query(&query).await.map_err(|e| {
            warn!("Store query failed for {}: {}", self.profile.name, e);
            EngineError::StorageQueryFailed(e.to_string())
        })?;

        let schema = self.store.schema();
        let index = self.profile.index.as_deref();
        let mut records = Vec::with_capacity(raw.items.len());
        for item in raw.items {
            let position = schema
                .position_of(&item, index)
                .map_err(|e| EngineError::MalformedRecord(e.to_string()))?;
            let record = Record::from_item(&self.profile.layout, item)
                .map_err(|e| EngineError::MalformedRecord(e.to_string()))?;
            records.push(FetchedRecord { record, position });
        }

        Ok(FetchedPage {
            records,
            scanned: raw.scanned,
            next: raw.next,
        })
    }

    /// Performs exactly one count-only store query.
    pub async fn count(&self, start_after: Option<ResumePoint>) -> EngineResult<CountPage> {
        let query = self.query(start_after, None);
        self.store.count(&query).await.map_err(|e| {
            warn!("Store count failed for {}: {}", self.profile.name, e);
            EngineError::StorageQueryFailed(e.to_string())
        })
    }
}
