//! The reconciliation loop: native range fetches in, filtered pages out.

use crate::cancel::cancellable;
use crate::config::EngineConfig;
use crate::counter::count_partition;
use crate::cursor::{decode_cursor, encode_cursor};
use crate::error::{EngineError, EngineResult};
use crate::fetcher::PageFetcher;
use crate::predicate::Predicate;
use crate::profile::ListingProfile;
use crate::request::{ListingPage, ListingRequest, resolve_page_size};
use rangepage_store::PartitionStore;
use rangepage_types::{KeyValue, Record, ResumePoint, ScanMode, StopReason, TotalCount};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Serves listing requests against one store.
///
/// Holds no per-request state; one engine is shared by every request.
#[derive(Clone)]
pub struct ListingEngine {
    store: Arc<dyn PartitionStore>,
    config: EngineConfig,
}

struct Scan {
    items: Vec<Record>,
    cursor: Option<ResumePoint>,
    stop: StopReason,
    fetches: usize,
    scanned: usize,
}

impl ListingEngine {
    pub fn new(store: Arc<dyn PartitionStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// Serves one listing request.
    pub async fn list(
        &self,
        profile: &ListingProfile,
        request: ListingRequest,
        cancel: &CancellationToken,
    ) -> EngineResult<ListingPage> {
        let partition = match request.partition {
            Some(KeyValue::Text(ref s)) if s.is_empty() => None,
            other => other,
        }
        .ok_or_else(|| EngineError::InvalidInput("missing partition key".into()))?;

        let filters = profile.applicable(request.filters);
        let page_size = resolve_page_size(
            request.page_size,
            profile.max_page_size,
            self.config.default_page_size,
        );
        let mode = profile.mode_for(&filters);
        let approximate = profile.needs_post_filter(&filters);
        let fetcher = PageFetcher::new(
            self.store.as_ref(),
            profile,
            &partition,
            profile.pushdown(&filters),
        );
        let predicate = Predicate::new(filters, profile.filter_scope);

        let has_cursor = request
            .cursor
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty());
        let page = request.page.filter(|_| !has_cursor);

        let total = if request.want_total {
            let (count, _) = count_partition(&fetcher, cancel).await?;
            Some(TotalCount::new(count, page_size, approximate))
        } else {
            None
        };

        if let (Some(total), Some(page)) = (total, page)
            && page >= total.total_pages
        {
            debug!(
                "Page {} past last page {} of {}",
                page, total.total_pages, profile.name
            );
            return Ok(ListingPage {
                items: Vec::new(),
                page_size,
                cursor: None,
                mode,
                stop: StopReason::PastLastPage,
                fetches: 0,
                total: Some(total),
                page: Some(page),
            });
        }

        let scan = match mode {
            ScanMode::Bounded => {
                let start = decode_cursor(request.cursor.as_deref())
                    .and_then(|point| fetcher.accept(&point));
                let hint = if approximate {
                    page_size.saturating_mul(self.config.overfetch_factor.max(1))
                } else {
                    page_size
                };
                self.bounded(&fetcher, &predicate, page_size, hint, start, cancel)
                    .await?
            }
            ScanMode::Exhaustive => self.exhaustive(&fetcher, &predicate, cancel).await?,
        };

        info!(
            "Listed {} {} records from partition {} ({:?}, {:?}, {} fetches, {} rows scanned)",
            scan.items.len(),
            profile.name,
            partition,
            mode,
            scan.stop,
            scan.fetches,
            scan.scanned
        );

        Ok(ListingPage {
            items: scan.items,
            page_size,
            cursor: encode_cursor(scan.cursor.as_ref()),
            mode,
            stop: scan.stop,
            fetches: scan.fetches,
            total,
            page,
        })
    }

    async fn bounded(
        &self,
        fetcher: &PageFetcher<'_>,
        predicate: &Predicate,
        page_size: usize,
        hint: usize,
        start: Option<ResumePoint>,
        cancel: &CancellationToken,
    ) -> EngineResult<Scan> {
        let max_fetches = self.config.max_bounded_fetches.max(1);

        let mut items = Vec::with_capacity(page_size);
        let mut start_after = start;
        let mut fetches = 0;
        let mut scanned = 0;

        loop {
            if fetches >= max_fetches {
                debug!(
                    "Fetch bound {} reached with {} matches after {} rows",
                    max_fetches,
                    items.len(),
                    scanned
                );
                return Ok(Scan {
                    items,
                    cursor: start_after,
                    stop: StopReason::FetchBound,
                    fetches,
                    scanned,
                });
            }

            let page = cancellable(cancel, fetcher.fetch(start_after.take(), Some(hint))).await?;
            fetches += 1;
            scanned += page.scanned;

            let remaining = page.records.len();
            for (i, fetched) in page.records.into_iter().enumerate() {
                let Some(record) = predicate.apply(fetched.record) else {
                    continue;
                };
                items.push(record);
                if items.len() == page_size {
                    let cursor = if i + 1 == remaining {
                        page.next
                    } else {
                        Some(fetched.position)
                    };
                    return Ok(Scan {
                        items,
                        cursor,
                        stop: StopReason::PageFilled,
                        fetches,
                        scanned,
                    });
                }
            }

            match page.next {
                Some(next) => start_after = Some(next),
                None => {
                    return Ok(Scan {
                        items,
                        cursor: None,
                        stop: StopReason::Exhausted,
                        fetches,
                        scanned,
                    });
                }
            }
        }
    }

    async fn exhaustive(
        &self,
        fetcher: &PageFetcher<'_>,
        predicate: &Predicate,
        cancel: &CancellationToken,
    ) -> EngineResult<Scan> {
        let mut items = Vec::new();
        let mut start_after = None;
        let mut fetches = 0;
        let mut scanned = 0;

        loop {
            let page = cancellable(cancel, fetcher.fetch(start_after.take(), None)).await?;
            fetches += 1;
            scanned += page.scanned;
            items.extend(
                page.records
                    .into_iter()
                    .filter_map(|fetched| predicate.apply(fetched.record)),
            );
            match page.next {
                Some(next) => start_after = Some(next),
                None => break,
            }
        }

        items.sort_by(|a, b| b.sort_key.cmp(&a.sort_key));
        Ok(Scan {
            items,
            cursor: None,
            stop: StopReason::Exhausted,
            fetches,
            scanned,
        })
    }
}
