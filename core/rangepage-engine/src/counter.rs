//! Approximate total counting.

use crate::cancel::cancellable;
use crate::error::EngineResult;
use crate::fetcher::PageFetcher;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Walks the whole partition with count-only fetches under the fetcher's
/// pushdown, returning the number of rows that passed it and the fetches issued.
pub async fn count_partition(
    fetcher: &PageFetcher<'_>,
    cancel: &CancellationToken,
) -> EngineResult<(u64, usize)> {
    let mut total = 0u64;
    let mut fetches = 0usize;
    let mut start_after = None;
    loop {
        let page = cancellable(cancel, fetcher.count(start_after.take())).await?;
        fetches += 1;
        total += page.count;
        match page.next {
            Some(next) => start_after = Some(next),
            None => break,
        }
    }
    debug!("Counted {} rows in {} fetches", total, fetches);
    Ok((total, fetches))
}
