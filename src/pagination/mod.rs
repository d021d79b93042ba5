//! Pagination strategies for the Transfer API.
//!
//! Two shapes are used:
//!
//! - **Offset/limit** for the task list and event lists. The response reports the
//!   offset and limit the service actually honoured, which may be clamped.
//! - **Marker** for the successful-transfers and skipped-errors sub-resources, which
//!   can grow while a recursive task runs. The marker is an opaque cursor; a page
//!   without `next_marker` is the last one.

use crate::errors::{TransferResult, ValidationError};
use futures::stream::{self, Stream};
use std::collections::VecDeque;
use std::future::Future;
use tracing::warn;

/// Default page size for offset/limit listings.
pub const DEFAULT_LIMIT: u32 = 10;

/// Marker of the first page.
pub const FIRST_MARKER: u64 = 0;

/// Offset/limit parameters of one page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetParams {
    /// Zero-based offset.
    pub offset: u32,
    /// Page size, at least 1.
    pub limit: u32,
}

impl Default for OffsetParams {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl OffsetParams {
    /// Creates parameters for an explicit offset.
    pub fn new(offset: u32, limit: u32) -> Result<Self, ValidationError> {
        Self::resolve(Some(offset), None, limit)
    }

    /// Creates parameters for a one-based page number. Page 0 is treated as page 1.
    ///
    /// ```
    /// use integrations_globus_transfer::pagination::OffsetParams;
    ///
    /// assert_eq!(OffsetParams::from_page(3, 20).unwrap().offset, 40);
    /// ```
    pub fn from_page(page: u32, limit: u32) -> Result<Self, ValidationError> {
        Self::resolve(None, Some(page), limit)
    }

    /// Resolves caller-facing selection inputs into parameters.
    ///
    /// Offset and page are mutually exclusive; with neither, the first page is used.
    pub fn resolve(
        offset: Option<u32>,
        page: Option<u32>,
        limit: u32,
    ) -> Result<Self, ValidationError> {
        if limit < 1 {
            return Err(ValidationError::InvalidLimit(limit));
        }

        let offset = match (offset, page) {
            (Some(_), Some(_)) => return Err(ValidationError::ConflictingPageSelection),
            (Some(offset), None) => offset,
            (None, Some(page)) => page.max(1).saturating_sub(1).saturating_mul(limit),
            (None, None) => 0,
        };

        Ok(Self { offset, limit })
    }

    /// Parameters for the page following this one.
    pub fn next(&self) -> Self {
        Self {
            offset: self.offset.saturating_add(self.limit),
            limit: self.limit,
        }
    }

    pub(crate) fn query(&self) -> [(&'static str, String); 2] {
        [
            ("offset", self.offset.to_string()),
            ("limit", self.limit.to_string()),
        ]
    }
}

/// One page of an offset/limit listing.
#[derive(Debug, Clone)]
pub struct OffsetPage<T> {
    /// Items in this page.
    pub items: Vec<T>,
    /// Offset the service honoured.
    pub offset: u64,
    /// Limit the service honoured.
    pub limit: u64,
    /// Total size of the collection.
    pub total: u64,
}

impl<T> OffsetPage<T> {
    /// Creates a new page.
    pub fn new(items: Vec<T>, offset: u64, limit: u64, total: u64) -> Self {
        Self {
            items,
            offset,
            limit,
            total,
        }
    }

    /// Returns true if items remain past this page.
    pub fn has_more(&self) -> bool {
        !self.items.is_empty() && self.offset.saturating_add(self.items.len() as u64) < self.total
    }

    /// Returns true if the service honoured a smaller limit than requested.
    pub fn was_clamped(&self, requested: &OffsetParams) -> bool {
        self.limit < u64::from(requested.limit)
    }

    /// Returns the number of items in this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if this page is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One page of a marker listing.
#[derive(Debug, Clone)]
pub struct MarkerPage<T> {
    /// Items in this page.
    pub items: Vec<T>,
    /// Marker this page was fetched with.
    pub marker: u64,
    /// Marker of the next page; `None` on the last page.
    pub next_marker: Option<u64>,
}

impl<T> MarkerPage<T> {
    /// Creates a new page.
    pub fn new(items: Vec<T>, marker: u64, next_marker: Option<u64>) -> Self {
        Self {
            items,
            marker,
            next_marker,
        }
    }

    /// Returns true if there is a next page.
    pub fn has_next(&self) -> bool {
        self.next_marker.is_some()
    }

    /// Returns the number of items in this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if this page is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Iterator over all pages of a marker listing.
///
/// Starts at [`FIRST_MARKER`] and stops after the first page without `next_marker`;
/// no request is made past that page. A page whose `next_marker` repeats the marker it
/// was fetched with also ends the iteration.
pub struct MarkerPageIterator<T, F, Fut>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = TransferResult<MarkerPage<T>>>,
{
    fetch_fn: F,
    next_marker: u64,
    done: bool,
}

impl<T, F, Fut> MarkerPageIterator<T, F, Fut>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = TransferResult<MarkerPage<T>>>,
{
    /// Creates a new page iterator.
    pub fn new(fetch_fn: F) -> Self {
        Self {
            fetch_fn,
            next_marker: FIRST_MARKER,
            done: false,
        }
    }

    /// Fetches the next page, or `None` once the last page was returned.
    pub async fn next_page(&mut self) -> TransferResult<Option<MarkerPage<T>>> {
        if self.done {
            return Ok(None);
        }

        let page = (self.fetch_fn)(self.next_marker).await?;

        match page.next_marker {
            Some(next) if next == self.next_marker => {
                warn!(marker = next, "Marker did not advance; stopping iteration");
                self.done = true;
            }
            Some(next) => self.next_marker = next,
            None => self.done = true,
        }

        Ok(Some(page))
    }

    /// Collects all remaining items from all pages.
    pub async fn collect_all(&mut self) -> TransferResult<Vec<T>> {
        let mut all_items = Vec::new();

        while let Some(page) = self.next_page().await? {
            all_items.extend(page.items);
        }

        Ok(all_items)
    }

    /// Returns true if there are more pages to fetch.
    pub fn has_next(&self) -> bool {
        !self.done
    }

    /// Turns the iterator into a stream of individual items.
    ///
    /// The stream ends after the first error.
    pub fn into_stream(self) -> impl Stream<Item = TransferResult<T>> {
        stream::unfold(
            (self, VecDeque::new(), false),
            |(mut pages, mut buffer, failed)| async move {
                if failed {
                    return None;
                }
                loop {
                    if let Some(item) = buffer.pop_front() {
                        return Some((Ok(item), (pages, buffer, false)));
                    }
                    match pages.next_page().await {
                        Ok(Some(page)) => buffer.extend(page.items),
                        Ok(None) => return None,
                        Err(e) => return Some((Err(e), (pages, buffer, true))),
                    }
                }
            },
        )
    }
}

/// Iterator over all pages of an offset/limit listing.
///
/// Stops once `offset + len` reaches the reported total, an empty page comes back, or the
/// honoured offset stops advancing. Follows the offset the service honoured, so clamped
/// limits do not skip items.
pub struct OffsetPageIterator<T, F, Fut>
where
    F: FnMut(OffsetParams) -> Fut,
    Fut: Future<Output = TransferResult<OffsetPage<T>>>,
{
    fetch_fn: F,
    params: OffsetParams,
    done: bool,
}

impl<T, F, Fut> OffsetPageIterator<T, F, Fut>
where
    F: FnMut(OffsetParams) -> Fut,
    Fut: Future<Output = TransferResult<OffsetPage<T>>>,
{
    /// Creates a new page iterator starting at `params`.
    pub fn new(params: OffsetParams, fetch_fn: F) -> Self {
        Self {
            fetch_fn,
            params,
            done: false,
        }
    }

    /// Fetches the next page, or `None` once the listing is exhausted.
    pub async fn next_page(&mut self) -> TransferResult<Option<OffsetPage<T>>> {
        if self.done {
            return Ok(None);
        }

        let page = (self.fetch_fn)(self.params).await?;

        let honoured = u32::try_from(page.offset.saturating_add(page.items.len() as u64))
            .unwrap_or(u32::MAX);

        if page.has_more() && honoured > self.params.offset {
            self.params = OffsetParams {
                offset: honoured,
                limit: self.params.limit,
            };
        } else {
            self.done = true;
        }

        Ok(Some(page))
    }

    /// Collects all remaining items from all pages.
    pub async fn collect_all(&mut self) -> TransferResult<Vec<T>> {
        let mut all_items = Vec::new();

        while let Some(page) = self.next_page().await? {
            all_items.extend(page.items);
        }

        Ok(all_items)
    }

    /// Returns true if there are more pages to fetch.
    pub fn has_next(&self) -> bool {
        !self.done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_page_to_offset() {
        assert_eq!(OffsetParams::from_page(1, 50).unwrap().offset, 0);
        assert_eq!(OffsetParams::from_page(3, 20).unwrap().offset, 40);
        assert_eq!(OffsetParams::from_page(0, 20).unwrap().offset, 0);
    }

    #[test]
    fn test_resolve_rejects_invalid_input() {
        assert_eq!(
            OffsetParams::resolve(Some(0), Some(1), 10),
            Err(ValidationError::ConflictingPageSelection)
        );
        assert_eq!(
            OffsetParams::new(0, 0),
            Err(ValidationError::InvalidLimit(0))
        );
        assert_eq!(
            OffsetParams::resolve(None, None, 25).unwrap(),
            OffsetParams { offset: 0, limit: 25 }
        );
    }

    #[test]
    fn test_offset_page_has_more() {
        assert!(OffsetPage::new(vec![1, 2], 0, 2, 5).has_more());
        assert!(!OffsetPage::new(vec![5], 4, 2, 5).has_more());
        assert!(!OffsetPage::<i32>::new(vec![], 0, 2, 5).has_more());
        assert!(!OffsetPage::new(vec![1], u64::MAX, 2, u64::MAX).has_more());
    }

    #[test]
    fn test_clamped_limit_detected() {
        let requested = OffsetParams::new(0, 1000).unwrap();
        let page = OffsetPage::new(vec![1], 0, 100, 500);
        assert!(page.was_clamped(&requested));
    }

    #[test]
    fn test_marker_iterator_stops_without_next_marker() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let fetch_fn = move |marker: u64| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                Ok(match marker {
                    0 => MarkerPage::new(vec![1, 2], 0, Some(17)),
                    17 => MarkerPage::new(vec![3], 17, None),
                    other => panic!("unexpected marker {}", other),
                })
            }
        };

        let items = tokio_test::block_on(async {
            let mut iterator = MarkerPageIterator::new(fetch_fn);
            let items = iterator.collect_all().await.unwrap();
            assert!(!iterator.has_next());
            assert!(iterator.next_page().await.unwrap().is_none());
            items
        });

        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_marker_iterator_stops_on_repeated_marker() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let fetch_fn = move |marker: u64| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                Ok(match marker {
                    0 => MarkerPage::new(vec![1], 0, Some(4)),
                    _ => MarkerPage::new(vec![2], 4, Some(4)),
                })
            }
        };

        let mut iterator = MarkerPageIterator::new(fetch_fn);
        let items = iterator.collect_all().await.unwrap();

        assert_eq!(items, vec![1, 2]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!iterator.has_next());
    }

    #[tokio::test]
    async fn test_offset_iterator_stops_when_offset_does_not_advance() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        // Ignores the requested offset and always answers with the first page.
        let fetch_fn = move |_params: OffsetParams| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok(OffsetPage::new(vec![7], 0, 1, 3)) }
        };

        let mut iterator = OffsetPageIterator::new(OffsetParams::new(0, 1).unwrap(), fetch_fn);
        let items = iterator.collect_all().await.unwrap();

        assert_eq!(items, vec![7, 7]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_marker_stream_yields_items() {
        let fetch_fn = |marker: u64| async move {
            Ok(match marker {
                0 => MarkerPage::new(vec!["a"], 0, Some(1)),
                _ => MarkerPage::new(vec!["b", "c"], 1, None),
            })
        };

        let items: Vec<_> = MarkerPageIterator::new(fetch_fn)
            .into_stream()
            .map(|item| item.unwrap())
            .collect()
            .await;

        assert_eq!(items, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_offset_iterator_walks_to_total() {
        let fetch_fn = |params: OffsetParams| async move {
            let start = params.offset as u64;
            let end = (start + params.limit as u64).min(5);
            Ok(OffsetPage::new(
                (start..end).collect::<Vec<_>>(),
                start,
                params.limit as u64,
                5,
            ))
        };

        let mut iterator = OffsetPageIterator::new(OffsetParams::new(0, 2).unwrap(), fetch_fn);
        let items = iterator.collect_all().await.unwrap();

        assert_eq!(items, vec![0, 1, 2, 3, 4]);
    }
}
