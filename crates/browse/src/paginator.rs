//! Page-number navigation over a forward-only cursor listing.
//!
//! The driver's listing API hands back an opaque continuation cursor per
//! page and nothing else — no offsets, no total count. [`MarkerChain`]
//! records the cursors discovered so far (`markers[i]` is the cursor that
//! fetches page `i + 1`, with `markers[0]` the empty start cursor), which
//! makes prev/next free and lets jumps beyond the discovered range walk
//! forward one probe at a time. Once a fetch reports no continuation the
//! last page is known, and every out-of-range jump after that fails
//! without a network call.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use cumulus_driver::StorageDriver;
use cumulus_protocol::{ObjectInfo, ObjectPage};

use crate::error::BrowseError;

/// The discovered cursor chain for one listing context.
///
/// Pure state; the async fetch logic lives in [`Paginator`]. `markers` is
/// never sparse and never empty — every index up to the furthest fetched
/// page is populated.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerChain {
    page_size: usize,
    markers: Vec<String>,
    current_page: usize,
    has_next: bool,
    known_last_page: Option<usize>,
}

impl MarkerChain {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            markers: vec![String::new()],
            current_page: 1,
            has_next: false,
            known_last_page: None,
        }
    }

    /// Clears everything back to the page-1 start state.
    pub fn reset(&mut self) {
        *self = Self::new(self.page_size);
    }

    /// Changing the page size invalidates every cursor, so this always
    /// resets.
    pub fn set_page_size(&mut self, page_size: usize) {
        *self = Self::new(page_size);
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }

    pub fn known_last_page(&self) -> Option<usize> {
        self.known_last_page
    }

    /// The cursor that fetches `page`, if already discovered.
    pub fn cursor_for(&self, page: usize) -> Option<&str> {
        if page == 0 {
            return None;
        }
        self.markers.get(page - 1).map(String::as_str)
    }

    /// Highest page number whose cursor is known.
    pub fn furthest_known(&self) -> usize {
        self.markers.len()
    }

    /// Records what a fetch of `page` revealed, without moving the current
    /// page. Used by jump probes, which only need cursors.
    pub fn observe(&mut self, page: usize, next_cursor: &str, is_truncated: bool) {
        let has_more = is_truncated && !next_cursor.is_empty();
        if has_more {
            if self.markers.len() > page {
                self.markers[page] = next_cursor.to_string();
            } else if self.markers.len() == page {
                self.markers.push(next_cursor.to_string());
            }
            // A continuation here disproves any previously recorded end at
            // or before this page.
            if self.known_last_page.is_some_and(|last| last <= page) {
                self.known_last_page = None;
            }
        } else {
            self.markers.truncate(page.max(1));
            self.known_last_page = Some(page);
        }
    }

    /// Records a fetch of `page` and makes it the current page.
    pub fn commit(&mut self, page: usize, next_cursor: &str, is_truncated: bool) {
        self.observe(page, next_cursor, is_truncated);
        self.current_page = page;
        self.has_next = is_truncated && !next_cursor.is_empty();
    }
}

/// The displayed slice of the listing, handed up to the presentation
/// layer.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    pub items: Vec<ObjectInfo>,
    pub current_page: usize,
    pub has_next: bool,
    pub known_last_page: Option<usize>,
}

/// Drives a [`MarkerChain`] against the driver for one `(bucket, prefix)`
/// listing context.
///
/// The shared epoch counter serializes navigation across context changes:
/// the owner bumps it on every reset, and any fetch that completes under a
/// stale epoch is discarded without touching state (last request wins).
pub struct Paginator<D: StorageDriver + ?Sized> {
    driver: Arc<D>,
    bucket: String,
    prefix: String,
    chain: MarkerChain,
    items: Vec<ObjectInfo>,
    epoch: Arc<AtomicU64>,
    generation: u64,
}

impl<D: StorageDriver + ?Sized> Paginator<D> {
    pub fn new(
        driver: Arc<D>,
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        page_size: usize,
        epoch: Arc<AtomicU64>,
    ) -> Self {
        let generation = epoch.load(Ordering::Relaxed);
        Self {
            driver,
            bucket: bucket.into(),
            prefix: prefix.into(),
            chain: MarkerChain::new(page_size),
            items: Vec::new(),
            epoch,
            generation,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The current displayed page.
    pub fn view(&self) -> PageView {
        PageView {
            items: self.items.clone(),
            current_page: self.chain.current_page(),
            has_next: self.chain.has_next(),
            known_last_page: self.chain.known_last_page(),
        }
    }

    /// Fetches page 1, discarding any discovered cursors.
    pub async fn first(&mut self) -> Result<PageView, BrowseError> {
        let page = self.fetch("").await?;
        self.check_epoch()?;
        self.chain.reset();
        self.chain.commit(1, &page.next_cursor, page.is_truncated);
        self.items = page.items;
        Ok(self.view())
    }

    /// Moves to the next page. Only valid while a continuation is known
    /// for the current page.
    pub async fn next(&mut self) -> Result<PageView, BrowseError> {
        let target = self.chain.current_page() + 1;
        if !self.chain.has_next() {
            return Err(self.out_of_range(target));
        }
        self.goto(target).await
    }

    /// Moves to the previous page.
    pub async fn prev(&mut self) -> Result<PageView, BrowseError> {
        let current = self.chain.current_page();
        if current <= 1 {
            return Err(self.out_of_range(0));
        }
        self.goto(current - 1).await
    }

    /// Jumps to an arbitrary page number.
    ///
    /// A target beyond a known last page fails immediately with no network
    /// call. A target beyond the discovered range walks forward one probe
    /// fetch per page — opaque cursors cannot be synthesized or skipped —
    /// caching the end of the listing as soon as a probe reports no
    /// continuation. A failed jump never moves the current page.
    pub async fn jump_to(&mut self, target: usize) -> Result<PageView, BrowseError> {
        if target == 0 {
            return Err(self.out_of_range(target));
        }
        if let Some(last) = self.chain.known_last_page()
            && target > last
        {
            return Err(BrowseError::OutOfRange {
                target,
                last_page: last,
            });
        }

        loop {
            let furthest = self.chain.furthest_known();
            if furthest >= target {
                break;
            }
            // markers is never empty, so the furthest cursor always exists.
            let cursor = self
                .chain
                .cursor_for(furthest)
                .unwrap_or_default()
                .to_string();
            debug!(page = furthest, target, "probing forward for jump");
            let page = self.fetch(&cursor).await?;
            self.check_epoch()?;
            self.chain
                .observe(furthest, &page.next_cursor, page.is_truncated);
            if !page.has_more() {
                // The listing ended before the target; the end is now
                // cached, so repeating this jump costs nothing.
                return Err(BrowseError::OutOfRange {
                    target,
                    last_page: furthest,
                });
            }
        }

        self.goto(target).await
    }

    /// Changes the page size. Cursors are scoped to a page size, so this
    /// clears the chain; the caller refetches with [`first`](Self::first).
    pub fn set_page_size(&mut self, page_size: usize) {
        self.chain.set_page_size(page_size);
        self.items.clear();
    }

    /// Fetches a page whose cursor is already known and displays it.
    async fn goto(&mut self, target: usize) -> Result<PageView, BrowseError> {
        let cursor = self
            .chain
            .cursor_for(target)
            .ok_or_else(|| self.out_of_range(target))?
            .to_string();
        let page = self.fetch(&cursor).await?;
        self.check_epoch()?;
        self.chain.commit(target, &page.next_cursor, page.is_truncated);
        self.items = page.items;
        Ok(self.view())
    }

    async fn fetch(&self, cursor: &str) -> Result<ObjectPage, BrowseError> {
        Ok(self
            .driver
            .list_objects_page(&self.bucket, &self.prefix, cursor, self.chain.page_size())
            .await?)
    }

    /// A stale response must not be applied to the successor context.
    fn check_epoch(&self) -> Result<(), BrowseError> {
        if self.epoch.load(Ordering::Relaxed) != self.generation {
            return Err(BrowseError::Superseded);
        }
        Ok(())
    }

    fn out_of_range(&self, target: usize) -> BrowseError {
        BrowseError::OutOfRange {
            target,
            last_page: self
                .chain
                .known_last_page()
                .unwrap_or_else(|| self.chain.furthest_known()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;

    use cumulus_driver::DriverError;
    use cumulus_protocol::{BucketInfo, TransferUpdate};
    use tokio::sync::mpsc;

    /// Scripted listing backend: page `i` is fetched with cursor `cur-i`
    /// (page 0 with ""), and every call is counted.
    struct ScriptedDriver {
        pages: Vec<ObjectPage>,
        calls: AtomicUsize,
        fail: std::sync::atomic::AtomicBool,
    }

    impl ScriptedDriver {
        /// Builds pages from `(item_count, is_truncated)` pairs.
        fn new(script: &[(usize, bool)]) -> Self {
            let pages = script
                .iter()
                .enumerate()
                .map(|(i, &(count, is_truncated))| ObjectPage {
                    items: (0..count)
                        .map(|n| ObjectInfo {
                            key: format!("p{i}-obj{n}"),
                            size: 1,
                            modified_at: None,
                            etag: None,
                            is_prefix: false,
                        })
                        .collect(),
                    next_cursor: if is_truncated {
                        format!("cur-{}", i + 1)
                    } else {
                        String::new()
                    },
                    is_truncated,
                })
                .collect();
            Self {
                pages,
                calls: AtomicUsize::new(0),
                fail: std::sync::atomic::AtomicBool::new(false),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::Relaxed)
        }

        fn set_fail(&self, fail: bool) {
            self.fail.store(fail, Ordering::Relaxed);
        }
    }

    #[async_trait]
    impl StorageDriver for ScriptedDriver {
        async fn list_buckets(&self) -> Result<Vec<BucketInfo>, DriverError> {
            unreachable!("not used by paginator tests")
        }

        async fn list_objects_page(
            &self,
            _bucket: &str,
            _prefix: &str,
            cursor: &str,
            _page_size: usize,
        ) -> Result<ObjectPage, DriverError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if self.fail.load(Ordering::Relaxed) {
                return Err(DriverError::Backend("listing failed".into()));
            }
            let index = if cursor.is_empty() {
                0
            } else {
                cursor
                    .strip_prefix("cur-")
                    .and_then(|n| n.parse::<usize>().ok())
                    .ok_or_else(|| DriverError::Backend(format!("bad cursor {cursor}")))?
            };
            self.pages
                .get(index)
                .cloned()
                .ok_or_else(|| DriverError::Backend(format!("no page for cursor {cursor}")))
        }

        async fn enqueue_upload(
            &self,
            _bucket: &str,
            _prefix: &str,
            _local_paths: &[String],
        ) -> Result<Vec<String>, DriverError> {
            unreachable!()
        }

        async fn enqueue_download(
            &self,
            _bucket: &str,
            _key: &str,
            _local_path: &str,
            _expected_size: i64,
        ) -> Result<String, DriverError> {
            unreachable!()
        }

        async fn delete_object(&self, _bucket: &str, _key: &str) -> Result<(), DriverError> {
            unreachable!()
        }

        async fn move_object(
            &self,
            _src_bucket: &str,
            _src_key: &str,
            _dst_bucket: &str,
            _dst_key: &str,
        ) -> Result<(), DriverError> {
            unreachable!()
        }

        async fn presign(
            &self,
            _bucket: &str,
            _key: &str,
            _ttl_secs: u64,
        ) -> Result<String, DriverError> {
            unreachable!()
        }

        async fn get_object_text(
            &self,
            _bucket: &str,
            _key: &str,
            _max_bytes: i64,
        ) -> Result<String, DriverError> {
            unreachable!()
        }

        async fn put_object_text(
            &self,
            _bucket: &str,
            _key: &str,
            _text: &str,
        ) -> Result<(), DriverError> {
            unreachable!()
        }

        async fn transfer_history(&self) -> Result<Vec<TransferUpdate>, DriverError> {
            Ok(vec![])
        }

        async fn subscribe_transfers(&self) -> Option<mpsc::Receiver<TransferUpdate>> {
            None
        }
    }

    fn paginator(driver: &Arc<ScriptedDriver>, page_size: usize) -> Paginator<ScriptedDriver> {
        Paginator::new(
            Arc::clone(driver),
            "bucket",
            "",
            page_size,
            Arc::new(AtomicU64::new(0)),
        )
    }

    #[tokio::test]
    async fn first_fetches_page_one() {
        let driver = Arc::new(ScriptedDriver::new(&[(3, true), (2, false)]));
        let mut pager = paginator(&driver, 3);

        let view = pager.first().await.unwrap();
        assert_eq!(view.current_page, 1);
        assert_eq!(view.items.len(), 3);
        assert!(view.has_next);
        assert_eq!(view.known_last_page, None);
        assert_eq!(driver.calls(), 1);
    }

    #[tokio::test]
    async fn next_and_prev_reuse_known_cursors() {
        let driver = Arc::new(ScriptedDriver::new(&[(3, true), (3, true), (1, false)]));
        let mut pager = paginator(&driver, 3);

        pager.first().await.unwrap();
        let view = pager.next().await.unwrap();
        assert_eq!(view.current_page, 2);
        assert!(view.has_next);

        let view = pager.prev().await.unwrap();
        assert_eq!(view.current_page, 1);
        // One fetch per navigation, nothing extra for cursor discovery.
        assert_eq!(driver.calls(), 3);
    }

    #[tokio::test]
    async fn next_without_continuation_is_out_of_range() {
        let driver = Arc::new(ScriptedDriver::new(&[(2, false)]));
        let mut pager = paginator(&driver, 3);

        pager.first().await.unwrap();
        let err = pager.next().await.unwrap_err();
        assert!(matches!(
            err,
            BrowseError::OutOfRange {
                target: 2,
                last_page: 1
            }
        ));
        assert_eq!(driver.calls(), 1);
    }

    #[tokio::test]
    async fn prev_below_first_page_is_out_of_range() {
        let driver = Arc::new(ScriptedDriver::new(&[(2, false)]));
        let mut pager = paginator(&driver, 3);

        pager.first().await.unwrap();
        assert!(matches!(
            pager.prev().await.unwrap_err(),
            BrowseError::OutOfRange { .. }
        ));
        assert_eq!(pager.view().current_page, 1);
    }

    #[tokio::test]
    async fn jump_walks_forward_then_caches_last_page() {
        // Three full pages then a short final page.
        let driver = Arc::new(ScriptedDriver::new(&[
            (200, true),
            (200, true),
            (200, true),
            (50, false),
        ]));
        let mut pager = paginator(&driver, 200);

        pager.first().await.unwrap();
        assert_eq!(driver.calls(), 1);

        let view = pager.jump_to(4).await.unwrap();
        assert_eq!(view.current_page, 4);
        assert_eq!(view.items.len(), 50);
        assert!(!view.has_next);
        assert_eq!(view.known_last_page, Some(4));
        // Probes for pages 2 and 3, then the display fetch of page 4.
        assert_eq!(driver.calls(), 4);

        // Beyond the known end: immediate failure, zero calls.
        let err = pager.jump_to(5).await.unwrap_err();
        assert!(matches!(
            err,
            BrowseError::OutOfRange {
                target: 5,
                last_page: 4
            }
        ));
        assert_eq!(driver.calls(), 4);
        assert_eq!(pager.view().current_page, 4);
    }

    #[tokio::test]
    async fn jump_past_end_discovers_and_caches_the_end() {
        let driver = Arc::new(ScriptedDriver::new(&[(3, true), (1, false)]));
        let mut pager = paginator(&driver, 3);

        // From the start state: probes pages 1 and 2, finds the end, fails.
        let err = pager.jump_to(5).await.unwrap_err();
        assert!(matches!(
            err,
            BrowseError::OutOfRange {
                target: 5,
                last_page: 2
            }
        ));
        assert_eq!(driver.calls(), 2);
        // The failed jump did not move the current page.
        assert_eq!(pager.view().current_page, 1);

        // Retry is free: the end is cached.
        assert!(pager.jump_to(5).await.is_err());
        assert_eq!(driver.calls(), 2);

        // A jump inside the known range is a single display fetch.
        let view = pager.jump_to(2).await.unwrap();
        assert_eq!(view.current_page, 2);
        assert_eq!(driver.calls(), 3);
    }

    #[tokio::test]
    async fn jump_to_page_one_is_a_single_call() {
        let driver = Arc::new(ScriptedDriver::new(&[(3, true), (3, true), (1, false)]));
        let mut pager = paginator(&driver, 3);

        let view = pager.jump_to(1).await.unwrap();
        assert_eq!(view.current_page, 1);
        assert_eq!(driver.calls(), 1);
    }

    #[tokio::test]
    async fn failed_fetch_leaves_pagination_state_intact() {
        let driver = Arc::new(ScriptedDriver::new(&[(3, true), (3, true)]));
        let mut pager = paginator(&driver, 3);

        let before = pager.first().await.unwrap();
        driver.set_fail(true);
        let err = pager.next().await.unwrap_err();
        assert!(matches!(err, BrowseError::Listing(_)));
        assert_eq!(pager.view(), before);

        // The same request replays cleanly after the backend recovers.
        driver.set_fail(false);
        assert_eq!(pager.next().await.unwrap().current_page, 2);
    }

    #[tokio::test]
    async fn stale_epoch_discards_the_response() {
        let driver = Arc::new(ScriptedDriver::new(&[(3, true)]));
        let epoch = Arc::new(AtomicU64::new(0));
        let mut pager = Paginator::new(Arc::clone(&driver), "bucket", "", 3, Arc::clone(&epoch));

        // A navigation reset happens while the fetch is in flight.
        epoch.fetch_add(1, Ordering::Relaxed);
        let err = pager.first().await.unwrap_err();
        assert!(matches!(err, BrowseError::Superseded));
        assert!(pager.view().items.is_empty());
    }

    #[tokio::test]
    async fn page_size_change_clears_the_chain() {
        let driver = Arc::new(ScriptedDriver::new(&[(3, true), (3, true)]));
        let mut pager = paginator(&driver, 3);

        pager.first().await.unwrap();
        pager.next().await.unwrap();
        pager.set_page_size(10);

        let view = pager.view();
        assert_eq!(view.current_page, 1);
        assert!(view.items.is_empty());
        assert!(!view.has_next);
    }

    #[test]
    fn chain_overwrites_known_cursor_on_refetch() {
        let mut chain = MarkerChain::new(10);
        chain.commit(1, "cur-1", true);
        chain.commit(2, "cur-2", true);
        // Refetching page 1 must not truncate later markers.
        chain.commit(1, "cur-1", true);
        assert_eq!(chain.cursor_for(3), Some("cur-2"));
        assert_eq!(chain.furthest_known(), 3);
    }

    #[test]
    fn chain_truncates_when_the_list_shrinks() {
        let mut chain = MarkerChain::new(10);
        chain.commit(1, "cur-1", true);
        chain.commit(2, "cur-2", true);
        // Page 2 now reports the end: the stale cursor for page 3 goes away.
        chain.commit(2, "", false);
        assert_eq!(chain.known_last_page(), Some(2));
        assert_eq!(chain.cursor_for(3), None);
        assert_eq!(chain.furthest_known(), 2);
    }

    #[test]
    fn chain_clears_stale_last_page_when_list_grows() {
        let mut chain = MarkerChain::new(10);
        chain.commit(1, "", false);
        assert_eq!(chain.known_last_page(), Some(1));
        chain.commit(1, "cur-1", true);
        assert_eq!(chain.known_last_page(), None);
        assert!(chain.has_next());
    }
}
