//! The client session: one connected driver, one transfer record map, one
//! browsing context.
//!
//! [`Session`] owns the collaborators and wires them together: it seeds
//! the transfer store from the driver's history snapshot, pumps the push
//! stream of progress events into it, and keeps the navigation history and
//! the active paginator in lockstep — every location change bumps the
//! navigation epoch so an in-flight page walk for the abandoned context is
//! discarded instead of racing the new one.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use cumulus_browse::{BrowseError, Location, NavigationHistory, PageView, Paginator};
use cumulus_driver::{DriverError, StorageDriver};
use cumulus_protocol::{BucketInfo, TransferKind};
use cumulus_transfer::{ReconcilePolicy, TransferRecord, TransferStore, TransferSummary, run_pump};

/// Session-level tuning.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Objects per listing page.
    pub page_size: usize,
    pub policy: ReconcilePolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            page_size: 200,
            policy: ReconcilePolicy::default(),
        }
    }
}

/// Errors surfaced by session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Browse(#[from] BrowseError),

    #[error("driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("no location is open")]
    NoLocation,

    #[error("no history entry in that direction")]
    NoHistory,
}

/// One client session against a storage driver.
pub struct Session<D: StorageDriver> {
    driver: Arc<D>,
    store: Arc<TransferStore>,
    history: NavigationHistory,
    paginator: Option<Paginator<D>>,
    /// Bumped on every navigation reset; stale fetches check it before
    /// applying their result.
    nav_epoch: Arc<AtomicU64>,
    page_size: usize,
    cancel: CancellationToken,
    pump: Option<JoinHandle<()>>,
}

impl<D: StorageDriver> Session<D> {
    pub fn new(driver: Arc<D>, config: SessionConfig) -> Self {
        Self {
            driver,
            store: Arc::new(TransferStore::new(config.policy)),
            history: NavigationHistory::new(),
            paginator: None,
            nav_epoch: Arc::new(AtomicU64::new(0)),
            page_size: config.page_size,
            cancel: CancellationToken::new(),
            pump: None,
        }
    }

    /// Seeds transfer state from the driver's history snapshot and starts
    /// consuming the live event stream.
    pub async fn start(&mut self) -> Result<(), DriverError> {
        let history = self.driver.transfer_history().await?;
        let seeded = self.store.seed(&history);
        info!(records = seeded, "loaded transfer history");

        match self.driver.subscribe_transfers().await {
            Some(events) => {
                let pump = tokio::spawn(run_pump(
                    Arc::clone(&self.store),
                    events,
                    self.cancel.child_token(),
                ));
                self.pump = Some(pump);
            }
            None => warn!("transfer stream already taken — live updates disabled"),
        }
        Ok(())
    }

    /// Stops the event pump. Record state stays readable.
    pub async fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(pump) = self.pump.take() {
            let _ = pump.await;
        }
        debug!("session shut down");
    }

    // --- Browsing ---------------------------------------------------------

    /// Opens a `(bucket, prefix)` location and fetches its first page.
    pub async fn open(
        &mut self,
        bucket: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Result<PageView, SessionError> {
        let location = Location::new(bucket, prefix);
        info!(bucket = %location.bucket, prefix = %location.prefix, "opening location");
        self.history.visit(location.clone());
        self.reset_paginator(&location);
        self.first_page().await
    }

    /// Steps back in history and replays that location.
    pub async fn back(&mut self) -> Result<PageView, SessionError> {
        let location = self.history.back().cloned().ok_or(SessionError::NoHistory)?;
        self.reset_paginator(&location);
        self.first_page().await
    }

    /// Steps forward in history and replays that location.
    pub async fn forward(&mut self) -> Result<PageView, SessionError> {
        let location = self
            .history
            .forward()
            .cloned()
            .ok_or(SessionError::NoHistory)?;
        self.reset_paginator(&location);
        self.first_page().await
    }

    pub async fn next_page(&mut self) -> Result<PageView, SessionError> {
        Ok(self.paginator_mut()?.next().await?)
    }

    pub async fn prev_page(&mut self) -> Result<PageView, SessionError> {
        Ok(self.paginator_mut()?.prev().await?)
    }

    pub async fn jump_to(&mut self, page: usize) -> Result<PageView, SessionError> {
        Ok(self.paginator_mut()?.jump_to(page).await?)
    }

    /// Changes the page size. Cursors don't survive a size change, so the
    /// open location (if any) is refetched from page 1.
    pub async fn set_page_size(&mut self, page_size: usize) -> Result<Option<PageView>, SessionError> {
        self.page_size = page_size;
        let Some(location) = self.history.current().cloned() else {
            return Ok(None);
        };
        self.reset_paginator(&location);
        self.first_page().await.map(Some)
    }

    /// The currently displayed page, if a location is open.
    pub fn page_view(&self) -> Option<PageView> {
        self.paginator.as_ref().map(Paginator::view)
    }

    pub fn location(&self) -> Option<&Location> {
        self.history.current()
    }

    pub fn can_back(&self) -> bool {
        self.history.can_back()
    }

    pub fn can_forward(&self) -> bool {
        self.history.can_forward()
    }

    // --- Transfer state ---------------------------------------------------

    pub fn transfers(&self) -> Vec<Arc<TransferRecord>> {
        self.store.snapshot()
    }

    pub fn transfer(&self, id: &str) -> Option<Arc<TransferRecord>> {
        self.store.get(id)
    }

    pub fn summary(&self, kind: TransferKind) -> TransferSummary {
        self.store.summary(kind)
    }

    pub fn children_by_parent(&self) -> HashMap<String, Vec<Arc<TransferRecord>>> {
        self.store.children_by_parent()
    }

    pub fn store(&self) -> Arc<TransferStore> {
        Arc::clone(&self.store)
    }

    // --- Object operations ------------------------------------------------

    pub async fn list_buckets(&self) -> Result<Vec<BucketInfo>, DriverError> {
        self.driver.list_buckets().await
    }

    /// Enqueues uploads; progress arrives through the event stream.
    pub async fn upload(
        &self,
        bucket: &str,
        prefix: &str,
        local_paths: &[String],
    ) -> Result<Vec<String>, DriverError> {
        info!(bucket = %bucket, files = local_paths.len(), "enqueueing upload");
        self.driver.enqueue_upload(bucket, prefix, local_paths).await
    }

    /// Enqueues a download; progress arrives through the event stream.
    pub async fn download(
        &self,
        bucket: &str,
        key: &str,
        local_path: &str,
        expected_size: i64,
    ) -> Result<String, DriverError> {
        info!(bucket = %bucket, key = %key, "enqueueing download");
        self.driver
            .enqueue_download(bucket, key, local_path, expected_size)
            .await
    }

    pub async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), DriverError> {
        info!(bucket = %bucket, key = %key, "deleting object");
        self.driver.delete_object(bucket, key).await
    }

    pub async fn move_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<(), DriverError> {
        info!(
            src = %format_args!("{src_bucket}/{src_key}"),
            dst = %format_args!("{dst_bucket}/{dst_key}"),
            "moving object"
        );
        self.driver
            .move_object(src_bucket, src_key, dst_bucket, dst_key)
            .await
    }

    pub async fn presign(
        &self,
        bucket: &str,
        key: &str,
        ttl_secs: u64,
    ) -> Result<String, DriverError> {
        self.driver.presign(bucket, key, ttl_secs).await
    }

    pub async fn object_text(
        &self,
        bucket: &str,
        key: &str,
        max_bytes: i64,
    ) -> Result<String, DriverError> {
        self.driver.get_object_text(bucket, key, max_bytes).await
    }

    pub async fn put_object_text(
        &self,
        bucket: &str,
        key: &str,
        text: &str,
    ) -> Result<(), DriverError> {
        self.driver.put_object_text(bucket, key, text).await
    }

    // --- Internals --------------------------------------------------------

    /// Swaps in a fresh paginator for `location`, invalidating any
    /// in-flight fetch for the previous context.
    fn reset_paginator(&mut self, location: &Location) {
        self.nav_epoch.fetch_add(1, Ordering::Relaxed);
        self.paginator = Some(Paginator::new(
            Arc::clone(&self.driver),
            location.bucket.clone(),
            location.prefix.clone(),
            self.page_size,
            Arc::clone(&self.nav_epoch),
        ));
    }

    async fn first_page(&mut self) -> Result<PageView, SessionError> {
        Ok(self.paginator_mut()?.first().await?)
    }

    fn paginator_mut(&mut self) -> Result<&mut Paginator<D>, SessionError> {
        self.paginator.as_mut().ok_or(SessionError::NoLocation)
    }
}
