//! Capability interface to the storage driver process.
//!
//! The driver is an external service that performs all network I/O against
//! the remote object store: listing, transfers, deletes, presigning. The
//! client core consumes it exclusively through [`StorageDriver`] — docked
//! behind a trait so tests can script it and so alternative driver
//! transports stay swappable.
//!
//! Retry, backoff, credentials, and process supervision are the driver's
//! concern; the core treats every call as a single round-trip.

use async_trait::async_trait;
use tokio::sync::mpsc;

use cumulus_protocol::{BucketInfo, ObjectPage, TransferUpdate};

/// Errors surfaced by driver calls.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("driver unavailable")]
    Unavailable,

    #[error("not found: {0}")]
    NotFound(String),
}

/// The full set of backend capabilities the client core consumes.
///
/// All ids (task ids, cursors) are opaque strings issued by the driver.
#[async_trait]
pub trait StorageDriver: Send + Sync {
    /// Lists all buckets visible to the active profile.
    async fn list_buckets(&self) -> Result<Vec<BucketInfo>, DriverError>;

    /// Fetches one page of an object listing.
    ///
    /// `cursor` is empty for the first page; subsequent pages use the
    /// `next_cursor` from the previous result. Cursors are only valid for
    /// the `(bucket, prefix, page_size)` they were issued under.
    async fn list_objects_page(
        &self,
        bucket: &str,
        prefix: &str,
        cursor: &str,
        page_size: usize,
    ) -> Result<ObjectPage, DriverError>;

    /// Enqueues uploads for the given local paths; returns one task id per
    /// path (or a single group id followed by child ids, driver's choice —
    /// progress events carry the structure either way).
    async fn enqueue_upload(
        &self,
        bucket: &str,
        prefix: &str,
        local_paths: &[String],
    ) -> Result<Vec<String>, DriverError>;

    /// Enqueues a download of one object to a local path.
    async fn enqueue_download(
        &self,
        bucket: &str,
        key: &str,
        local_path: &str,
        expected_size: i64,
    ) -> Result<String, DriverError>;

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), DriverError>;

    async fn move_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<(), DriverError>;

    /// Issues a presigned URL for an object, valid for `ttl_secs`.
    async fn presign(&self, bucket: &str, key: &str, ttl_secs: u64) -> Result<String, DriverError>;

    /// Reads an object as text, truncated to `max_bytes`.
    async fn get_object_text(
        &self,
        bucket: &str,
        key: &str,
        max_bytes: i64,
    ) -> Result<String, DriverError>;

    /// Writes text content to an object.
    async fn put_object_text(
        &self,
        bucket: &str,
        key: &str,
        text: &str,
    ) -> Result<(), DriverError>;

    /// Snapshot of transfer state at session start, replayed through the
    /// reconciler before live events are consumed.
    async fn transfer_history(&self) -> Result<Vec<TransferUpdate>, DriverError>;

    /// Takes the push stream of transfer-progress events.
    ///
    /// Can only be taken once per driver session; returns `None` on
    /// subsequent calls.
    async fn subscribe_transfers(&self) -> Option<mpsc::Receiver<TransferUpdate>>;
}
