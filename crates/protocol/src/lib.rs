//! Data types exchanged between the Cumulus client core and the storage
//! driver process.
//!
//! The driver owns all network I/O against the remote object store; these
//! types describe what it hands back — bucket and object listings, page
//! results, and partial transfer-progress updates. All timestamps are
//! wall-clock epoch milliseconds as reported by the driver.

mod listing;
mod transfer;

pub use listing::{BucketInfo, ObjectInfo, ObjectPage};
pub use transfer::{TransferKind, TransferStatus, TransferUpdate};
