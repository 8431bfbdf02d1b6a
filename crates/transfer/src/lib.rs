//! Transfer-progress state for the Cumulus client.
//!
//! The storage driver runs transfers in the background and pushes partial,
//! possibly-duplicated progress events. This crate folds that stream into a
//! canonical map of transfer records with monotonic progress, smoothed
//! speed, and a derived ETA, and computes the per-direction rollups shown
//! in the always-visible summary indicators.
//!
//! The fold itself ([`reconcile`]) is pure; [`TransferStore`] owns the map
//! and applies events under a single-writer discipline.

mod metrics;
mod reconcile;
mod store;
mod summary;
mod types;

pub use metrics::{blend, format_bytes, format_eta, format_speed, instant_rate};
pub use reconcile::reconcile;
pub use store::{TransferStore, run_pump};
pub use summary::{TransferSummary, summarize};
pub use types::{ReconcilePolicy, TransferRecord};
