//! Browsing state for the Cumulus client: page-number navigation over the
//! driver's cursor-only object listing, plus the back/forward location
//! history.
//!
//! The listing API exposes only forward opaque-cursor pagination — no
//! random access, no total count. [`Paginator`] builds page-number
//! navigation on top of it by recording the chain of cursors it has seen,
//! walking forward one page at a time when a jump target lies beyond the
//! discovered range.

mod error;
mod history;
mod paginator;

pub use error::BrowseError;
pub use history::{Location, NavigationHistory};
pub use paginator::{MarkerChain, PageView, Paginator};
