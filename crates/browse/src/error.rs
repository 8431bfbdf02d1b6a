//! Browsing error types.

use cumulus_driver::DriverError;

/// Errors surfaced by pagination and navigation.
///
/// None of these corrupts existing pagination state: a failed fetch or an
/// out-of-range jump leaves the current page and cursor chain as they
/// were.
#[derive(Debug, thiserror::Error)]
pub enum BrowseError {
    /// The requested page lies beyond the proven end of the listing.
    #[error("page {target} is out of range (last page is {last_page})")]
    OutOfRange { target: usize, last_page: usize },

    /// The listing call itself failed; retryable by replaying the same
    /// request.
    #[error("listing failed: {0}")]
    Listing(#[from] DriverError),

    /// A newer navigation superseded this request; its result was
    /// discarded.
    #[error("superseded by a newer navigation")]
    Superseded,
}
