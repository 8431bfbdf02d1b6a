//! Per-direction rollups for the always-visible summary indicators.

use cumulus_protocol::{TransferKind, TransferStatus};

use crate::types::TransferRecord;

/// Live rollup of one transfer direction: "what's happening right now".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransferSummary {
    /// Active top-level tasks of this kind (standalone tasks and group
    /// headers — children are not double-counted).
    pub task_count: usize,
    /// Summed over active records with a known positive size only, so
    /// unknown-size tasks don't distort the ratio.
    pub total_bytes: i64,
    pub done_bytes: i64,
    /// Combined rate of the in-progress records (queued tasks contribute
    /// no rate).
    pub speed: f64,
    /// Overall completion in `[0, 100]`, or `None` when no active record
    /// has a known size — the display shows the task count instead.
    pub percent: Option<f64>,
}

/// Rolls up the active top-level records matching `kind`.
///
/// Completed and errored tasks are excluded; this is a live indicator, not
/// a history view.
pub fn summarize<'a, I>(records: I, kind: TransferKind) -> TransferSummary
where
    I: IntoIterator<Item = &'a TransferRecord>,
{
    let mut summary = TransferSummary::default();

    for record in records {
        if !record.is_top_level() || record.kind != kind || !record.is_active() {
            continue;
        }
        summary.task_count += 1;

        if let Some(total) = record.total_bytes.filter(|t| *t > 0) {
            summary.total_bytes += total;
            summary.done_bytes += record.done_bytes.unwrap_or(0).clamp(0, total);
        }
        if record.status == TransferStatus::InProgress {
            summary.speed += record.speed;
        }
    }

    if summary.total_bytes > 0 {
        let pct = summary.done_bytes as f64 / summary.total_bytes as f64 * 100.0;
        summary.percent = Some(pct.clamp(0.0, 100.0));
    }
    summary
}
