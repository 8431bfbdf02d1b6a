use serde::Serialize;

use cumulus_protocol::{TransferKind, TransferStatus};

/// Tuning knobs for the reconciler's speed derivation.
#[derive(Debug, Clone)]
pub struct ReconcilePolicy {
    /// Weight of the previous smoothed speed in the exponential blend.
    pub smoothing_prev: f64,
    /// Weight of the newly observed instantaneous rate.
    pub smoothing_instant: f64,
    /// With no byte progress for longer than this, speed collapses to 0
    /// instead of reporting a phantom rate for a stalled transfer.
    pub stale_after_ms: i64,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            smoothing_prev: 0.65,
            smoothing_instant: 0.35,
            stale_after_ms: 6000,
        }
    }
}

/// One transfer task, or a group record aggregating a multi-file batch.
///
/// Records are created on first observation of an event bearing their id
/// and replaced wholesale on every subsequent event. The reconciler never
/// deletes them; pruning finished rows is a display concern.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    pub id: String,
    pub kind: TransferKind,
    /// Owning group, for children of a multi-file transfer. Lookup-only:
    /// a child whose parent is missing from the map is treated as
    /// standalone, never an error.
    pub parent_id: Option<String>,
    pub is_group: bool,
    pub status: TransferStatus,
    /// `None` means the size is not (yet) known.
    pub total_bytes: Option<i64>,
    pub done_bytes: Option<i64>,
    /// Smoothed rate in bytes/sec. Derived view state, recomputed per
    /// event — never task identity.
    pub speed: f64,
    /// Seconds remaining; 0 is the "unknown/none" sentinel rendered as a
    /// dash.
    pub eta_seconds: i64,
    /// Epoch milliseconds.
    pub started_at: i64,
    pub updated_at: i64,
    pub finished_at: Option<i64>,
    // Group counters, meaningful only when `is_group` is set. The driver
    // computes these; the reconciler does not recount children.
    pub file_count: i64,
    pub done_count: i64,
    pub success_count: i64,
    pub error_count: i64,
    pub message: Option<String>,
    pub local_path: Option<String>,
}

impl TransferRecord {
    /// True for records that belong to a group.
    pub fn is_child(&self) -> bool {
        self.parent_id.is_some()
    }

    /// True for standalone tasks and group headers — the records counted
    /// by summaries.
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    /// True while the task still counts toward the live summary.
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Completion ratio in percent, or `None` when the size is unknown.
    pub fn percent(&self) -> Option<f64> {
        match (self.done_bytes, self.total_bytes) {
            (Some(done), Some(total)) if total > 0 => {
                Some((done.min(total) as f64 / total as f64 * 100.0).clamp(0.0, 100.0))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_defaults() {
        let policy = ReconcilePolicy::default();
        assert!((policy.smoothing_prev + policy.smoothing_instant - 1.0).abs() < f64::EPSILON);
        assert_eq!(policy.stale_after_ms, 6000);
    }

    #[test]
    fn percent_unknown_without_total() {
        let record = TransferRecord {
            id: "t".into(),
            done_bytes: Some(100),
            ..TransferRecord::default()
        };
        assert_eq!(record.percent(), None);
    }

    #[test]
    fn percent_clamped_to_total() {
        let record = TransferRecord {
            id: "t".into(),
            done_bytes: Some(2000),
            total_bytes: Some(1000),
            ..TransferRecord::default()
        };
        assert_eq!(record.percent(), Some(100.0));
    }

    #[test]
    fn top_level_vs_child() {
        let top = TransferRecord {
            id: "a".into(),
            ..TransferRecord::default()
        };
        assert!(top.is_top_level());

        let child = TransferRecord {
            id: "b".into(),
            parent_id: Some("a".into()),
            ..TransferRecord::default()
        };
        assert!(child.is_child());
        assert!(!child.is_top_level());
    }
}
