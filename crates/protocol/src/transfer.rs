use serde::{Deserialize, Serialize};

/// Direction of a transfer task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferKind {
    #[serde(rename = "upload")]
    Upload,
    #[default]
    #[serde(rename = "download")]
    Download,
}

/// Current state of a transfer task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferStatus {
    #[default]
    #[serde(rename = "queued")]
    Queued,
    #[serde(rename = "in_progress")]
    InProgress,
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "error")]
    Error,
}

impl TransferStatus {
    /// Terminal states never transition further.
    pub fn is_terminal(self) -> bool {
        matches!(self, TransferStatus::Success | TransferStatus::Error)
    }

    /// Position along the `queued → in_progress → terminal` progression.
    pub fn rank(self) -> u8 {
        match self {
            TransferStatus::Queued => 0,
            TransferStatus::InProgress => 1,
            TransferStatus::Success | TransferStatus::Error => 2,
        }
    }
}

/// A partial progress event for one transfer task.
///
/// Every field except `id` is optional: the driver sends only what changed
/// (or what it knows). Events for the same id arrive in non-decreasing
/// `updated_at` order; events for different ids interleave arbitrarily.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferUpdate {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransferKind>,
    /// Owning group id for child tasks of a multi-file transfer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_group: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TransferStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_bytes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_bytes: Option<i64>,
    /// Explicit rate in bytes/sec, when the driver computes one itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta_seconds: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,
    /// Event timestamp in epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
}

impl TransferUpdate {
    /// A minimal update carrying only an id, for building test fixtures
    /// and synthetic events.
    pub fn bare(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_terminal_and_rank() {
        assert!(!TransferStatus::Queued.is_terminal());
        assert!(!TransferStatus::InProgress.is_terminal());
        assert!(TransferStatus::Success.is_terminal());
        assert!(TransferStatus::Error.is_terminal());

        assert!(TransferStatus::Queued.rank() < TransferStatus::InProgress.rank());
        assert!(TransferStatus::InProgress.rank() < TransferStatus::Error.rank());
        assert_eq!(TransferStatus::Success.rank(), TransferStatus::Error.rank());
    }

    #[test]
    fn update_json_is_sparse() {
        let update = TransferUpdate {
            done_bytes: Some(512),
            updated_at: Some(1_700_000_000_000),
            ..TransferUpdate::bare("t-1")
        };
        let json = serde_json::to_string(&update).unwrap();
        assert!(json.contains("\"doneBytes\":512"));
        assert!(!json.contains("totalBytes"));
        assert!(!json.contains("parentId"));

        let parsed: TransferUpdate = serde_json::from_str(&json).unwrap();
        assert_eq!(update, parsed);
    }

    #[test]
    fn status_wire_names() {
        let json = serde_json::to_string(&TransferStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let back: TransferStatus = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(back, TransferStatus::Error);
    }
}
