use serde::{Deserialize, Serialize};

/// A bucket visible to the active driver profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketInfo {
    pub name: String,
    /// Creation time in epoch milliseconds, when the backend reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// One row of an object listing: either a real object or a common-prefix
/// "folder" entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectInfo {
    /// Full key (or prefix, when `is_prefix` is set).
    pub key: String,
    pub size: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// True for common-prefix rows, which have no size or etag.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_prefix: bool,
}

impl ObjectInfo {
    /// Returns the last path segment of the key, for display.
    pub fn basename(&self) -> &str {
        self.key
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.key)
    }
}

/// One page of an object listing.
///
/// `next_cursor` is an opaque continuation token; it is only meaningful
/// when `is_truncated` is true, and only for the page size it was issued
/// under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPage {
    pub items: Vec<ObjectInfo>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub next_cursor: String,
    #[serde(default)]
    pub is_truncated: bool,
}

impl ObjectPage {
    /// True when a usable continuation cursor exists.
    pub fn has_more(&self) -> bool {
        self.is_truncated && !self.next_cursor.is_empty()
    }
}
