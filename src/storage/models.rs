//! Record store models.
//!
//! These mirror the rows of the `feedback_entries` table.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::feedback::FeedbackStatus;

/// Format of `created_at` in stored rows and generated titles.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A persisted feedback entry as fetched from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: u64,
    /// Encoded fields, in the generation named by `format_marker`.
    pub content: String,
    /// `v3`, `v2`, or absent for legacy content.
    pub format_marker: Option<String>,
    /// Post or page the form was submitted from.
    pub parent_id: Option<u64>,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub status: FeedbackStatus,
    /// Legacy feedback id.
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: String,
}

/// A feedback entry ready to be inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    pub content: String,
    pub format_marker: String,
    pub parent_id: Option<u64>,
    pub created_at: NaiveDateTime,
    pub status: FeedbackStatus,
    pub slug: String,
    pub title: String,
}

impl NewRecord {
    /// The stored row this record becomes under `id`.
    pub fn into_stored(self, id: u64) -> StoredRecord {
        StoredRecord {
            id,
            content: self.content,
            format_marker: Some(self.format_marker),
            parent_id: self.parent_id,
            created_at: self.created_at,
            status: self.status,
            slug: self.slug,
            title: self.title,
        }
    }
}
