//! Moderation status of a feedback entry.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FeedbackStatus {
    #[default]
    Publish,
    Spam,
    Trash,
    /// Any other status a host stores (draft, private, ...).
    Other(String),
}

impl FeedbackStatus {
    pub fn as_str(&self) -> &str {
        match self {
            FeedbackStatus::Publish => "publish",
            FeedbackStatus::Spam => "spam",
            FeedbackStatus::Trash => "trash",
            FeedbackStatus::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "" | "publish" => FeedbackStatus::Publish,
            "spam" => FeedbackStatus::Spam,
            "trash" => FeedbackStatus::Trash,
            other => FeedbackStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for FeedbackStatus {
    fn from(s: String) -> Self {
        FeedbackStatus::parse(&s)
    }
}

impl From<FeedbackStatus> for String {
    fn from(status: FeedbackStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for FeedbackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
