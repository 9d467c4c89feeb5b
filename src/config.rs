//! Runtime configuration.
//!
//! Loaded from a JSON document handed over by the host, or from
//! `FEEDBACK_*` environment variables.

use std::env;

use serde::Deserialize;

use crate::error::{FeedbackError, Result};

/// Placeholder replaced by the file id in `file_download_url`.
pub const FILE_ID_PLACEHOLDER: &str = "{file_id}";

/// Extensions the API marks as previewable when no override is configured.
pub const DEFAULT_PREVIEWABLE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Write `"ip": null` when serializing.
    pub forget_ip_address: bool,
    /// Download URL template, e.g. `https://example.com/download?file={file_id}`.
    pub file_download_url: Option<String>,
    pub previewable_extensions: Vec<String>,
    pub log_level: String,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            forget_ip_address: false,
            file_download_url: None,
            previewable_extensions: DEFAULT_PREVIEWABLE_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            log_level: "info".to_string(),
        }
    }
}

impl FeedbackConfig {
    /// Parse a JSON config document. Missing keys fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Build a config from `FEEDBACK_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(raw) = env::var("FEEDBACK_FORGET_IP_ADDRESS") {
            config.forget_ip_address = parse_flag(&raw).ok_or_else(|| {
                FeedbackError::InvalidConfig(format!(
                    "FEEDBACK_FORGET_IP_ADDRESS must be a boolean, got {:?}",
                    raw
                ))
            })?;
        }

        if let Ok(url) = env::var("FEEDBACK_FILE_DOWNLOAD_URL") {
            if !url.trim().is_empty() {
                config.file_download_url = Some(url);
            }
        }

        if let Ok(level) = env::var("FEEDBACK_LOG_LEVEL") {
            config.log_level = level;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if let Some(url) = &self.file_download_url {
            if !url.contains(FILE_ID_PLACEHOLDER) {
                return Err(FeedbackError::InvalidConfig(format!(
                    "file_download_url must contain {}",
                    FILE_ID_PLACEHOLDER
                )));
            }
        }
        if self.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(FeedbackError::InvalidConfig(format!(
                "unknown log_level {:?}",
                self.log_level
            )));
        }
        Ok(())
    }

    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }

    /// Download URL for a file id, empty when no template is configured.
    pub fn download_url(&self, file_id: &str) -> String {
        self.file_download_url
            .as_deref()
            .map(|template| template.replace(FILE_ID_PLACEHOLDER, file_id))
            .unwrap_or_default()
    }

    pub fn is_previewable_extension(&self, extension: &str) -> bool {
        let extension = extension.to_lowercase();
        self.previewable_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(&extension))
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FeedbackConfig::default();
        assert!(!config.forget_ip_address);
        assert_eq!(config.download_url("12"), "");
        assert!(config.is_previewable_extension("PNG"));
        assert!(!config.is_previewable_extension("pdf"));
    }

    #[test]
    fn test_from_json_partial() {
        let config = FeedbackConfig::from_json(
            r#"{"forget_ip_address": true, "file_download_url": "https://x.test/f/{file_id}"}"#,
        )
        .unwrap();
        assert!(config.forget_ip_address);
        assert_eq!(config.download_url("42"), "https://x.test/f/42");
        assert_eq!(config.previewable_extensions.len(), 5);
    }

    #[test]
    fn test_from_json_rejects_template_without_placeholder() {
        let err = FeedbackConfig::from_json(r#"{"file_download_url": "https://x.test/f"}"#);
        assert!(matches!(err, Err(FeedbackError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_json_rejects_bad_level() {
        let err = FeedbackConfig::from_json(r#"{"log_level": "loud"}"#);
        assert!(matches!(err, Err(FeedbackError::InvalidConfig(_))));
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
