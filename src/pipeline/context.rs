//! Request context management.
//!
//! One request resolves any number of records; the context carries the
//! request id for logging, the configuration and the request's cache.

use std::sync::Arc;

use uuid::Uuid;

use crate::compile::{Context, Projection, Shape};
use crate::config::FeedbackConfig;
use crate::feedback::{Feedback, FeedbackCache};
use crate::logging::structured::LogContext;

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub config: Arc<FeedbackConfig>,
    pub cache: Arc<FeedbackCache>,
}

impl RequestContext {
    pub fn new(config: FeedbackConfig) -> Self {
        Self::with_cache(config, Arc::new(FeedbackCache::new()))
    }

    /// Share an existing cache, e.g. across requests of one worker.
    pub fn with_cache(config: FeedbackConfig, cache: Arc<FeedbackCache>) -> Self {
        let request_id = format!("req-{}", &Uuid::new_v4().simple().to_string()[..8]);
        Self {
            request_id,
            config: Arc::new(config),
            cache,
        }
    }

    pub fn log_context(&self) -> LogContext {
        LogContext::new(&self.request_id)
    }

    /// Log context for one record of this request.
    pub fn record_context(&self, record_id: u64) -> LogContext {
        self.log_context().with_record(record_id)
    }

    /// Compile an entry's fields with this request's configuration.
    pub fn compile(&self, feedback: &Feedback, context: Context, shape: Shape) -> Projection {
        feedback.compiled_fields_with(&self.config, context, shape)
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new(FeedbackConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::RenderedValue;
    use crate::storage::StoredRecord;
    use chrono::NaiveDate;

    fn upload_feedback() -> Feedback {
        let record = StoredRecord {
            id: 3,
            content: r#"{"fields":[{"key":"1_Upload","label":"Upload","type":"file","meta":{},
                "value":{"field_id":"g1-upload","files":[{"file_id":"77","name":"cv.PDF","size":2048,"type":"application/pdf"}]}}]}"#
                .to_string(),
            format_marker: Some("v3".into()),
            parent_id: None,
            created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            status: Default::default(),
            slug: String::new(),
            title: String::new(),
        };
        Feedback::from_record(&record, &LogContext::new("test"))
    }

    #[test]
    fn test_request_id_format() {
        let ctx = RequestContext::default();
        assert!(ctx.request_id.starts_with("req-"));
        assert_eq!(ctx.request_id.len(), 12);
        assert!(ctx.request_id[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_record_context() {
        let ctx = RequestContext::default();
        let rendered = ctx.record_context(5).to_string();
        assert_eq!(rendered, format!("[request={}] [record=5]", ctx.request_id));
    }

    #[test]
    fn test_compile_uses_request_config() {
        let config = FeedbackConfig::from_json(
            r#"{"file_download_url":"https://files.test/get?id={file_id}","previewable_extensions":["pdf"]}"#,
        )
        .unwrap();
        let ctx = RequestContext::new(config);
        let projection = ctx.compile(&upload_feedback(), Context::Api, Shape::KeyValue);
        let Some(RenderedValue::Files(view)) = projection.get("1_Upload") else {
            panic!("expected a file view");
        };
        assert_eq!(view.files[0].url, "https://files.test/get?id=77");
        assert!(view.files[0].is_previewable);

        let projection = RequestContext::default().compile(&upload_feedback(), Context::Api, Shape::KeyValue);
        let Some(RenderedValue::Files(view)) = projection.get("1_Upload") else {
            panic!("expected a file view");
        };
        assert_eq!(view.files[0].url, "");
        assert!(!view.files[0].is_previewable);
    }

    #[test]
    fn test_shared_cache() {
        let cache = Arc::new(FeedbackCache::new());
        let a = RequestContext::with_cache(FeedbackConfig::default(), Arc::clone(&cache));
        let b = RequestContext::with_cache(FeedbackConfig::default(), Arc::clone(&cache));
        assert!(Arc::ptr_eq(&a.cache, &b.cache));
        assert_ne!(a.request_id, b.request_id);
    }
}
