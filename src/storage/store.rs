//! Record store collaborator.
//!
//! The host owns persistence; [`RecordStore`] is the seam. [`MemoryRecordStore`]
//! backs tests and embedded use.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::FeedbackConfig;
use crate::decode::Generation;
use crate::error::{Result, StoreError};
use crate::feedback::{Feedback, FeedbackCache, FeedbackStatus};
use crate::logging::LogContext;
use crate::serialize::serialize;
use crate::{log_debug, log_info};

use super::models::{NewRecord, StoredRecord};

pub trait RecordStore: Send + Sync {
    fn fetch(&self, id: u64) -> Result<StoredRecord>;

    /// Insert a record and return its new id.
    fn insert(&self, record: NewRecord) -> Result<u64>;

    fn update_status(&self, id: u64, status: &FeedbackStatus) -> Result<()>;
}

/// In-process store with sequential ids starting at 1.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    next_id: u64,
    records: BTreeMap<u64, StoredRecord>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record as-is, keeping its id.
    pub fn put(&self, record: StoredRecord) {
        let mut inner = self.inner.lock();
        inner.next_id = inner.next_id.max(record.id);
        inner.records.insert(record.id, record);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().records.is_empty()
    }

    /// All records in id order.
    pub fn records(&self) -> Vec<StoredRecord> {
        self.inner.lock().records.values().cloned().collect()
    }
}

impl RecordStore for MemoryRecordStore {
    fn fetch(&self, id: u64) -> Result<StoredRecord> {
        self.inner
            .lock()
            .records
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id).into())
    }

    fn insert(&self, record: NewRecord) -> Result<u64> {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.records.insert(id, record.into_stored(id));
        Ok(id)
    }

    fn update_status(&self, id: u64, status: &FeedbackStatus) -> Result<()> {
        let mut inner = self.inner.lock();
        let record = inner.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        record.status = status.clone();
        Ok(())
    }
}

/// Write a feedback entry in the canonical generation and assign its id.
pub fn persist<S: RecordStore + ?Sized>(
    store: &S,
    feedback: &mut Feedback,
    config: &FeedbackConfig,
    ctx: &LogContext,
) -> Result<u64> {
    let record = NewRecord {
        content: serialize(feedback, config.forget_ip_address),
        format_marker: Generation::Gen3.as_str().to_string(),
        parent_id: feedback.entry_id(),
        created_at: feedback.created_at(),
        status: feedback.status().clone(),
        slug: feedback.legacy_id().to_string(),
        title: feedback.title().to_string(),
    };
    let id = store.insert(record)?;
    feedback.set_id(id);
    log_info!(
        ctx.with_record(id),
        "FEEDBACK_PERSISTED",
        fields = feedback.fields().len()
    );
    Ok(id)
}

/// Fetch and resolve a record, memoized in `cache`.
pub fn load<S: RecordStore + ?Sized>(
    store: &S,
    id: u64,
    cache: &FeedbackCache,
    ctx: &LogContext,
) -> Result<Arc<Feedback>> {
    if let Some(hit) = cache.get(id) {
        log_debug!(ctx.with_record(id), "CACHE_HIT", source = "load");
        return Ok(hit);
    }
    let record = store.fetch(id)?;
    Ok(cache.insert(id, Feedback::from_record(&record, ctx)))
}

/// Change a stored status and drop the stale cache entry.
pub fn update_status<S: RecordStore + ?Sized>(
    store: &S,
    id: u64,
    status: &FeedbackStatus,
    cache: &FeedbackCache,
) -> Result<()> {
    store.update_status(id, status)?;
    cache.invalidate(id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedbackError;
    use crate::feedback::{FormDefinition, FormField, Submission};
    use crate::model::{FieldType, Source};
    use crate::pipeline::RequestContext;
    use chrono::NaiveDate;

    fn ctx() -> LogContext {
        LogContext::new("test")
    }

    fn submitted() -> Feedback {
        let form = FormDefinition {
            fields: vec![
                FormField::new("name", "Name", FieldType::Name),
                FormField::new("email", "Email", FieldType::Email),
            ],
            subject: "Hello".into(),
            ..FormDefinition::default()
        };
        let created_at = NaiveDate::from_ymd_opt(2023, 5, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let submission = Submission::new(Source::new(Some(7), "Contact", 1), created_at)
            .with_value("name", "Bob")
            .with_value("email", "bob@example.com")
            .with_ip("203.0.113.9");
        Feedback::from_submission(&submission, &form, &LogContext::new("test"))
    }

    #[test]
    fn test_persist_then_load() {
        let store = MemoryRecordStore::new();
        let mut feedback = submitted();
        let id = persist(&store, &mut feedback, &FeedbackConfig::default(), &ctx()).unwrap();
        assert_eq!(id, 1);
        assert_eq!(feedback.id(), Some(1));

        let stored = store.fetch(id).unwrap();
        assert_eq!(stored.format_marker.as_deref(), Some("v3"));
        assert_eq!(stored.parent_id, Some(7));
        assert_eq!(stored.slug, feedback.legacy_id());

        let cache = FeedbackCache::new();
        let loaded = load(&store, id, &cache, &LogContext::new("test")).unwrap();
        assert_eq!(loaded.fields(), feedback.fields());
        assert_eq!(loaded.ip(), Some("203.0.113.9"));
        assert_eq!(loaded.title(), feedback.title());
        assert_eq!(cache.len(), 1);

        let again = load(&store, id, &cache, &LogContext::new("test")).unwrap();
        assert!(Arc::ptr_eq(&loaded, &again));
    }

    #[test]
    fn test_persist_and_load_in_one_request() {
        let request = RequestContext::default();
        let store = MemoryRecordStore::new();
        let mut feedback = submitted();
        let id = persist(&store, &mut feedback, &request.config, &request.log_context()).unwrap();

        let loaded = load(&store, id, &request.cache, &request.log_context()).unwrap();
        assert_eq!(loaded.fields(), feedback.fields());
        assert!(request.cache.get(id).is_some());
        assert!(request
            .record_context(id)
            .to_string()
            .starts_with(&format!("[request={}]", request.request_id)));
    }

    #[test]
    fn test_persist_forgets_ip() {
        let store = MemoryRecordStore::new();
        let config = FeedbackConfig {
            forget_ip_address: true,
            ..FeedbackConfig::default()
        };
        let id = persist(&store, &mut submitted(), &config, &ctx()).unwrap();
        assert!(store.fetch(id).unwrap().content.contains("\"ip\":null"));
    }

    #[test]
    fn test_missing_record() {
        let store = MemoryRecordStore::new();
        let err = load(&store, 99, &FeedbackCache::new(), &LogContext::new("test")).unwrap_err();
        assert!(matches!(err, FeedbackError::Store(StoreError::NotFound(99))));
    }

    #[test]
    fn test_update_status_invalidates_cache() {
        let store = MemoryRecordStore::new();
        let id = persist(&store, &mut submitted(), &FeedbackConfig::default(), &ctx()).unwrap();
        let cache = FeedbackCache::new();
        load(&store, id, &cache, &LogContext::new("test")).unwrap();

        update_status(&store, id, &FeedbackStatus::Spam, &cache).unwrap();
        assert!(cache.is_empty());
        let reloaded = load(&store, id, &cache, &LogContext::new("test")).unwrap();
        assert_eq!(reloaded.status(), &FeedbackStatus::Spam);
    }

    #[test]
    fn test_put_keeps_ids_monotonic() {
        let store = MemoryRecordStore::new();
        store.put(
            NewRecord {
                content: "{}".into(),
                format_marker: "v3".into(),
                parent_id: None,
                created_at: NaiveDate::from_ymd_opt(2020, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
                status: FeedbackStatus::Publish,
                slug: String::new(),
                title: String::new(),
            }
            .into_stored(10),
        );
        let id = persist(&store, &mut submitted(), &FeedbackConfig::default(), &ctx()).unwrap();
        assert_eq!(id, 11);
        assert_eq!(store.len(), 2);
    }
}
