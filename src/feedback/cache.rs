//! Request-scoped memo of resolved feedback entries.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::entry::Feedback;

/// Resolved feedback keyed by record id.
///
/// Owned by the caller (usually one per request). Decoding is deterministic,
/// so two threads resolving the same record may both insert; the last write
/// wins and both values are equal.
#[derive(Debug, Default)]
pub struct FeedbackCache {
    entries: RwLock<HashMap<u64, Arc<Feedback>>>,
}

impl FeedbackCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: u64) -> Option<Arc<Feedback>> {
        self.entries.read().get(&id).cloned()
    }

    pub fn insert(&self, id: u64, feedback: Feedback) -> Arc<Feedback> {
        let feedback = Arc::new(feedback);
        self.entries.write().insert(id, Arc::clone(&feedback));
        feedback
    }

    /// Cached entry, or the result of `resolve` stored under `id`.
    pub fn get_or_insert_with<F>(&self, id: u64, resolve: F) -> Arc<Feedback>
    where
        F: FnOnce() -> Feedback,
    {
        if let Some(hit) = self.get(id) {
            log::debug!("CACHE_HIT record={}", id);
            return hit;
        }
        self.insert(id, resolve())
    }

    /// Drop an entry, e.g. after its status changed.
    pub fn invalidate(&self, id: u64) -> bool {
        self.entries.write().remove(&id).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogContext;
    use crate::storage::StoredRecord;
    use chrono::NaiveDate;

    fn resolved(id: u64, subject: &str) -> Feedback {
        let record = StoredRecord {
            id,
            content: format!(r#"{{"subject":"{}","fields":[]}}"#, subject),
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
    fn test_get_or_insert_resolves_once() {
        let cache = FeedbackCache::new();
        let first = cache.get_or_insert_with(1, || resolved(1, "first"));
        let second = cache.get_or_insert_with(1, || resolved(1, "second"));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.subject(), "first");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_last_write_wins() {
        let cache = FeedbackCache::new();
        cache.insert(2, resolved(2, "old"));
        cache.insert(2, resolved(2, "new"));
        assert_eq!(cache.get(2).unwrap().subject(), "new");
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache = FeedbackCache::new();
        cache.insert(1, resolved(1, "a"));
        cache.insert(2, resolved(2, "b"));
        assert!(cache.invalidate(1));
        assert!(!cache.invalidate(1));
        assert!(cache.get(1).is_none());
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_shared_across_threads() {
        let cache = Arc::new(FeedbackCache::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.get_or_insert_with(7, || resolved(7, "same")).subject().to_string())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), "same");
        }
        assert_eq!(cache.len(), 1);
    }
}
