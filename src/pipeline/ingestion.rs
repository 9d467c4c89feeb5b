//! Batch resolution of stored records.
//!
//! Each record is resolved independently through the request cache:
//! 1. Cache lookup by record id
//! 2. Generation detection and decoding
//! 3. Aggregate assembly
//!
//! Output order follows input order. No record can fail the batch.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::feedback::{Feedback, FeedbackStatus};
use crate::storage::StoredRecord;
use crate::log_info;

use super::context::RequestContext;

/// Result of resolving a batch.
#[derive(Debug)]
pub struct BatchResult {
    pub received_count: usize,
    pub resolved_count: usize,
    /// Records whose field list came back empty.
    pub degraded_count: usize,
    pub feedbacks: Vec<Arc<Feedback>>,
}

pub fn resolve_batch(ctx: &RequestContext, records: &[StoredRecord]) -> BatchResult {
    let log_ctx = ctx.log_context();
    let mut feedbacks = Vec::with_capacity(records.len());
    let mut degraded = 0;

    for record in records {
        let feedback = ctx
            .cache
            .get_or_insert_with(record.id, || Feedback::from_record(record, &log_ctx));
        if feedback.fields().is_empty() {
            degraded += 1;
        }
        feedbacks.push(feedback);
    }

    log_info!(
        log_ctx,
        "BATCH_COMPLETE",
        received = records.len(),
        resolved = feedbacks.len() - degraded,
        degraded = degraded
    );

    BatchResult {
        received_count: records.len(),
        resolved_count: feedbacks.len() - degraded,
        degraded_count: degraded,
        feedbacks,
    }
}

/// Number of entries per status, ordered by status name.
pub fn status_counts<F>(feedbacks: &[F]) -> BTreeMap<String, usize>
where
    F: AsRef<Feedback>,
{
    let mut counts = BTreeMap::new();
    for feedback in feedbacks {
        let feedback: &Feedback = feedback.as_ref();
        let status: &FeedbackStatus = feedback.status();
        *counts.entry(status.as_str().to_string()).or_insert(0) += 1;
    }
    counts
}
