//! Feedback Core - decoding and projection of stored form responses
//!
//! A feedback entry is one web-form submission persisted as a text blob.
//! Blobs written over the years come in three generations (free-text legacy,
//! slash-escaped JSON, canonical JSON). This crate turns any of them into a
//! typed field model, compiles that model for each consumer, and re-encodes
//! it in the canonical generation. The implementation prioritizes:
//!
//! 1. **Resilience** - decoding never fails; unreadable blobs degrade to empty
//! 2. **Logging** - every decision point logged with request context
//! 3. **Fidelity** - field order and values survive re-encoding unchanged
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `decode` - Generation detection, per-generation decoders, JSON repair
//! - `model` - Field, value, author and source types
//! - `compile` - Context-specific projections (display, email, CSV, API)
//! - `feedback` - The feedback aggregate, submissions and the request cache
//! - `serialize` - Canonical (generation-3) encoder
//! - `storage` - Record models, record store seam, SQL builders
//! - `pipeline` - Request context, batch resolution, CSV export
//! - `security` - Tag stripping, escaping, slash handling
//! - `logging` - Structured logging with request context

pub mod compile;
pub mod config;
pub mod decode;
pub mod error;
pub mod extraction;
pub mod feedback;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod security;
pub mod serialize;
pub mod storage;

#[cfg(feature = "python")]
mod python;

pub use compile::{Context, Shape};
pub use config::FeedbackConfig;
pub use decode::{resolve, Generation, ParsedContent};
pub use error::{FeedbackError, Result};
pub use feedback::{Feedback, FeedbackCache, FeedbackStatus};

/// Install the `env_logger` backend once. Later calls are no-ops.
pub fn init_logger() {
    init_logger_with(log::LevelFilter::Info);
}

/// Install the `env_logger` backend at the configured level.
pub fn init_logger_with(level: log::LevelFilter) {
    let _ = env_logger::builder()
        .filter_level(level)
        .format_timestamp_millis()
        .try_init();
}
