//! Error types for operations that touch collaborators.
//!
//! Decoding, compilation and serialization never fail; only the record
//! store, CSV writer and configuration loading return these.

use std::io;

use thiserror::Error;

/// Record store failure reported by a [`crate::storage::RecordStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record {0} not found")]
    NotFound(u64),

    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// Crate-level error type.
#[derive(Error, Debug)]
pub enum FeedbackError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, FeedbackError>;
