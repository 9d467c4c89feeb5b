//! Request-level orchestration.
//!
//! Coordinates resolution of many stored records within one request:
//! - Request context (id, config, cache)
//! - Batch resolution and status counts
//! - CSV export

pub mod context;
pub mod export;
pub mod ingestion;

pub use context::*;
pub use export::{export_csv, write_csv};
pub use ingestion::*;
