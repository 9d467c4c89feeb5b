//! Storage module.
//!
//! Record models, the record store seam with an in-memory implementation,
//! and SQL statement builders for hosts that execute SQL themselves.

pub mod models;
pub mod queries;
pub mod store;

pub use models::*;
pub use queries::*;
pub use store::{load, persist, update_status, MemoryRecordStore, RecordStore};
