//! Feedback aggregate, live submissions and the request cache.

pub mod cache;
pub mod entry;
pub mod status;
pub mod submission;

pub use cache::FeedbackCache;
pub use entry::{Feedback, LegacyValues};
pub use status::FeedbackStatus;
pub use submission::{FormDefinition, FormField, PostedValue, Submission};
