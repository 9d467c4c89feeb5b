//! Security module.
//!
//! Tag stripping, entity decoding, HTML escaping and slash handling for
//! user-submitted text.

pub mod sanitizer;

pub use sanitizer::*;
