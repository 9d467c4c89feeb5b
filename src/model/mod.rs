//! Field value model.
//!
//! Typed representation of one submission's fields plus the author and
//! source sub-entities assembled around them.

pub mod author;
pub mod field;
pub mod source;
pub mod value;

pub use author::*;
pub use field::*;
pub use source::*;
pub use value::*;
