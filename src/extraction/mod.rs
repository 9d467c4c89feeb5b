//! Typed extraction from loosely-typed stored data.
//!
//! Value coercion for JSON written by older generations and label
//! derivation for positional field keys.

pub mod coerce;
pub mod label;

pub use coerce::*;
pub use label::*;
