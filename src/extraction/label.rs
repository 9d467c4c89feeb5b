//! Label derivation for positional field keys.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref POSITIONAL_KEY: Regex = Regex::new(r"^\d+_(.*)$").unwrap();
}

/// Derive a label from a key such as `1_Name`.
///
/// `<digits>_<text>` yields `<text>`, a bare `<digits>_` yields an empty
/// label and any other key is returned unchanged.
pub fn label_from_key(key: &str) -> String {
    match POSITIONAL_KEY.captures(key) {
        Some(caps) => caps[1].to_string(),
        None => key.to_string(),
    }
}
