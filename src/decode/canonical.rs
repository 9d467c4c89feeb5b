//! Generation-3 (canonical) content decoder.

use serde_json::Value;

use crate::model::Field;
use crate::security::sanitizer::strip_slashes;

use super::{DecodeError, ParsedContent};

/// Parse a JSON document, retrying once on the de-slashed text.
pub(crate) fn parse_document(content: &str) -> Result<Value, DecodeError> {
    if content.trim().is_empty() {
        return Err(DecodeError::EmptyContent);
    }
    match serde_json::from_str::<Value>(content) {
        Ok(doc) => Ok(doc),
        Err(first) => {
            serde_json::from_str::<Value>(&strip_slashes(content.trim())).map_err(|_| first.into())
        }
    }
}

/// Decode a canonical document.
pub fn decode(content: &str) -> Result<ParsedContent, DecodeError> {
    let doc = parse_document(content)?;
    ParsedContent::from_document(&doc, Field::from_serialized)
}
