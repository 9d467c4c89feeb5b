//! Generation-2 content decoder.
//!
//! Same document shape as generation 3, but writers of this generation
//! stored slash-escaped JSON and lost the backslash of `\uXXXX` escapes.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::model::Field;
use crate::security::sanitizer::strip_slashes;

use super::repair::repair_malformed_json;
use super::{DecodeError, ParsedContent};

lazy_static! {
    /// A `uXXXX` sequence whose leading backslash was stripped.
    static ref BARE_UNICODE_ESCAPE: Regex = Regex::new(r"u([0-9a-fA-F]{4})").unwrap();
}

/// Parse a generation-2 document.
///
/// Tries the raw text, then the de-slashed text, then the repaired
/// de-slashed text. The first parse error is reported when all fail.
pub fn decode_json(content: &str) -> Result<Value, DecodeError> {
    if content.trim().is_empty() {
        return Err(DecodeError::EmptyContent);
    }

    let first = match serde_json::from_str::<Value>(content) {
        Ok(doc) => return Ok(doc),
        Err(e) => e,
    };

    let stripped = strip_slashes(content.trim());
    if let Ok(doc) = serde_json::from_str::<Value>(&stripped) {
        return Ok(doc);
    }

    let repaired = repair_malformed_json(&stripped);
    match serde_json::from_str::<Value>(&repaired) {
        Ok(doc) => {
            log::debug!("GEN2_REPAIR_APPLIED content_len={}", content.len());
            Ok(doc)
        }
        Err(_) => Err(first.into()),
    }
}

/// Decode a generation-2 document.
pub fn decode(content: &str) -> Result<ParsedContent, DecodeError> {
    let doc = decode_json(content)?;
    ParsedContent::from_document(&doc, decode_field)
}

/// Decode one field record after restoring lost unicode escapes.
fn decode_field(record: &Value) -> Option<Field> {
    let mut record = record.clone();
    if let Some(obj) = record.as_object_mut() {
        for key in ["label", "value"] {
            if let Some(value) = obj.get_mut(key) {
                restore_value(value);
            }
        }
    }
    Field::from_serialized(&record)
}

fn restore_value(value: &mut Value) {
    match value {
        Value::String(s) => {
            if s.contains('u') {
                *s = restore_unicode_escapes(s);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(restore_value),
        Value::Object(obj) => obj.values_mut().for_each(restore_value),
        _ => {}
    }
}

/// Turn `uXXXX` back into the character it encoded.
///
/// Only sequences above the Latin-1 control range whose hex part has a
/// letter or a leading zero are touched; ordinary text like `menu2014`
/// stays as it is.
pub fn restore_unicode_escapes(text: &str) -> String {
    BARE_UNICODE_ESCAPE
        .replace_all(text, |caps: &Captures| {
            let hex = &caps[1];
            let looks_encoded =
                hex.starts_with('0') || hex.chars().any(|c| c.is_ascii_alphabetic());
            u32::from_str_radix(hex, 16)
                .ok()
                .filter(|cp| looks_encoded && *cp >= 0xA0)
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
