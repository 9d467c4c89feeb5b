//! Legacy (generation-1) content decoder.
//!
//! Legacy content is free text: a message body, the `<!--more-->` delimiter,
//! then a fields segment. The fields segment holds a few `NAME: value` header
//! lines followed by either a `JSON_DATA` JSON object or a text dump of
//! `[Key] => Value` entries.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::extraction::coerce::{value_to_string, value_to_u64};
use crate::extraction::label::label_from_key;
use crate::model::{Field, FieldList, FieldType, FieldValue, FileSet};
use crate::security::sanitizer::{sanitize_text, strip_slashes};

use super::{ParsedContent, LEGACY_BODY_DELIMITER};

const JSON_DATA_MARKER: &str = "JSON_DATA";
const COMMENT_CONTENT_KEY: &str = "comment_content";
const CONSENT_KEY: &str = "email_marketing_consent";

/// Field type and label of a well-known header line.
fn header_kind(name: &str) -> Option<(FieldType, &'static str)> {
    match name {
        "AUTHOR" => Some((FieldType::Name, "Author")),
        "AUTHOR EMAIL" => Some((FieldType::Email, "Email")),
        "AUTHOR URL" => Some((FieldType::Url, "Url")),
        "SUBJECT" => Some((FieldType::Subject, "Subject")),
        "IP" => Some((FieldType::Ip, "IP")),
        _ => None,
    }
}

lazy_static! {
    static ref LINE_BREAK_PATTERN: Regex = Regex::new(r"(?i)<br />|\)</p>").unwrap();

    /// `Array ( ... )` wrapper around a text dump.
    static ref ARRAY_WRAPPER_PATTERN: Regex = Regex::new(r"(?s).*Array\s\((.*)\)").unwrap();

    /// `[Key] => ` entry marker at line start, raw or HTML-escaped.
    static ref ENTRY_MARKER_PATTERN: Regex =
        Regex::new(r"(?m)^\s*\[([^\]]+)\] =(?:&gt;|>)[ \t]*").unwrap();
}

/// Decode legacy content. Never fails; text without the body delimiter
/// yields no fields.
pub fn decode(content: &str) -> ParsedContent {
    let Some((body, field_content)) = split_content(content) else {
        return ParsedContent::default();
    };

    let mut parsed = ParsedContent::default();
    let mut fields = FieldList::new();

    for field in header_fields(&field_content) {
        fields.insert(field);
    }

    for (raw_key, value) in extract_values(&field_content) {
        let key = sanitize_text(&raw_key);
        let label = label_from_key(&key);
        match key.as_str() {
            CONSENT_KEY => {
                let value = FieldValue::from_json(&value, &FieldType::Consent);
                fields.insert(Field::new(key, &label, value, FieldType::Consent).lookup_only());
            }
            "entry_title" => parsed.entry_title = Some(value_to_string(&value)),
            "entry_permalink" => parsed.entry_permalink = Some(value_to_string(&value)),
            "entry_page" => {
                parsed.entry_page = value_to_u64(&value).and_then(|p| u32::try_from(p).ok());
            }
            "feedback_id" => parsed.feedback_id = Some(value_to_string(&value)),
            _ => fields.insert(value_field(key, &label, &value)),
        }
    }

    fields.insert(
        Field::new(COMMENT_CONTENT_KEY, "Comment Content", sanitize_text(&body), FieldType::Textarea)
            .lookup_only(),
    );

    parsed.fields = fields;
    parsed
}

/// Split into (body, fields segment); `None` without the delimiter.
fn split_content(content: &str) -> Option<(String, String)> {
    let mut parts = content.split(LEGACY_BODY_DELIMITER);
    let body = parts.next().unwrap_or_default();
    let field_content = parts.next()?;
    Some((
        body.to_string(),
        LINE_BREAK_PATTERN.replace_all(field_content, "").into_owned(),
    ))
}

/// Synthetic lookup-only fields for the well-known header lines.
fn header_fields(field_content: &str) -> Vec<Field> {
    let header_block = if field_content.contains(JSON_DATA_MARKER) {
        field_content
            .split("\nJSON_DATA")
            .next()
            .unwrap_or_default()
    } else {
        field_content
    };

    header_block
        .split('\n')
        .filter(|line| !line.is_empty() && *line != "0")
        .filter_map(|line| {
            let (name, value) = line.split_once(": ")?;
            let (field_type, label) = header_kind(name)?;
            Some(Field::new(name, label, sanitize_text(value), field_type).lookup_only())
        })
        .collect()
}

/// Key/value entries of the fields segment, in first-seen key order.
fn extract_values(field_content: &str) -> Vec<(String, Value)> {
    if field_content.contains(JSON_DATA_MARKER) {
        parse_json_data(field_content)
    } else {
        parse_array_dump(field_content)
    }
}

fn parse_json_data(field_content: &str) -> Vec<(String, Value)> {
    let json_data = field_content
        .split("\nJSON_DATA")
        .nth(1)
        .or_else(|| field_content.split(JSON_DATA_MARKER).nth(1));
    let Some(json_data) = json_data else {
        return Vec::new();
    };

    let decoded = serde_json::from_str::<Value>(json_data)
        .or_else(|_| serde_json::from_str::<Value>(&strip_slashes(json_data.trim())));

    match decoded {
        Ok(Value::Object(obj)) => obj.into_iter().collect(),
        Ok(_) => Vec::new(),
        Err(e) => {
            log::debug!("LEGACY_JSON_DATA_UNPARSEABLE error={:?}", e.to_string());
            Vec::new()
        }
    }
}

/// Scan `[Key] => Value` entries. A value runs to the next marker or the
/// end of input. A repeated key overwrites the value at its first position.
fn parse_array_dump(field_content: &str) -> Vec<(String, Value)> {
    let dump = ARRAY_WRAPPER_PATTERN.replace(field_content, "$1");

    let markers: Vec<(String, usize, usize)> = ENTRY_MARKER_PATTERN
        .captures_iter(&dump)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let key = caps.get(1)?.as_str().trim().to_string();
            Some((key, whole.start(), whole.end()))
        })
        .collect();

    let mut entries: Vec<(String, Value)> = Vec::with_capacity(markers.len());
    for (idx, (key, _, value_start)) in markers.iter().enumerate() {
        let value_end = markers
            .get(idx + 1)
            .map(|(_, next_start, _)| *next_start)
            .unwrap_or(dump.len());
        let value = Value::String(dump[*value_start..value_end].trim().to_string());
        match entries.iter_mut().find(|(existing, _)| existing == key) {
            Some(entry) => entry.1 = value,
            None => entries.push((key.clone(), value)),
        }
    }
    entries
}

/// Field for an ordinary value; upload-shaped objects become file fields.
fn value_field(key: String, label: &str, value: &Value) -> Field {
    if FileSet::is_upload_shape(value) {
        let files = FileSet::from_json(value).unwrap_or_default();
        return Field::new(key, label, FieldValue::Files(files), FieldType::File);
    }
    Field::new(key, label, FieldValue::from_json(value, &FieldType::Basic), FieldType::Basic)
}
