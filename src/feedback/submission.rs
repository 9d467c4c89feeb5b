//! Live form submissions: the write path.
//!
//! A submission is built directly from the posted values and the form's
//! field definitions. Nothing is parsed except the JSON-encoded file and
//! image-select payloads the form posts for those field types.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::extraction::coerce::{get_string, value_to_u64};
use crate::model::{Choice, ChoiceSet, FieldType, FieldValue, FileEntry, FileSet, Source};
use crate::security::sanitizer::{sanitize_text, strip_slashes};

/// One field of a form definition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FormField {
    pub id: String,
    pub label: String,
    #[serde(rename = "type", deserialize_with = "de_field_type")]
    pub field_type: FieldType,
    /// Layout-only fields (dividers, page breaks) are not stored.
    #[serde(default = "default_true")]
    pub renderable: bool,
}

fn default_true() -> bool {
    true
}

fn de_field_type<'de, D>(deserializer: D) -> std::result::Result<FieldType, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(FieldType::parse(&raw))
}

impl FormField {
    pub fn new(id: &str, label: &str, field_type: FieldType) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            field_type,
            renderable: true,
        }
    }
}

/// The form a submission was posted to.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FormDefinition {
    pub fields: Vec<FormField>,
    /// Subject configured on the form, overridden by a filled subject field.
    pub subject: String,
    pub first_name_field_id: Option<String>,
    pub last_name_field_id: Option<String>,
}

impl FormDefinition {
    /// Id of the first renderable field of a type.
    pub fn field_id_of_type(&self, field_type: &FieldType) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.renderable && &f.field_type == field_type)
            .map(|f| f.id.as_str())
    }
}

/// A posted value: one string, or several for multi-value inputs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PostedValue {
    Single(String),
    Multiple(Vec<String>),
}

impl PostedValue {
    fn items(&self) -> Vec<&str> {
        match self {
            PostedValue::Single(s) => vec![s.as_str()],
            PostedValue::Multiple(items) => items.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for PostedValue {
    fn from(s: &str) -> Self {
        PostedValue::Single(s.to_string())
    }
}

impl From<Vec<&str>> for PostedValue {
    fn from(items: Vec<&str>) -> Self {
        PostedValue::Multiple(items.into_iter().map(str::to_string).collect())
    }
}

/// Everything received with one form post.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// Posted values keyed by form field id.
    pub values: HashMap<String, PostedValue>,
    pub ip: Option<String>,
    pub source: Source,
    pub created_at: NaiveDateTime,
}

impl Submission {
    pub fn new(source: Source, created_at: NaiveDateTime) -> Self {
        Self {
            values: HashMap::new(),
            ip: None,
            source,
            created_at,
        }
    }

    pub fn with_value(mut self, field_id: &str, value: impl Into<PostedValue>) -> Self {
        self.values.insert(field_id.to_string(), value.into());
        self
    }

    pub fn with_ip(mut self, ip: &str) -> Self {
        self.ip = Some(ip.to_string());
        self
    }

    /// Field value for a form field of the given type.
    pub fn field_value(&self, field_id: &str, field_type: &FieldType) -> FieldValue {
        let posted = self.values.get(field_id);
        match field_type {
            FieldType::File => FieldValue::Files(FileSet {
                field_id: Some(field_id.to_string()),
                files: posted.map(|p| parse_posted_files(&p.items())).unwrap_or_default(),
            }),
            FieldType::ImageSelect => FieldValue::Choices(ChoiceSet::new(
                posted.map(|p| parse_posted_choices(&p.items())).unwrap_or_default(),
            )),
            _ => match posted {
                Some(PostedValue::Single(s)) => FieldValue::Text(sanitize_text(s)),
                Some(PostedValue::Multiple(items)) => {
                    FieldValue::List(items.iter().map(|s| sanitize_text(s)).collect())
                }
                None => FieldValue::Text(String::new()),
            },
        }
    }

    /// Sanitized single-line text of a posted value, empty when absent.
    pub fn text_value(&self, field_id: Option<&str>) -> String {
        field_id
            .and_then(|id| self.values.get(id))
            .map(|posted| match posted {
                PostedValue::Single(s) => sanitize_text(s),
                PostedValue::Multiple(items) => sanitize_text(&items.join(", ")),
            })
            .unwrap_or_default()
    }
}

/// Each posted item is a JSON-encoded file description.
fn parse_posted_files(items: &[&str]) -> Vec<FileEntry> {
    items
        .iter()
        .filter_map(|raw| serde_json::from_str::<Value>(&strip_slashes(raw)).ok())
        .filter_map(|decoded| {
            let normalized = json!({
                "file_id": get_string(&decoded, "file_id").map(|s| sanitize_text(&s)).unwrap_or_default(),
                "name": get_string(&decoded, "name").map(|s| sanitize_text(&s)).unwrap_or_default(),
                "size": decoded.get("size").and_then(value_to_u64).unwrap_or(0),
                "type": get_string(&decoded, "type").map(|s| sanitize_text(&s)).unwrap_or_default(),
            });
            FileEntry::from_json(&normalized)
        })
        .collect()
}

/// Each posted item is a JSON-encoded choice.
fn parse_posted_choices(items: &[&str]) -> Vec<Choice> {
    items
        .iter()
        .filter_map(|raw| serde_json::from_str::<Choice>(&strip_slashes(raw)).ok())
        .collect()
}
