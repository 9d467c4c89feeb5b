//! Submitted field values.
//!
//! A value is one of a scalar string, a list of strings, a file-attachment
//! set, an image/choice selection, or a structured object kept verbatim.
//! Every projection switches on this tag.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::extraction::coerce::{get_string, value_to_string, value_to_u64};

use super::field::FieldType;

/// Marker stored in the `type` key of image-select values.
pub const IMAGE_SELECT_MARKER: &str = "image-select";

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Files(FileSet),
    Choices(ChoiceSet),
    /// Structured value of a type this crate does not model (url, rating).
    Object(Map<String, Value>),
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Text(String::new())
    }
}

impl FieldValue {
    /// Decode a stored JSON value, using the field type to pick the shape.
    pub fn from_json(value: &Value, field_type: &FieldType) -> Self {
        match field_type {
            FieldType::File => {
                return FieldValue::Files(FileSet::from_json(value).unwrap_or_default());
            }
            FieldType::ImageSelect => {
                if let Some(choices) = ChoiceSet::from_json(value) {
                    return FieldValue::Choices(choices);
                }
            }
            _ => {}
        }

        match value {
            Value::Array(items) => FieldValue::List(items.iter().map(value_to_string).collect()),
            Value::Object(obj) => {
                if FileSet::is_upload_shape(value) {
                    if let Some(files) = FileSet::from_json(value) {
                        return FieldValue::Files(files);
                    }
                }
                if obj.get("type").and_then(Value::as_str) == Some(IMAGE_SELECT_MARKER) {
                    if let Some(choices) = ChoiceSet::from_json(value) {
                        return FieldValue::Choices(choices);
                    }
                }
                FieldValue::Object(obj.clone())
            }
            scalar => FieldValue::Text(value_to_string(scalar)),
        }
    }

    /// Encode for storage.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::List(items) => json!(items),
            FieldValue::Files(files) => files.to_json(),
            FieldValue::Choices(choices) => choices.to_json(),
            FieldValue::Object(obj) => Value::Object(obj.clone()),
        }
    }

    /// Flattened text form used by every non-API projection.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::List(items) => items.join(", "),
            FieldValue::Files(files) => files.summary(),
            FieldValue::Choices(choices) => choices.summary(),
            FieldValue::Object(obj) => object_display(obj),
        }
    }

    pub fn as_files(&self) -> Option<&FileSet> {
        match self {
            FieldValue::Files(files) => Some(files),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::List(items) => items.is_empty(),
            FieldValue::Files(files) => files.files.is_empty(),
            FieldValue::Choices(choices) => choices.choices.is_empty(),
            FieldValue::Object(obj) => obj.is_empty(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

/// Url and rating values carry a `displayValue`; fall back to `url`, then JSON.
fn object_display(obj: &Map<String, Value>) -> String {
    ["displayValue", "url"]
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| Value::Object(obj.clone()).to_string())
}

/// One uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub file_id: String,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
}

impl FileEntry {
    /// Decode an entry; `None` when `file_id` or `size` is missing.
    pub fn from_json(value: &Value) -> Option<Self> {
        let file_id = get_string(value, "file_id").filter(|id| !id.is_empty())?;
        let size = value.get("size").and_then(value_to_u64)?;
        Some(Self {
            file_id,
            name: get_string(value, "name").unwrap_or_default(),
            size,
            mime_type: get_string(value, "type").unwrap_or_default(),
        })
    }

    pub fn to_json(&self) -> Value {
        json!({
            "file_id": self.file_id,
            "name": self.name,
            "size": self.size,
            "type": self.mime_type,
        })
    }

    /// Name shown to people; unnamed uploads get a generic caption.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "Attached file"
        } else {
            &self.name
        }
    }

    /// Lowercased extension of the file name.
    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.name.rsplit_once('.')?;
        if ext.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }

    /// All four attributes present, the bar for listing attachments.
    pub fn is_complete(&self) -> bool {
        !self.file_id.is_empty() && !self.name.is_empty() && self.size > 0 && !self.mime_type.is_empty()
    }
}

/// File-attachment set of a file field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    pub field_id: Option<String>,
    pub files: Vec<FileEntry>,
}

impl FileSet {
    pub fn new(files: Vec<FileEntry>) -> Self {
        Self {
            field_id: None,
            files,
        }
    }

    /// Legacy upload shape: non-empty `field_id` (or `file_id`) plus a `files` array.
    pub fn is_upload_shape(value: &Value) -> bool {
        let has_id = ["field_id", "file_id"]
            .iter()
            .any(|key| get_string(value, key).is_some_and(|id| !id.is_empty()));
        has_id && value.get("files").is_some_and(Value::is_array)
    }

    /// Decode `{files: [...]}`, dropping incomplete entries.
    pub fn from_json(value: &Value) -> Option<Self> {
        let raw_files = value.get("files")?.as_array()?;
        let files = raw_files
            .iter()
            .filter_map(|raw| {
                let entry = FileEntry::from_json(raw);
                if entry.is_none() {
                    log::debug!("FILE_ENTRY_DROPPED reason=missing_file_id_or_size");
                }
                entry
            })
            .collect();
        Some(Self {
            field_id: get_string(value, "field_id").filter(|id| !id.is_empty()),
            files,
        })
    }

    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        if let Some(field_id) = &self.field_id {
            obj.insert("field_id".to_string(), Value::String(field_id.clone()));
        }
        obj.insert(
            "files".to_string(),
            Value::Array(self.files.iter().map(FileEntry::to_json).collect()),
        );
        Value::Object(obj)
    }

    /// `name (size), name (size)` summary.
    pub fn summary(&self) -> String {
        self.files
            .iter()
            .map(|f| format!("{} ({})", f.display_name(), format_size(f.size)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Image attached to a choice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoiceImage {
    #[serde(default)]
    pub src: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One selected image/choice option.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// Letter code shown to the submitter (`A`, `B`, ...).
    #[serde(default)]
    pub perceived: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, rename = "showLabels")]
    pub show_labels: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ChoiceImage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Choice {
    pub fn display(&self) -> String {
        if self.show_labels && !self.label.is_empty() {
            format!("{} - {}", self.perceived, self.label)
        } else {
            self.perceived.clone()
        }
    }
}

/// Image-select value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChoiceSet {
    pub choices: Vec<Choice>,
}

impl ChoiceSet {
    pub fn new(choices: Vec<Choice>) -> Self {
        Self { choices }
    }

    /// Decode `{type: "image-select", choices: [...]}`; choices that do not
    /// decode are skipped.
    pub fn from_json(value: &Value) -> Option<Self> {
        let raw = value.get("choices")?.as_array()?;
        let choices = raw
            .iter()
            .filter_map(|c| serde_json::from_value::<Choice>(c.clone()).ok())
            .collect();
        Some(Self { choices })
    }

    pub fn to_json(&self) -> Value {
        let choices: Vec<Value> = self
            .choices
            .iter()
            .filter_map(|c| serde_json::to_value(c).ok())
            .collect();
        json!({
            "type": IMAGE_SELECT_MARKER,
            "choices": choices,
        })
    }

    pub fn summary(&self) -> String {
        self.choices
            .iter()
            .map(Choice::display)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Human-readable size with 1024-based units rounded to whole numbers.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [(&str, u64); 4] = [
        ("TB", 1 << 40),
        ("GB", 1 << 30),
        ("MB", 1 << 20),
        ("KB", 1 << 10),
    ];
    for (unit, quant) in UNITS {
        if bytes >= quant {
            let scaled = (bytes as f64 / quant as f64).round() as u64;
            return format!("{} {}", scaled, unit);
        }
    }
    format!("{} B", bytes)
}
