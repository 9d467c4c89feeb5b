//! Field compiler.
//!
//! Turns an ordered field list into the shape a consumer asked for, applying
//! the rules of the target context:
//!
//! - fields with `meta.render == false` are never compiled
//! - `hidden` fields are dropped for visitor-facing contexts
//! - the API gets structured file objects, everything else a text summary
//! - repeated labels get ` (n)` suffixes in label-keyed shapes

use std::collections::HashMap;

use lazy_static::lazy_static;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::FeedbackConfig;
use crate::model::{format_size, Field, FieldList, FieldType, FieldValue, FileEntry, FileSet};

use super::context::{Context, Shape};

/// Label used by the API for fields without one.
pub const API_FALLBACK_LABEL: &str = "Field";

lazy_static! {
    static ref DEFAULT_CONFIG: FeedbackConfig = FeedbackConfig::default();
}

/// One file as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileView {
    pub file_id: u64,
    pub name: String,
    /// Human-readable size, e.g. `2 KB`.
    pub size: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub url: String,
    pub is_previewable: bool,
}

/// File field value as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilesView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
    pub files: Vec<FileView>,
}

/// Value of one compiled field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RenderedValue {
    Text(String),
    Files(FilesView),
}

impl RenderedValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RenderedValue::Text(s) => Some(s),
            RenderedValue::Files(_) => None,
        }
    }

    /// Text form; file views flatten to `name (size)` entries.
    pub fn to_text(&self) -> String {
        match self {
            RenderedValue::Text(s) => s.clone(),
            RenderedValue::Files(view) => view
                .files
                .iter()
                .map(|f| format!("{} ({})", f.name, f.size))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RenderedValue::Text(s) => s.is_empty(),
            RenderedValue::Files(view) => view.files.is_empty(),
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl From<&str> for RenderedValue {
    fn from(s: &str) -> Self {
        RenderedValue::Text(s.to_string())
    }
}

impl From<String> for RenderedValue {
    fn from(s: String) -> Self {
        RenderedValue::Text(s)
    }
}

/// Label and value of one compiled field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledField {
    pub label: String,
    pub value: RenderedValue,
}

/// Compiled fields in the requested shape. Keyed shapes keep insertion
/// order; a repeated key replaces the value at its first position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    All(Vec<(String, CompiledField)>),
    Pairs(Vec<CompiledField>),
    Values(Vec<RenderedValue>),
    Labels(Vec<String>),
    KeyValue(Vec<(String, RenderedValue)>),
    LabelValue(Vec<(String, RenderedValue)>),
}

impl Projection {
    fn empty(shape: Shape) -> Self {
        match shape {
            Shape::All => Projection::All(Vec::new()),
            Shape::Pairs => Projection::Pairs(Vec::new()),
            Shape::Values => Projection::Values(Vec::new()),
            Shape::Labels => Projection::Labels(Vec::new()),
            Shape::KeyValue => Projection::KeyValue(Vec::new()),
            Shape::LabelValue => Projection::LabelValue(Vec::new()),
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            Projection::All(_) => Shape::All,
            Projection::Pairs(_) => Shape::Pairs,
            Projection::Values(_) => Shape::Values,
            Projection::Labels(_) => Shape::Labels,
            Projection::KeyValue(_) => Shape::KeyValue,
            Projection::LabelValue(_) => Shape::LabelValue,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Projection::All(v) => v.len(),
            Projection::Pairs(v) => v.len(),
            Projection::Values(v) => v.len(),
            Projection::Labels(v) => v.len(),
            Projection::KeyValue(v) | Projection::LabelValue(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys of a keyed shape, in order. Empty for list shapes.
    pub fn keys(&self) -> Vec<&str> {
        match self {
            Projection::All(v) => v.iter().map(|(k, _)| k.as_str()).collect(),
            Projection::KeyValue(v) | Projection::LabelValue(v) => {
                v.iter().map(|(k, _)| k.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Value under a key of a keyed shape.
    pub fn get(&self, key: &str) -> Option<&RenderedValue> {
        match self {
            Projection::All(v) => v.iter().find(|(k, _)| k == key).map(|(_, f)| &f.value),
            Projection::KeyValue(v) | Projection::LabelValue(v) => {
                v.iter().find(|(k, _)| k == key).map(|(_, value)| value)
            }
            _ => None,
        }
    }

    /// Keyed shapes become objects, list shapes arrays.
    pub fn to_json(&self) -> Value {
        match self {
            Projection::All(v) => Value::Object(
                v.iter()
                    .map(|(k, f)| (k.clone(), serde_json::to_value(f).unwrap_or(Value::Null)))
                    .collect::<Map<String, Value>>(),
            ),
            Projection::Pairs(v) => Value::Array(
                v.iter()
                    .map(|f| serde_json::to_value(f).unwrap_or(Value::Null))
                    .collect(),
            ),
            Projection::Values(v) => Value::Array(v.iter().map(RenderedValue::to_json).collect()),
            Projection::Labels(v) => {
                Value::Array(v.iter().map(|l| Value::String(l.clone())).collect())
            }
            Projection::KeyValue(v) | Projection::LabelValue(v) => Value::Object(
                v.iter()
                    .map(|(k, value)| (k.clone(), value.to_json()))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }
}

fn insert_entry<V>(entries: &mut Vec<(String, V)>, key: String, value: V) {
    match entries.iter_mut().find(|(existing, _)| *existing == key) {
        Some(entry) => entry.1 = value,
        None => entries.push((key, value)),
    }
}

/// Label of a field in a context. `count > 1` appends ` (count)`.
pub fn field_label(field: &Field, context: Context, count: usize) -> String {
    let postfix = if count > 1 {
        format!(" ({})", count)
    } else {
        String::new()
    };
    if context == Context::Api && field.label().is_empty() {
        return format!("{}{}", API_FALLBACK_LABEL, postfix);
    }
    format!("{}{}", field.label(), postfix)
}

/// Compiles field lists against a configuration.
#[derive(Debug, Clone, Copy)]
pub struct Compiler<'a> {
    config: &'a FeedbackConfig,
}

impl<'a> Compiler<'a> {
    pub fn new(config: &'a FeedbackConfig) -> Self {
        Self { config }
    }

    pub fn compile(&self, fields: &FieldList, context: Context, shape: Shape) -> Projection {
        let mut projection = Projection::empty(shape);
        let mut label_counts: HashMap<String, usize> = HashMap::new();

        for field in fields {
            if !field.is_renderable() {
                continue;
            }
            if context.suppresses_hidden() && field.is_of_type(&FieldType::Hidden) {
                continue;
            }

            let label = field_label(field, context, 1);
            let count = {
                let count = label_counts.entry(label.clone()).or_insert(0);
                *count += 1;
                *count
            };

            match &mut projection {
                Projection::All(entries) => {
                    let value = self.render_value(field, context);
                    insert_entry(
                        entries,
                        field.key().to_string(),
                        CompiledField { label, value },
                    );
                }
                Projection::Pairs(entries) => {
                    let value = self.render_value(field, context);
                    entries.push(CompiledField { label, value });
                }
                Projection::Values(entries) => entries.push(self.render_value(field, context)),
                Projection::Labels(entries) => entries.push(label),
                Projection::KeyValue(entries) => {
                    let value = self.render_value(field, context);
                    insert_entry(entries, field.key().to_string(), value);
                }
                Projection::LabelValue(entries) => {
                    let value = self.render_value(field, context);
                    insert_entry(entries, field_label(field, context, count), value);
                }
            }
        }

        projection
    }

    /// Rendered value of one field in a context.
    pub fn render_value(&self, field: &Field, context: Context) -> RenderedValue {
        match field.value() {
            FieldValue::Files(files) if context.structured_files() => {
                RenderedValue::Files(self.files_view(files))
            }
            value => RenderedValue::Text(value.display()),
        }
    }

    fn files_view(&self, files: &FileSet) -> FilesView {
        FilesView {
            field_id: files.field_id.clone(),
            files: files.files.iter().map(|f| self.file_view(f)).collect(),
        }
    }

    fn file_view(&self, file: &FileEntry) -> FileView {
        FileView {
            file_id: file.file_id.trim().parse().unwrap_or(0),
            name: file.display_name().to_string(),
            size: format_size(file.size),
            mime_type: file.mime_type.clone(),
            url: self.config.download_url(&file.file_id),
            is_previewable: file
                .extension()
                .is_some_and(|ext| self.config.is_previewable_extension(&ext)),
        }
    }
}

/// Render one field with the default configuration.
pub fn render_value(field: &Field, context: Context) -> RenderedValue {
    Compiler::new(&DEFAULT_CONFIG).render_value(field, context)
}

/// Compile with the default configuration.
pub fn compile(fields: &FieldList, context: Context, shape: Shape) -> Projection {
    Compiler::new(&DEFAULT_CONFIG).compile(fields, context, shape)
}
