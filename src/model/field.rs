//! Submitted form fields.

use std::fmt;

use serde_json::{Map, Value};

use crate::extraction::coerce::{value_to_bool, value_to_string};
use crate::security::sanitizer::decode_entities;

use super::value::FieldValue;

/// Field type discriminator. Selects which projection rules apply.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum FieldType {
    #[default]
    Basic,
    Name,
    Email,
    Url,
    Subject,
    Textarea,
    Consent,
    File,
    ImageSelect,
    Hidden,
    Ip,
    /// Any other form type (select, radio, telephone, ...), kept verbatim.
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Basic => "basic",
            FieldType::Name => "name",
            FieldType::Email => "email",
            FieldType::Url => "url",
            FieldType::Subject => "subject",
            FieldType::Textarea => "textarea",
            FieldType::Consent => "consent",
            FieldType::File => "file",
            FieldType::ImageSelect => "image-select",
            FieldType::Hidden => "hidden",
            FieldType::Ip => "ip",
            FieldType::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "" | "basic" => FieldType::Basic,
            "name" => FieldType::Name,
            "email" => FieldType::Email,
            "url" => FieldType::Url,
            "subject" => FieldType::Subject,
            "textarea" => FieldType::Textarea,
            "consent" => FieldType::Consent,
            "file" => FieldType::File,
            "image-select" => FieldType::ImageSelect,
            "hidden" => FieldType::Hidden,
            "ip" => FieldType::Ip,
            other => FieldType::Other(other.to_string()),
        }
    }

    /// Types that only carry a choice from a predefined list.
    pub fn is_choice_like(&self) -> bool {
        match self {
            FieldType::File | FieldType::ImageSelect => true,
            FieldType::Other(s) => {
                matches!(s.as_str(), "select" | "checkbox" | "checkbox-multiple" | "radio")
            }
            _ => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-form field flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMeta {
    /// `Some(false)` keeps the field out of generic compilation.
    pub render: Option<bool>,
    pub extra: Map<String, Value>,
}

impl FieldMeta {
    pub fn hidden() -> Self {
        Self {
            render: Some(false),
            extra: Map::new(),
        }
    }

    /// Objects decode; anything else (older writers stored `[]`) is empty.
    pub fn from_json(value: Option<&Value>) -> Self {
        let Some(Value::Object(obj)) = value else {
            return Self::default();
        };
        let mut extra = obj.clone();
        let render = extra.remove("render").and_then(|r| value_to_bool(&r));
        Self { render, extra }
    }

    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        if let Some(render) = self.render {
            obj.insert("render".to_string(), Value::Bool(render));
        }
        for (k, v) in &self.extra {
            obj.insert(k.clone(), v.clone());
        }
        Value::Object(obj)
    }
}

/// One submitted form field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    key: String,
    label: String,
    value: FieldValue,
    field_type: FieldType,
    meta: FieldMeta,
    form_field_id: Option<String>,
}

impl Field {
    /// Build a field. HTML entities in the label are decoded.
    pub fn new(
        key: impl Into<String>,
        label: &str,
        value: impl Into<FieldValue>,
        field_type: FieldType,
    ) -> Self {
        Self::with_stored_label(key, decode_entities(label), value, field_type)
    }

    /// Build a field whose label is kept as given. Stored records already
    /// carry decoded labels.
    pub fn with_stored_label(
        key: impl Into<String>,
        label: impl Into<String>,
        value: impl Into<FieldValue>,
        field_type: FieldType,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            value: value.into(),
            field_type,
            meta: FieldMeta::default(),
            form_field_id: None,
        }
    }

    pub fn with_meta(mut self, meta: FieldMeta) -> Self {
        self.meta = meta;
        self
    }

    /// Mark as lookup-only: excluded from generic compilation.
    pub fn lookup_only(self) -> Self {
        self.with_meta(FieldMeta::hidden())
    }

    pub fn with_form_field_id(mut self, id: impl Into<String>) -> Self {
        self.form_field_id = Some(id.into());
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    pub fn meta(&self) -> &FieldMeta {
        &self.meta
    }

    pub fn form_field_id(&self) -> Option<&str> {
        self.form_field_id.as_deref()
    }

    pub fn is_of_type(&self, field_type: &FieldType) -> bool {
        &self.field_type == field_type
    }

    pub fn is_renderable(&self) -> bool {
        self.meta.render != Some(false)
    }

    pub fn has_file(&self) -> bool {
        self.field_type == FieldType::File
            && self.value.as_files().is_some_and(|f| !f.files.is_empty())
    }

    /// Stored record form: `{key, label, value, type, meta}`.
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("key".to_string(), Value::String(self.key.clone()));
        obj.insert("label".to_string(), Value::String(self.label.clone()));
        obj.insert("value".to_string(), self.value.to_json());
        obj.insert(
            "type".to_string(),
            Value::String(self.field_type.as_str().to_string()),
        );
        obj.insert("meta".to_string(), self.meta.to_json());
        if let Some(id) = &self.form_field_id {
            obj.insert("form_field_id".to_string(), Value::String(id.clone()));
        }
        Value::Object(obj)
    }

    /// Decode a stored record. `None` when `key`, `value` or `label` is
    /// missing or null.
    pub fn from_serialized(data: &Value) -> Option<Self> {
        let obj = data.as_object()?;
        let key = match obj.get("key")? {
            Value::Null | Value::Array(_) | Value::Object(_) => return None,
            k => value_to_string(k),
        };
        let raw_value = obj.get("value").filter(|v| !v.is_null())?;
        let label = match obj.get("label")? {
            Value::Null => return None,
            Value::String(s) => s.as_str(),
            _ => "",
        };
        let field_type = obj
            .get("type")
            .and_then(Value::as_str)
            .map(FieldType::parse)
            .unwrap_or_default();

        let value = FieldValue::from_json(raw_value, &field_type);
        let mut field = Field::with_stored_label(key, label, value, field_type)
            .with_meta(FieldMeta::from_json(obj.get("meta")));
        if let Some(id) = obj.get("form_field_id").and_then(Value::as_str) {
            field = field.with_form_field_id(id);
        }
        Some(field)
    }
}

/// Ordered fields of one submission with unique keys.
///
/// Inserting an existing key replaces that field in place, so the first
/// position of a key is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldList {
    fields: Vec<Field>,
}

impl FieldList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: Field) {
        match self.fields.iter_mut().find(|f| f.key == field.key) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    pub fn as_slice(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// First field of a type, renderable or not.
    pub fn first_of_type(&self, field_type: &FieldType) -> Option<&Field> {
        self.fields.iter().find(|f| f.is_of_type(field_type))
    }

    pub fn has_type(&self, field_type: &FieldType) -> bool {
        self.first_of_type(field_type).is_some()
    }

    pub fn has_file(&self) -> bool {
        self.fields.iter().any(Field::has_file)
    }
}

impl FromIterator<Field> for FieldList {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        let mut list = FieldList::new();
        for field in iter {
            list.insert(field);
        }
        list
    }
}

impl<'a> IntoIterator for &'a FieldList {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
