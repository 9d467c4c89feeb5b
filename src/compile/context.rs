//! Compilation contexts and result shapes.

use std::fmt;
use std::str::FromStr;

/// Where compiled fields are going. Selects the per-context rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Context {
    #[default]
    Default,
    /// Rendered to site visitors or admins in a page.
    Display,
    Email,
    Csv,
    Api,
    Ajax,
    SpamCheck,
    LegacyExport,
}

impl Context {
    pub fn as_str(&self) -> &'static str {
        match self {
            Context::Default => "default",
            Context::Display => "web",
            Context::Email => "email",
            Context::Csv => "csv",
            Context::Api => "api",
            Context::Ajax => "ajax",
            Context::SpamCheck => "akismet",
            Context::LegacyExport => "legacy-export",
        }
    }

    /// Visitor-facing contexts drop `hidden` fields.
    pub fn suppresses_hidden(&self) -> bool {
        matches!(self, Context::Display | Context::Ajax)
    }

    /// Only the API returns structured file objects.
    pub fn structured_files(&self) -> bool {
        matches!(self, Context::Api)
    }
}

impl FromStr for Context {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "default" => Ok(Context::Default),
            "web" | "display" => Ok(Context::Display),
            "email" => Ok(Context::Email),
            "csv" => Ok(Context::Csv),
            "api" => Ok(Context::Api),
            "ajax" => Ok(Context::Ajax),
            "akismet" | "spam-check" | "spam_check" => Ok(Context::SpamCheck),
            "legacy-export" | "legacy_export" => Ok(Context::LegacyExport),
            other => Err(format!("unknown context: {}", other)),
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result shape of a compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Shape {
    /// key → {label, value}
    #[default]
    All,
    /// Ordered (label, value) pairs.
    Pairs,
    Values,
    Labels,
    /// key → value
    KeyValue,
    /// label → value, repeated labels suffixed ` (2)`, ` (3)`, ...
    LabelValue,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::All => "all",
            Shape::Pairs => "label|value",
            Shape::Values => "value",
            Shape::Labels => "label",
            Shape::KeyValue => "key-value",
            Shape::LabelValue => "label-value",
        }
    }
}

impl FromStr for Shape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" | "default" => Ok(Shape::All),
            "label|value" | "pairs" => Ok(Shape::Pairs),
            "value" | "values" => Ok(Shape::Values),
            "label" | "labels" => Ok(Shape::Labels),
            "key-value" | "key_value" => Ok(Shape::KeyValue),
            "label-value" | "label_value" => Ok(Shape::LabelValue),
            other => Err(format!("unknown shape: {}", other)),
        }
    }
}
