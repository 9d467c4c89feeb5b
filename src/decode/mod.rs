//! Generation resolver.
//!
//! Stored feedback content comes in three generations. The resolver picks the
//! decoder from the stored format marker alone and returns a uniform
//! [`ParsedContent`]. It never
//! fails: a blob that cannot be decoded yields empty fields and no metadata.

pub mod canonical;
pub mod gen2;
pub mod legacy;
pub mod repair;

use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::extraction::coerce::{get_string, value_to_u64};
use crate::logging::LogContext;
use crate::model::{Field, FieldList, FieldType, Source, SourceType};
use crate::{log_debug, log_warn};

/// Delimiter between the message body and the fields of legacy content.
pub const LEGACY_BODY_DELIMITER: &str = "<!--more-->";

/// On-disk encoding generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generation {
    Legacy,
    Gen2,
    Gen3,
}

impl Generation {
    /// Pick the generation for a stored format marker. Unknown or missing
    /// markers are legacy, whatever the content looks like.
    pub fn detect(marker: Option<&str>) -> Self {
        match marker.map(str::trim) {
            Some("v3") => Generation::Gen3,
            Some("v2") => Generation::Gen2,
            _ => Generation::Legacy,
        }
    }

    /// Marker value written alongside content of this generation.
    pub fn marker(&self) -> Option<&'static str> {
        match self {
            Generation::Legacy => None,
            Generation::Gen2 => Some("v2"),
            Generation::Gen3 => Some("v3"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Generation::Legacy => "legacy",
            Generation::Gen2 => "v2",
            Generation::Gen3 => "v3",
        }
    }
}

/// Why a blob could not be decoded. Never leaves this module's resolver.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("document is not a JSON object")]
    NotAnObject,

    #[error("content is empty")]
    EmptyContent,
}

/// Uniform decode result shared by every generation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedContent {
    pub fields: FieldList,
    pub subject: Option<String>,
    pub ip: Option<String>,
    pub entry_title: Option<String>,
    pub entry_page: Option<u32>,
    pub source_id: Option<u64>,
    pub source_type: Option<SourceType>,
    pub request_url: Option<String>,
    /// Legacy content only.
    pub entry_permalink: Option<String>,
    /// Legacy content only.
    pub feedback_id: Option<String>,
}

impl ParsedContent {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn has_file(&self) -> bool {
        self.fields.has_file()
    }

    /// Stored subject, else the first subject field.
    pub fn resolved_subject(&self) -> String {
        self.subject
            .clone()
            .unwrap_or_else(|| self.first_text_of_type(&FieldType::Subject))
    }

    /// Stored address, else a non-empty IP field.
    pub fn resolved_ip(&self) -> Option<String> {
        self.ip.clone().or_else(|| {
            Some(self.first_text_of_type(&FieldType::Ip)).filter(|ip| !ip.is_empty())
        })
    }

    fn first_text_of_type(&self, field_type: &FieldType) -> String {
        self.fields
            .first_of_type(field_type)
            .map(|f| f.value().display())
            .unwrap_or_default()
    }

    /// Where the submission came from. `parent_id` wins over the stored id.
    pub fn source(&self, parent_id: Option<u64>) -> Source {
        let request_url = self
            .request_url
            .as_deref()
            .or(self.entry_permalink.as_deref())
            .unwrap_or_default();
        Source::new(
            parent_id.or(self.source_id),
            self.entry_title.as_deref().unwrap_or_default(),
            self.entry_page.unwrap_or(1),
        )
        .with_type(self.source_type.unwrap_or_default())
        .with_request_url(request_url)
    }

    /// Decode the metadata keys and field records of a canonical document.
    ///
    /// Records rejected by `decode_field` are dropped without failing the
    /// document.
    pub(crate) fn from_document<F>(doc: &Value, decode_field: F) -> Result<Self, DecodeError>
    where
        F: Fn(&Value) -> Option<Field>,
    {
        if !doc.is_object() {
            return Err(DecodeError::NotAnObject);
        }

        let mut fields = FieldList::new();
        if let Some(records) = doc.get("fields").and_then(Value::as_array) {
            for record in records {
                match decode_field(record) {
                    Some(field) => fields.insert(field),
                    None => log::debug!("FIELD_RECORD_DROPPED reason=missing_key_value_or_label"),
                }
            }
        }

        Ok(Self {
            fields,
            subject: get_string(doc, "subject"),
            ip: get_string(doc, "ip").filter(|ip| !ip.is_empty()),
            entry_title: get_string(doc, "entry_title"),
            entry_page: doc
                .get("entry_page")
                .and_then(value_to_u64)
                .and_then(|page| u32::try_from(page).ok()),
            source_id: doc.get("source_id").and_then(value_to_u64),
            source_type: doc
                .get("source_type")
                .and_then(Value::as_str)
                .map(SourceType::parse),
            request_url: get_string(doc, "request_url"),
            entry_permalink: None,
            feedback_id: None,
        })
    }
}

/// Short SHA-256 fingerprint of a blob, safe to log.
pub fn content_fingerprint(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    hex::encode(digest)[..16].to_string()
}

/// Decode with an explicit generation. Errors are surfaced.
pub fn decode(generation: Generation, content: &str) -> Result<ParsedContent, DecodeError> {
    match generation {
        Generation::Gen3 => canonical::decode(content),
        Generation::Gen2 => gen2::decode(content),
        Generation::Legacy => Ok(legacy::decode(content)),
    }
}

/// Resolve stored content into fields and metadata.
///
/// # Examples
/// ```
/// use feedback_core::decode::resolve;
/// use feedback_core::logging::LogContext;
///
/// let parsed = resolve("not json at all", Some("v3"), &LogContext::new("doc"));
/// assert!(parsed.fields.is_empty());
/// ```
pub fn resolve(content: &str, marker: Option<&str>, ctx: &LogContext) -> ParsedContent {
    let generation = Generation::detect(marker);
    log_debug!(
        ctx,
        "RESOLVE_START",
        generation = generation.as_str(),
        content_len = content.len()
    );

    match decode(generation, content) {
        Ok(parsed) => {
            log_debug!(
                ctx,
                "RESOLVE_COMPLETE",
                generation = generation.as_str(),
                fields = parsed.fields.len()
            );
            parsed
        }
        Err(e) => {
            log_warn!(
                ctx,
                "DECODE_DEGRADED",
                generation = generation.as_str(),
                reason = e.to_string(),
                content_hash = content_fingerprint(content)
            );
            ParsedContent::default()
        }
    }
}
