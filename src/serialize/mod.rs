//! Canonical (generation-3) serializer.

use serde_json::{Map, Value};

use crate::decode::resolve;
use crate::feedback::Feedback;
use crate::logging::LogContext;
use crate::model::{FieldList, Source};

/// Encode the metadata and fields of a feedback entry as a gen-3 document.
///
/// Never fails: absent metadata becomes `null`. With `forget_ip` the
/// address is written as `null`.
pub fn to_document(feedback: &Feedback, forget_ip: bool) -> Value {
    build_document(
        feedback.subject(),
        feedback.ip(),
        feedback.source(),
        feedback.fields(),
        forget_ip,
    )
}

/// Serialize to the stored gen-3 text.
pub fn serialize(feedback: &Feedback, forget_ip: bool) -> String {
    to_document(feedback, forget_ip).to_string()
}

/// Re-encode stored content of any generation as gen-3 text.
pub fn canonicalize(content: &str, marker: Option<&str>, forget_ip: bool, ctx: &LogContext) -> String {
    let parsed = resolve(content, marker, ctx);
    build_document(
        &parsed.resolved_subject(),
        parsed.resolved_ip().as_deref(),
        &parsed.source(None),
        &parsed.fields,
        forget_ip,
    )
    .to_string()
}

fn build_document(
    subject: &str,
    ip: Option<&str>,
    source: &Source,
    fields: &FieldList,
    forget_ip: bool,
) -> Value {
    let mut doc = Map::new();
    doc.insert("subject".to_string(), Value::String(subject.to_string()));
    let ip = match ip {
        Some(ip) if !forget_ip => Value::String(ip.to_string()),
        _ => Value::Null,
    };
    doc.insert("ip".to_string(), ip);
    for (key, value) in source.to_json_entries() {
        doc.insert(key.to_string(), value);
    }
    doc.insert(
        "fields".to_string(),
        Value::Array(fields.iter().map(|f| f.to_json()).collect()),
    );
    Value::Object(doc)
}
