//! HTML lines for notification emails.

use crate::model::{format_size, Field, FieldList, FieldValue, FileSet};
use crate::security::sanitizer::{escape_html, nl2br, sanitize_text, strip_tags};

use super::context::Context;
use super::projection::field_label;

/// One `<p>` line per visible field, in field order.
pub fn email_lines(fields: &FieldList) -> Vec<String> {
    fields
        .iter()
        .filter(|field| field.is_renderable())
        .map(email_line)
        .collect()
}

/// Render one field as an email line.
pub fn email_line(field: &Field) -> String {
    let label = escape_html(&sanitize_text(&field_label(field, Context::Email, 1)));
    let value = email_value(field.value());
    if label.is_empty() {
        format!("<p><span>{}</span></p>", value)
    } else {
        format!(
            "<p><strong>{}</strong><br /><span>{}</span></p>",
            label_with_colon(&label),
            value
        )
    }
}

/// Labels end in exactly one colon, unless they are a question.
pub fn label_with_colon(label: &str) -> String {
    if label.ends_with('?') {
        return label.to_string();
    }
    format!("{}:", label.trim_end_matches([':', '.']))
}

fn email_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Files(files) => email_files(files),
        other => {
            let text = escape_html(&strip_tags(&other.display()));
            nl2br(&text.replace('[', "&#91;").replace(']', "&#93;"))
        }
    }
}

fn email_files(files: &FileSet) -> String {
    files
        .files
        .iter()
        .map(|file| {
            format!(
                "{} <span class=\"feedback-file-size\">({})</span>",
                escape_html(file.display_name()),
                escape_html(&format_size(file.size))
            )
        })
        .collect::<Vec<_>>()
        .join("<br>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldType;
    use serde_json::json;

    #[test]
    fn test_label_colon_rules() {
        assert_eq!(label_with_colon("Name"), "Name:");
        assert_eq!(label_with_colon("Name:"), "Name:");
        assert_eq!(label_with_colon("I agree."), "I agree:");
        assert_eq!(label_with_colon("Coming?"), "Coming?");
    }

    #[test]
    fn test_text_line() {
        let field = Field::new("1_Msg", "Message", "<b>Hi</b> [x]\nbye & co", FieldType::Textarea);
        assert_eq!(
            email_line(&field),
            "<p><strong>Message:</strong><br /><span>Hi &#91;x&#93;<br />\nbye &amp; co</span></p>"
        );
    }

    #[test]
    fn test_unlabeled_line() {
        let field = Field::new("2_", "", "plain", FieldType::Basic);
        assert_eq!(email_line(&field), "<p><span>plain</span></p>");
    }

    #[test]
    fn test_file_line() {
        let field = Field::from_serialized(&json!({
            "key": "3_Files", "label": "Files", "type": "file",
            "value": {"files": [
                {"file_id": "1", "name": "a<b>.png", "size": 2048, "type": "image/png"},
                {"file_id": "2", "name": "", "size": 10, "type": "text/plain"}
            ]}
        }))
        .unwrap();
        assert_eq!(
            email_line(&field),
            "<p><strong>Files:</strong><br /><span>a&lt;b&gt;.png <span class=\"feedback-file-size\">(2 KB)</span><br>Attached file <span class=\"feedback-file-size\">(10 B)</span></span></p>"
        );
    }

    #[test]
    fn test_lines_skip_lookup_only_fields() {
        let fields: FieldList = vec![
            Field::new("AUTHOR", "Author", "Bob", FieldType::Name).lookup_only(),
            Field::new("1_Name", "Name", "Bob", FieldType::Name),
        ]
        .into_iter()
        .collect();
        assert_eq!(email_lines(&fields).len(), 1);
    }
}
