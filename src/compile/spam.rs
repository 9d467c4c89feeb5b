//! Variables handed to the spam checker.

use lazy_static::lazy_static;
use regex::Regex;

use crate::feedback::Feedback;

use super::context::Context;
use super::projection::render_value;

const FIELD_PREFIX: &str = "contact_form_field_";

lazy_static! {
    static ref SLUG_SEPARATOR: Regex = Regex::new(r"[^a-z0-9_]+").unwrap();
}

/// Lowercase label with runs of other characters collapsed to `-`.
pub fn label_slug(label: &str) -> String {
    SLUG_SEPARATOR
        .replace_all(&label.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

/// Ordered key/value pairs describing a submission to a spam checker.
///
/// Choice-like fields carry nothing useful for spam filtering and are
/// skipped, as are values already present under another key.
pub fn spam_check_vars(feedback: &Feedback) -> Vec<(String, String)> {
    let author = feedback.author();
    let mut vars: Vec<(String, String)> = vec![
        ("comment_author".to_string(), author.name.clone()),
        ("comment_author_email".to_string(), author.email.clone()),
        ("comment_author_url".to_string(), author.url.clone()),
        ("contact_form_subject".to_string(), feedback.subject().to_string()),
        (
            "comment_author_ip".to_string(),
            feedback.ip().unwrap_or_default().to_string(),
        ),
    ];
    if !feedback.comment_content().is_empty() {
        vars.push((
            "comment_content".to_string(),
            feedback.comment_content().to_string(),
        ));
    }

    for field in feedback.fields() {
        if field.field_type().is_choice_like() {
            continue;
        }
        let value = render_value(field, Context::SpamCheck).to_text();
        if !value.is_empty() && vars.iter().any(|(_, existing)| *existing == value) {
            continue;
        }
        let key = format!("{}{}", FIELD_PREFIX, label_slug(field.label()));
        match vars.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => vars.push((key, value)),
        }
    }

    vars
}
