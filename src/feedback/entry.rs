//! The feedback aggregate.
//!
//! A [`Feedback`] is one form response: its ordered fields plus the author,
//! source and request metadata assembled around them. It is built either
//! from a stored record (decoding the content) or from a live submission.
//! After construction only the status changes.

use chrono::NaiveDateTime;
use sha2::{Digest, Sha256};

use crate::compile::{self, Compiler, Context, Projection, RenderedValue, Shape};
use crate::config::FeedbackConfig;
use crate::decode::resolve;
use crate::extraction::coerce::is_truthy;
use crate::logging::LogContext;
use crate::model::{Author, Field, FieldList, FieldType, FileEntry, Source};
use crate::security::sanitizer::sanitize_text;
use crate::storage::models::{StoredRecord, TIMESTAMP_FORMAT};
use crate::log_debug;

use super::status::FeedbackStatus;
use super::submission::{FormDefinition, Submission};

/// Field types the legacy extra-values projection treats as well known.
const WELL_KNOWN_TYPES: [FieldType; 6] = [
    FieldType::Email,
    FieldType::Name,
    FieldType::Url,
    FieldType::Subject,
    FieldType::Textarea,
    FieldType::Ip,
];

#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    id: Option<u64>,
    fields: FieldList,
    author: Author,
    source: Source,
    subject: String,
    ip: Option<String>,
    comment_content: String,
    consent: bool,
    has_file: bool,
    status: FeedbackStatus,
    created_at: NaiveDateTime,
    title: String,
    legacy_id: String,
}

impl Feedback {
    /// Rebuild a feedback entry from a stored record.
    pub fn from_record(record: &StoredRecord, ctx: &LogContext) -> Self {
        let ctx = ctx.with_record(record.id);
        let parsed = resolve(&record.content, record.format_marker.as_deref(), &ctx);
        let source = parsed.source(record.parent_id);
        let ip = parsed.resolved_ip();
        let subject = parsed.resolved_subject();
        let fields = parsed.fields;

        let author = Author::new(
            &sanitize_text(&first_text_of_type(&fields, &FieldType::Name)),
            &sanitize_text(&first_text_of_type(&fields, &FieldType::Email)),
            &sanitize_text(&first_text_of_type(&fields, &FieldType::Url)),
        );
        let comment_content = first_text_of_type(&fields, &FieldType::Textarea);
        let consent = is_truthy(&first_text_of_type(&fields, &FieldType::Consent));

        let title = if record.title.is_empty() {
            default_title(&author, &record.created_at)
        } else {
            record.title.clone()
        };
        let legacy_id = if record.slug.is_empty() {
            legacy_id_for(&title)
        } else {
            record.slug.clone()
        };

        log_debug!(
            ctx,
            "FEEDBACK_LOADED",
            fields = fields.len(),
            has_file = fields.has_file(),
            status = record.status.as_str()
        );

        Self {
            id: Some(record.id),
            has_file: fields.has_file(),
            fields,
            author,
            source,
            subject,
            ip,
            comment_content,
            consent,
            status: record.status.clone(),
            created_at: record.created_at,
            title,
            legacy_id,
        }
    }

    /// Build a feedback entry from a live form submission.
    pub fn from_submission(submission: &Submission, form: &FormDefinition, ctx: &LogContext) -> Self {
        let mut fields = FieldList::new();
        let mut position = 1;
        for form_field in form.fields.iter().filter(|f| f.renderable) {
            let label = sanitize_text(&form_field.label);
            let key = format!("{}_{}", position, label);
            let value = submission.field_value(&form_field.id, &form_field.field_type);
            fields.insert(
                Field::new(key, &label, value, form_field.field_type.clone())
                    .with_form_field_id(form_field.id.as_str()),
            );
            position += 1;
        }

        let subject_value =
            submission.text_value(form.field_id_of_type(&FieldType::Subject));
        let subject = if subject_value.is_empty() {
            form.subject.clone()
        } else {
            subject_value
        };

        let author = Author::new(
            &submission.text_value(form.field_id_of_type(&FieldType::Name)),
            &submission.text_value(form.field_id_of_type(&FieldType::Email)),
            &submission.text_value(form.field_id_of_type(&FieldType::Url)),
        )
        .with_names(
            Some(submission.text_value(form.first_name_field_id.as_deref())),
            Some(submission.text_value(form.last_name_field_id.as_deref())),
        );

        let comment_content = submission.text_value(form.field_id_of_type(&FieldType::Textarea));
        let consent = is_truthy(&submission.text_value(form.field_id_of_type(&FieldType::Consent)));

        let title = default_title(&author, &submission.created_at);
        let legacy_id = legacy_id_for(&title);

        log_debug!(
            ctx,
            "FEEDBACK_SUBMITTED",
            fields = fields.len(),
            has_file = fields.has_file()
        );

        Self {
            id: None,
            has_file: fields.has_file(),
            fields,
            author,
            source: submission.source.clone(),
            subject,
            ip: submission.ip.clone().filter(|ip| !ip.is_empty()),
            comment_content,
            consent,
            status: FeedbackStatus::Publish,
            created_at: submission.created_at,
            title,
            legacy_id,
        }
    }

    // Accessors

    /// Record id, once stored.
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }

    pub fn fields(&self) -> &FieldList {
        &self.fields
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    /// Author name, falling back to the email.
    pub fn author_display_name(&self) -> &str {
        self.author.display_name()
    }

    pub fn author_avatar_url(&self) -> Option<String> {
        self.author.avatar_url()
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn ip(&self) -> Option<&str> {
        self.ip.as_deref()
    }

    pub fn comment_content(&self) -> &str {
        &self.comment_content
    }

    pub fn has_consent(&self) -> bool {
        self.consent
    }

    pub fn has_file(&self) -> bool {
        self.has_file
    }

    pub fn status(&self) -> &FeedbackStatus {
        &self.status
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    /// `created_at` in storage format.
    pub fn time(&self) -> String {
        self.created_at.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn legacy_id(&self) -> &str {
        &self.legacy_id
    }

    /// Uploaded files with every attribute present.
    pub fn files(&self) -> Vec<&FileEntry> {
        self.fields
            .iter()
            .filter(|f| f.is_of_type(&FieldType::File))
            .filter_map(|f| f.value().as_files())
            .flat_map(|set| set.files.iter())
            .filter(|file| file.is_complete())
            .collect()
    }

    pub fn entry_id(&self) -> Option<u64> {
        self.source.id
    }

    pub fn entry_title(&self) -> &str {
        &self.source.title
    }

    pub fn entry_permalink(&self) -> String {
        self.source.permalink()
    }

    pub fn entry_short_permalink(&self) -> String {
        self.source.relative_permalink()
    }

    pub fn page_number(&self) -> u32 {
        self.source.page_number
    }

    // Lookups

    /// First field of a type, including lookup-only fields.
    pub fn first_field_of_type(&self, field_type: &FieldType) -> Option<&Field> {
        self.fields.first_of_type(field_type)
    }

    /// Rendered value of the first field of a type, empty when absent.
    pub fn first_value_of_type(&self, field_type: &FieldType, context: Context) -> String {
        self.first_field_of_type(field_type)
            .map(|f| self.render(f, context).to_text())
            .unwrap_or_default()
    }

    pub fn has_field_type(&self, field_type: &FieldType) -> bool {
        self.fields.has_type(field_type)
    }

    /// Rendered value of the first field with this label, empty when absent.
    pub fn field_value_by_label(&self, label: &str, context: Context) -> String {
        self.fields
            .iter()
            .find(|f| compile::field_label(f, context, 1) == label)
            .map(|f| self.render(f, context).to_text())
            .unwrap_or_default()
    }

    pub fn field_by_form_field_id(&self, id: &str) -> Option<&Field> {
        if id.is_empty() {
            return None;
        }
        self.fields.iter().find(|f| f.form_field_id() == Some(id))
    }

    pub fn field_value_by_form_field_id(&self, id: &str, context: Context) -> String {
        self.field_by_form_field_id(id)
            .map(|f| self.render(f, context).to_text())
            .unwrap_or_default()
    }

    // Projections

    pub fn compiled_fields(&self, context: Context, shape: Shape) -> Projection {
        compile::compile(&self.fields, context, shape)
    }

    /// Compile with a configuration (download URLs, previewable types).
    pub fn compiled_fields_with(
        &self,
        config: &FeedbackConfig,
        context: Context,
        shape: Shape,
    ) -> Projection {
        Compiler::new(config).compile(&self.fields, context, shape)
    }

    /// Values describing where the form was submitted from.
    pub fn entry_values(&self) -> Vec<(String, String)> {
        let mut values = vec![
            (
                "email_marketing_consent".to_string(),
                if self.consent { "yes" } else { "no" }.to_string(),
            ),
            ("entry_title".to_string(), self.source.title.clone()),
            ("entry_permalink".to_string(), self.source.permalink()),
            ("feedback_id".to_string(), self.legacy_id.clone()),
        ];
        if self.source.page_number > 1 {
            values.push(("entry_page".to_string(), self.source.page_number.to_string()));
        }
        values
    }

    /// Key/value compilation followed by the entry values.
    pub fn all_values(&self, context: Context) -> Vec<(String, String)> {
        let mut values: Vec<(String, String)> = match self.compiled_fields(context, Shape::KeyValue) {
            Projection::KeyValue(entries) => entries
                .into_iter()
                .map(|(key, value)| (key, value.to_text()))
                .collect(),
            _ => Vec::new(),
        };
        for (key, value) in self.entry_values() {
            match values.iter_mut().find(|(existing, _)| *existing == key) {
                Some(entry) => entry.1 = value,
                None => values.push((key, value)),
            }
        }
        values
    }

    /// Fields beyond the well-known ones, keyed `<n>_<label>`.
    ///
    /// Basic fields repeating a well-known value are skipped. Of the
    /// well-known types, only the second and later fields of a type count.
    pub fn legacy_extra_values(&self, context: Context) -> Vec<(String, String)> {
        let special_values: Vec<String> = self
            .fields
            .iter()
            .filter(|f| WELL_KNOWN_TYPES.contains(f.field_type()))
            .map(|f| self.render(f, context).to_text())
            .filter(|v| !v.is_empty())
            .collect();

        let mut count = 1;
        let mut extra_fields: Vec<&Field> = Vec::new();
        for field in self.fields.iter().filter(|f| f.is_renderable()) {
            count += 1;
            if field.is_of_type(&FieldType::Basic)
                && special_values.contains(&self.render(field, Context::Default).to_text())
            {
                continue;
            }
            extra_fields.push(field);
        }

        let mut next = count;
        let mut seen_types: Vec<&FieldType> = Vec::new();
        let mut values: Vec<(String, String)> = Vec::new();
        for field in extra_fields {
            let field_type = field.field_type();
            if WELL_KNOWN_TYPES.contains(field_type) && !seen_types.contains(&field_type) {
                seen_types.push(field_type);
                continue;
            }
            let key = format!("{}_{}", next, field.label());
            let value = self.render(field, context).to_text();
            match values.iter_mut().find(|(existing, _)| *existing == key) {
                Some(entry) => entry.1 = value,
                None => values.push((key, value)),
            }
            next += 1;
        }
        values
    }

    /// The five well-known legacy slots. Missing values are empty.
    pub fn all_legacy_values(&self) -> LegacyValues {
        LegacyValues {
            author: self.author.display_name().to_string(),
            author_email: self.author.email.clone(),
            author_url: self.author.url.clone(),
            subject: self.subject.clone(),
            ip: self.ip.clone().unwrap_or_default(),
            all_fields: self.all_values(Context::Default),
        }
    }

    pub fn email_lines(&self) -> Vec<String> {
        compile::email_lines(&self.fields)
    }

    pub fn spam_check_vars(&self) -> Vec<(String, String)> {
        compile::spam_check_vars(self)
    }

    // Status transitions

    pub fn set_status(&mut self, status: FeedbackStatus) {
        self.status = status;
    }

    pub fn mark_spam(&mut self) {
        self.set_status(FeedbackStatus::Spam);
    }

    pub fn mark_ham(&mut self) {
        self.set_status(FeedbackStatus::Publish);
    }

    pub fn trash(&mut self) {
        self.set_status(FeedbackStatus::Trash);
    }

    fn render(&self, field: &Field, context: Context) -> RenderedValue {
        compile::render_value(field, context)
    }
}

impl AsRef<Feedback> for Feedback {
    fn as_ref(&self) -> &Feedback {
        self
    }
}

/// Flat legacy representation of a feedback entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyValues {
    pub author: String,
    pub author_email: String,
    pub author_url: String,
    pub subject: String,
    pub ip: String,
    pub all_fields: Vec<(String, String)>,
}

fn first_text_of_type(fields: &FieldList, field_type: &FieldType) -> String {
    fields
        .first_of_type(field_type)
        .map(|f| f.value().display())
        .unwrap_or_default()
}

fn default_title(author: &Author, created_at: &NaiveDateTime) -> String {
    format!(
        "{} - {}",
        author.display_name(),
        created_at.format(TIMESTAMP_FORMAT)
    )
}

/// Stable legacy id derived from the title.
fn legacy_id_for(title: &str) -> String {
    let digest = Sha256::digest(title.as_bytes());
    hex::encode(digest)[..32].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::FormField;
    use chrono::NaiveDate;

    const V3_CONTENT: &str = r#"{"subject":"Quote","ip":"203.0.113.5","entry_title":"Contact","entry_page":2,"source_id":9,"source_type":"widget","request_url":"https://site.test/contact/","fields":[
        {"key":"1_Name","label":"Name","value":"Ann Lee","type":"name","meta":{}},
        {"key":"2_Email","label":"Email","value":"ann@example.com","type":"email","meta":{}},
        {"key":"3_Message","label":"Message","value":"Hi","type":"textarea","meta":{}},
        {"key":"4_Consent","label":"Consent","value":"no","type":"consent","meta":{}},
        {"key":"5_Upload","label":"Upload","value":{"field_id":"g1-upload","files":[
            {"file_id":"f1","name":"a.png","size":2048,"type":"image/png"},
            {"file_id":"f2","name":"b.txt","size":10,"type":""}
        ]},"type":"file","meta":{}}
    ]}"#;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn record(content: &str, marker: Option<&str>) -> StoredRecord {
        StoredRecord {
            id: 21,
            content: content.to_string(),
            format_marker: marker.map(str::to_string),
            parent_id: None,
            created_at: at(2024, 3, 1),
            status: FeedbackStatus::Publish,
            slug: String::new(),
            title: String::new(),
        }
    }

    fn submitted() -> Feedback {
        let form = FormDefinition {
            fields: vec![
                FormField::new("name", "Name", FieldType::Name),
                FormField::new("email", "Email", FieldType::Email),
                FormField::new("alt", "Alt Email", FieldType::Email),
                FormField::new("notes", "Notes", FieldType::Basic),
            ],
            subject: "Hi there".into(),
            ..FormDefinition::default()
        };
        let submission = Submission::new(Source::default(), at(2024, 5, 1))
            .with_value("name", "Ann")
            .with_value("email", "a@x.test")
            .with_value("alt", "b@x.test")
            .with_value("notes", "Ann");
        Feedback::from_submission(&submission, &form, &LogContext::new("test"))
    }

    #[test]
    fn test_from_canonical_record() {
        let feedback = Feedback::from_record(&record(V3_CONTENT, Some("v3")), &LogContext::new("test"));

        assert_eq!(feedback.id(), Some(21));
        assert_eq!(feedback.subject(), "Quote");
        assert_eq!(feedback.ip(), Some("203.0.113.5"));
        assert_eq!(feedback.author_display_name(), "Ann Lee");
        assert!(feedback.author_avatar_url().is_some());
        assert_eq!(feedback.comment_content(), "Hi");
        assert!(!feedback.has_consent());
        assert!(feedback.has_file());
        assert_eq!(feedback.entry_id(), Some(9));
        assert_eq!(feedback.entry_title(), "Contact");
        assert_eq!(feedback.page_number(), 2);
        assert_eq!(feedback.entry_permalink(), "https://site.test/contact/2/");
        assert_eq!(feedback.entry_short_permalink(), "/contact/2/");
        assert_eq!(feedback.time(), "2024-03-01 10:00:00");
    }

    #[test]
    fn test_files_lists_complete_entries_only() {
        let feedback = Feedback::from_record(&record(V3_CONTENT, Some("v3")), &LogContext::new("test"));
        let files = feedback.files();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "a.png");
    }

    #[test]
    fn test_title_and_legacy_id_fallbacks() {
        let feedback = Feedback::from_record(&record(V3_CONTENT, Some("v3")), &LogContext::new("test"));
        assert_eq!(feedback.title(), "Ann Lee - 2024-03-01 10:00:00");
        assert_eq!(feedback.legacy_id().len(), 32);
        assert!(feedback.legacy_id().chars().all(|c| c.is_ascii_hexdigit()));

        let mut stored = record(V3_CONTENT, Some("v3"));
        stored.title = "Stored title".into();
        stored.slug = "4f2a".into();
        let feedback = Feedback::from_record(&stored, &LogContext::new("test"));
        assert_eq!(feedback.title(), "Stored title");
        assert_eq!(feedback.legacy_id(), "4f2a");
    }

    #[test]
    fn test_from_legacy_record() {
        let content = "Body text<!--more-->AUTHOR: Bob\nAUTHOR EMAIL: bob@x.test\nSUBJECT: Hello\nIP: 192.0.2.1\nJSON_DATA\n{\"1_Phone\":\"555\",\"email_marketing_consent\":\"yes\",\"entry_title\":\"Old page\",\"feedback_id\":\"abc\"}";
        let feedback = Feedback::from_record(&record(content, None), &LogContext::new("test"));

        assert_eq!(feedback.subject(), "Hello");
        assert_eq!(feedback.ip(), Some("192.0.2.1"));
        assert_eq!(feedback.author_display_name(), "Bob");
        assert_eq!(feedback.author().email, "bob@x.test");
        assert_eq!(feedback.comment_content(), "Body text");
        assert!(feedback.has_consent());
        assert_eq!(feedback.entry_title(), "Old page");
        assert_eq!(
            feedback.field_value_by_label("Phone", Context::Default),
            "555"
        );
    }

    #[test]
    fn test_unreadable_record_still_builds() {
        let feedback = Feedback::from_record(&record("{broken", Some("v3")), &LogContext::new("test"));
        assert!(feedback.fields().is_empty());
        assert_eq!(feedback.subject(), "");
        assert_eq!(feedback.ip(), None);
        assert_eq!(feedback.title(), " - 2024-03-01 10:00:00");
    }

    #[test]
    fn test_entry_values() {
        let feedback = Feedback::from_record(&record(V3_CONTENT, Some("v3")), &LogContext::new("test"));
        let values = feedback.entry_values();
        assert_eq!(values[0], ("email_marketing_consent".to_string(), "no".to_string()));
        assert_eq!(values[1], ("entry_title".to_string(), "Contact".to_string()));
        assert_eq!(
            values[2],
            ("entry_permalink".to_string(), "https://site.test/contact/2/".to_string())
        );
        assert_eq!(values[3].1, feedback.legacy_id());
        assert_eq!(values[4], ("entry_page".to_string(), "2".to_string()));
    }

    #[test]
    fn test_lookups() {
        let feedback = submitted();
        assert_eq!(feedback.first_field_of_type(&FieldType::Email).unwrap().key(), "2_Email");
        assert!(!feedback.has_field_type(&FieldType::File));
        assert_eq!(feedback.field_by_form_field_id("alt").unwrap().label(), "Alt Email");
        assert!(feedback.field_by_form_field_id("").is_none());
        assert_eq!(
            feedback.field_value_by_form_field_id("alt", Context::Default),
            "b@x.test"
        );
        assert_eq!(feedback.field_value_by_label("Alt Email", Context::Default), "b@x.test");
        assert_eq!(feedback.field_value_by_label("Missing", Context::Default), "");
        assert_eq!(
            feedback.first_value_of_type(&FieldType::Name, Context::Default),
            "Ann"
        );
    }

    #[test]
    fn test_submission_defaults() {
        let feedback = submitted();
        assert_eq!(feedback.id(), None);
        assert_eq!(feedback.subject(), "Hi there");
        assert_eq!(feedback.title(), "Ann - 2024-05-01 10:00:00");
        assert_eq!(feedback.status(), &FeedbackStatus::Publish);
        assert_eq!(feedback.fields().len(), 4);
    }

    #[test]
    fn test_legacy_extra_values() {
        let extra = submitted().legacy_extra_values(Context::Default);
        assert_eq!(extra, vec![("5_Alt Email".to_string(), "b@x.test".to_string())]);
    }

    #[test]
    fn test_all_legacy_values() {
        let legacy = submitted().all_legacy_values();
        assert_eq!(legacy.author, "Ann");
        assert_eq!(legacy.author_email, "a@x.test");
        assert_eq!(legacy.author_url, "");
        assert_eq!(legacy.subject, "Hi there");
        assert_eq!(legacy.ip, "");

        let keys: Vec<&str> = legacy.all_fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(&keys[..4], &["1_Name", "2_Email", "3_Alt Email", "4_Notes"]);
        assert!(legacy
            .all_fields
            .contains(&("email_marketing_consent".to_string(), "no".to_string())));
    }

    #[test]
    fn test_spam_check_vars() {
        let vars = submitted().spam_check_vars();
        let keys: Vec<&str> = vars.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "comment_author",
                "comment_author_email",
                "comment_author_url",
                "contact_form_subject",
                "comment_author_ip",
                "contact_form_field_alt-email",
            ]
        );
        assert_eq!(vars[5].1, "b@x.test");
    }

    #[test]
    fn test_consent_strings() {
        let form = FormDefinition {
            fields: vec![FormField::new("ok", "Consent", FieldType::Consent)],
            ..FormDefinition::default()
        };
        for (posted, expected) in [("1", true), ("Yes", true), ("off", false), ("", false)] {
            let submission =
                Submission::new(Source::default(), at(2024, 1, 1)).with_value("ok", posted);
            let feedback = Feedback::from_submission(&submission, &form, &LogContext::new("test"));
            assert_eq!(feedback.has_consent(), expected, "posted {:?}", posted);
        }
    }

    #[test]
    fn test_status_transitions() {
        let mut feedback = submitted();
        feedback.mark_spam();
        assert_eq!(feedback.status(), &FeedbackStatus::Spam);
        feedback.mark_ham();
        assert_eq!(feedback.status(), &FeedbackStatus::Publish);
        feedback.trash();
        assert_eq!(feedback.status(), &FeedbackStatus::Trash);
        feedback.set_status(FeedbackStatus::parse("draft"));
        assert_eq!(feedback.status().as_str(), "draft");
    }
}
