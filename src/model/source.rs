//! Where a submission came from.

use serde_json::{json, Value};

/// Kind of page element that hosted the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceType {
    #[default]
    Single,
    Widget,
    Template,
    TemplatePart,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Single => "single",
            SourceType::Widget => "widget",
            SourceType::Template => "block_template",
            SourceType::TemplatePart => "block_template_part",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "widget" => SourceType::Widget,
            "block_template" | "template" => SourceType::Template,
            "block_template_part" | "template_part" | "template-part" => SourceType::TemplatePart,
            _ => SourceType::Single,
        }
    }
}

/// Originating context of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub id: Option<u64>,
    pub title: String,
    /// 1-based page within paginated content.
    pub page_number: u32,
    pub source_type: SourceType,
    pub request_url: String,
}

impl Default for Source {
    fn default() -> Self {
        Self {
            id: None,
            title: String::new(),
            page_number: 1,
            source_type: SourceType::Single,
            request_url: String::new(),
        }
    }
}

impl Source {
    pub fn new(id: Option<u64>, title: &str, page_number: u32) -> Self {
        Self {
            id,
            title: title.to_string(),
            page_number: page_number.max(1),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    pub fn with_request_url(mut self, url: &str) -> Self {
        self.request_url = url.to_string();
        self
    }

    /// Request URL, with the page segment appended for pages after the first.
    pub fn permalink(&self) -> String {
        if self.request_url.is_empty() || self.page_number <= 1 {
            return self.request_url.clone();
        }
        let (base, query) = match self.request_url.split_once('?') {
            Some((base, query)) => (base, Some(query)),
            None => (self.request_url.as_str(), None),
        };
        let mut url = format!("{}/{}/", base.trim_end_matches('/'), self.page_number);
        if let Some(query) = query {
            url.push('?');
            url.push_str(query);
        }
        url
    }

    /// Permalink without scheme and host.
    pub fn relative_permalink(&self) -> String {
        let permalink = self.permalink();
        let Some((_, rest)) = permalink.split_once("://") else {
            return permalink;
        };
        match rest.find('/') {
            Some(idx) => rest[idx..].to_string(),
            None => "/".to_string(),
        }
    }

    /// Keys written into the canonical document.
    pub fn to_json_entries(&self) -> [(&'static str, Value); 5] {
        [
            ("entry_title", json!(self.title)),
            ("entry_page", json!(self.page_number)),
            ("source_id", json!(self.id)),
            ("source_type", json!(self.source_type.as_str())),
            ("request_url", json!(self.request_url)),
        ]
    }
}
