//! Submitter identity.

use sha2::{Digest, Sha256};

const AVATAR_BASE_URL: &str = "https://gravatar.com/avatar/";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub email: String,
    pub url: String,
    /// Collected by separate first/last name inputs, when the form has them.
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Author {
    pub fn new(name: &str, email: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            url: url.to_string(),
            first_name: None,
            last_name: None,
        }
    }

    /// Attach separately collected names. An empty `name` is filled from them.
    pub fn with_names(mut self, first_name: Option<String>, last_name: Option<String>) -> Self {
        let first_name = first_name.filter(|s| !s.is_empty());
        let last_name = last_name.filter(|s| !s.is_empty());
        if self.name.is_empty() {
            let parts: Vec<&str> = [first_name.as_deref(), last_name.as_deref()]
                .into_iter()
                .flatten()
                .collect();
            self.name = parts.join(" ");
        }
        self.first_name = first_name;
        self.last_name = last_name;
        self
    }

    /// Name, falling back to the email address.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.email
        } else {
            &self.name
        }
    }

    /// Gravatar URL keyed by the SHA-256 of the normalized email.
    pub fn avatar_url(&self) -> Option<String> {
        let email = self.email.trim().to_lowercase();
        if email.is_empty() {
            return None;
        }
        let digest = Sha256::digest(email.as_bytes());
        Some(format!("{}{}", AVATAR_BASE_URL, hex::encode(digest)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_falls_back_to_email() {
        let author = Author::new("", "a@b.com", "");
        assert_eq!(author.display_name(), "a@b.com");
        let author = Author::new("Alice", "a@b.com", "");
        assert_eq!(author.display_name(), "Alice");
    }

    #[test]
    fn test_with_names_fills_empty_name() {
        let author = Author::new("", "", "").with_names(Some("Ada".into()), Some("Lovelace".into()));
        assert_eq!(author.name, "Ada Lovelace");

        let author = Author::new("Countess", "", "").with_names(Some("Ada".into()), None);
        assert_eq!(author.name, "Countess");
        assert_eq!(author.first_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_avatar_url_normalizes_email() {
        let a = Author::new("", " A@B.com ", "").avatar_url().unwrap();
        let b = Author::new("", "a@b.com", "").avatar_url().unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with(AVATAR_BASE_URL));
        assert_eq!(a.len(), AVATAR_BASE_URL.len() + 64);
        assert!(Author::default().avatar_url().is_none());
    }
}
