//! Text sanitization for submitted feedback data.
//!
//! - Tag stripping (script/style blocks are removed with their content)
//! - HTML entity decoding for labels
//! - HTML escaping for email output
//! - Slash escaping as applied by the storage layer of older writers

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    /// Script and style blocks, removed together with their content.
    static ref SCRIPT_STYLE_PATTERN: Regex =
        Regex::new(r"(?is)<(script|style)[^>]*?>.*?</(script|style)>").unwrap();

    /// Any remaining tag.
    static ref TAG_PATTERN: Regex = Regex::new(r"(?s)<[^>]*>").unwrap();

    /// Named, decimal and hex character references.
    static ref ENTITY_PATTERN: Regex =
        Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});").unwrap();
}

/// Remove HTML tags, dropping script and style blocks entirely.
pub fn strip_tags(s: &str) -> String {
    let without_blocks = SCRIPT_STYLE_PATTERN.replace_all(s, "");
    TAG_PATTERN.replace_all(&without_blocks, "").into_owned()
}

/// Strip tags and trim, the treatment applied to submitted text values.
pub fn sanitize_text(s: &str) -> String {
    strip_tags(s).trim().to_string()
}

/// Decode HTML character references. Unknown named references are kept.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    ENTITY_PATTERN
        .replace_all(s, |caps: &Captures| {
            let body = &caps[1];
            decode_reference(body).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_reference(body: &str) -> Option<String> {
    if let Some(numeric) = body.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(|c| c.to_string());
    }
    let decoded = match body {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "hellip" => "\u{2026}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        _ => return None,
    };
    Some(decoded.to_string())
}

/// Escape text for inclusion in HTML.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Insert `<br />` before each line break.
pub fn nl2br(s: &str) -> String {
    s.replace("\r\n", "<br />\r\n")
        .replace('\n', "<br />\n")
        .replace("<br />\r<br />\n", "<br />\r\n")
}

/// Remove one level of backslash escaping.
///
/// `\x` becomes `x`, `\\` becomes `\`, `\0` becomes NUL and a lone
/// trailing backslash is dropped.
pub fn strip_slashes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('\0'),
            Some(next) => out.push(next),
            None => {}
        }
    }
    out
}

/// Backslash-escape quotes, backslashes and NUL.
pub fn add_slashes(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + s.len() / 8);
    for c in s.chars() {
        match c {
            '\'' | '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\0' => out.push_str("\\0"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<b>Alice</b>"), "Alice");
        assert_eq!(
            strip_tags("hi<script>alert('x')</script> there"),
            "hi there"
        );
        assert_eq!(strip_tags("a < b"), "a < b");
    }

    #[test]
    fn test_sanitize_text_trims() {
        assert_eq!(sanitize_text("  <i>note</i> \n"), "note");
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(decode_entities("&#039;quoted&#39;"), "'quoted'");
        assert_eq!(decode_entities("&#x263A;"), "\u{263a}");
        assert_eq!(decode_entities("&unknown;"), "&unknown;");
        assert_eq!(decode_entities("no entities"), "no entities");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">O'Neil & co</a>"#),
            "&lt;a href=&quot;x&quot;&gt;O&#039;Neil &amp; co&lt;/a&gt;"
        );
    }

    #[test]
    fn test_nl2br() {
        assert_eq!(nl2br("a\nb"), "a<br />\nb");
        assert_eq!(nl2br("a\r\nb"), "a<br />\r\nb");
    }

    #[test]
    fn test_slashes_round_trip() {
        let original = r#"say "hi" to O'Neil \ now"#;
        let slashed = add_slashes(original);
        assert_eq!(slashed, r#"say \"hi\" to O\'Neil \\ now"#);
        assert_eq!(strip_slashes(&slashed), original);
    }

    #[test]
    fn test_strip_slashes_edges() {
        assert_eq!(strip_slashes(r"trailing\"), "trailing");
        assert_eq!(strip_slashes(r"\n"), "n");
        assert_eq!(strip_slashes(r"a\0b"), "a\0b");
    }
}
