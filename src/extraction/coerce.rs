//! Loose JSON value coercion.
//!
//! Stored feedback was written by several generations of writers, so the
//! same logical value shows up as a string, a number or a bool. These helpers
//! read such values without failing.

use serde_json::Value;

/// Convert a JSON value to its display string.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => String::new(),
        Value::Null => String::new(),
        _ => value.to_string(), // Arrays and objects as JSON strings
    }
}

/// String field of an object, if present and scalar.
pub fn get_string(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::Null | Value::Array(_) | Value::Object(_) => None,
        v => Some(value_to_string(v)),
    }
}

/// Convert a JSON value to a non-negative integer if possible.
pub fn value_to_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Whether a rendered string counts as "set".
///
/// Empty, `0`, `no`, `false` and `off` read as false.
pub fn is_truthy(s: &str) -> bool {
    !matches!(
        s.trim().to_lowercase().as_str(),
        "" | "0" | "no" | "false" | "off"
    )
}

/// Convert a JSON value to a boolean if possible.
pub fn value_to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.to_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" | "" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&json!("a")), "a");
        assert_eq!(value_to_string(&json!(12)), "12");
        assert_eq!(value_to_string(&json!(true)), "1");
        assert_eq!(value_to_string(&Value::Null), "");
        assert_eq!(value_to_string(&json!(["x"])), r#"["x"]"#);
    }

    #[test]
    fn test_get_string() {
        let data = json!({"name": "doc.pdf", "id": 7, "nested": {"a": 1}});
        assert_eq!(get_string(&data, "name"), Some("doc.pdf".to_string()));
        assert_eq!(get_string(&data, "id"), Some("7".to_string()));
        assert_eq!(get_string(&data, "nested"), None);
        assert_eq!(get_string(&data, "missing"), None);
    }

    #[test]
    fn test_value_to_u64() {
        assert_eq!(value_to_u64(&json!(2048)), Some(2048));
        assert_eq!(value_to_u64(&json!(" 512 ")), Some(512));
        assert_eq!(value_to_u64(&json!(-3)), None);
        assert_eq!(value_to_u64(&json!("big")), None);
    }

    #[test]
    fn test_truthiness() {
        assert!(is_truthy("yes"));
        assert!(is_truthy("I agree"));
        assert!(!is_truthy("No"));
        assert!(!is_truthy(" "));
        assert_eq!(value_to_bool(&json!("true")), Some(true));
        assert_eq!(value_to_bool(&json!(0)), Some(false));
        assert_eq!(value_to_bool(&json!([1])), None);
    }
}
