//! Malformed-JSON repair for generation-2 content.
//!
//! Generation-2 writers stored JSON whose quotes were escaped once too often
//! or not at all. Once the content has been de-slashed, user text quotes are
//! bare and break the document. Repair re-escapes every quote and backslash,
//! then restores only the structural tokens listed in the table below, so
//! quotes inside user text stay escaped and decode as literal quotes.

use lazy_static::lazy_static;

use crate::security::sanitizer::add_slashes;

lazy_static! {
    /// Ordered (malformed fragment, corrected fragment) pairs.
    ///
    /// Applied in sequence over the whole text; each rewrite sees the output
    /// of the previous one.
    pub static ref REPAIR_TABLE: Vec<(String, String)> = build_repair_table();
}

fn build_repair_table() -> Vec<(String, String)> {
    let mut table: Vec<(String, String)> = [
        // object start
        (r#"{\""#, r#"{""#),
        // key/value separator
        (r#"\":\""#, r#"":""#),
        (r#"\\""#, r#"\""#),
        (r#"\":[\""#, r#"":[""#),
        (r#"\"],"#, r#""],"#),
        (r#",[\""#, r#",[""#),
        (r#"\",\""#, r#"",""#),
        (r#",\""#, r#",""#),
        (r#"\", \""#, r#"", ""#),
        (r#"\"],\""#, r#""],""#),
        (r#"\"],""#, r#""],""#),
        (r#"\":[]"#, r#"":[]"#),
        (r#"\"]}"#, r#""]}"#),
        (r#"\":["#, r#"":["#),
        (r#"\":{"#, r#"":{"#),
        (r#"\":true"#, r#"":true"#),
        (r#"\":false"#, r#"":false"#),
        (r#"\":null"#, r#"":null"#),
    ]
    .iter()
    .map(|(find, replace)| (find.to_string(), replace.to_string()))
    .collect();

    // numeric literals after a separator
    for digit in 0..=9 {
        table.push((format!(r#"\":{}"#, digit), format!(r#"":{}"#, digit)));
        table.push((format!(r#"\",{}"#, digit), format!(r#"",{}"#, digit)));
    }

    for literal in ["true", "false", "null"] {
        table.push((format!(r#"\",{}"#, literal), format!(r#"",{}"#, literal)));
    }

    table.push((r"\'".to_string(), "'".to_string()));
    // object end
    table.push((r#"\"}"#.to_string(), r#""}"#.to_string()));

    table
}

/// Repair de-slashed generation-2 JSON.
///
/// # Examples
/// ```
/// use feedback_core::decode::repair::repair_malformed_json;
/// let fixed = repair_malformed_json(r#"{"1_Msg":"say "hi" now"}"#);
/// assert_eq!(fixed, r#"{"1_Msg":"say \"hi\" now"}"#);
/// ```
pub fn repair_malformed_json(json: &str) -> String {
    REPAIR_TABLE
        .iter()
        .fold(add_slashes(json), |text, (find, replace)| {
            if text.contains(find.as_str()) {
                text.replace(find.as_str(), replace)
            } else {
                text
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_table_shape() {
        // 18 fixed pairs, 20 digit pairs, 3 literal pairs, quote and object end.
        assert_eq!(REPAIR_TABLE.len(), 43);
        assert_eq!(REPAIR_TABLE[0].0, r#"{\""#);
        assert_eq!(REPAIR_TABLE.last().unwrap().0, r#"\"}"#);
    }

    #[test]
    fn test_valid_json_survives_repair() {
        let fixed = repair_malformed_json(r#"{"1_Name":"Alice"}"#);
        assert_eq!(fixed, r#"{"1_Name":"Alice"}"#);
    }

    #[test]
    fn test_bare_user_quotes_are_escaped() {
        let stripped = r#"{"fields":[{"key":"1_Msg","label":"Msg","value":"say "hi" now","type":"basic","meta":[]}]}"#;
        assert!(serde_json::from_str::<Value>(stripped).is_err());

        let fixed = repair_malformed_json(stripped);
        let value: Value = serde_json::from_str(&fixed).unwrap();
        assert_eq!(value["fields"][0]["value"], "say \"hi\" now");
        assert_eq!(value["fields"][0]["key"], "1_Msg");
    }

    #[test]
    fn test_literals_and_numbers_restored() {
        let stripped = r#"{"entry_page":2,"ip":null,"ok":true,"list":["a","b"],"n":{"x":0}}"#;
        let fixed = repair_malformed_json(stripped);
        let value: Value = serde_json::from_str(&fixed).unwrap();
        assert_eq!(value["entry_page"], 2);
        assert!(value["ip"].is_null());
        assert_eq!(value["ok"], true);
        assert_eq!(value["list"][1], "b");
        assert_eq!(value["n"]["x"], 0);
    }

    #[test]
    fn test_apostrophes_unescaped() {
        let fixed = repair_malformed_json(r#"{"a":"it's"}"#);
        assert_eq!(fixed, r#"{"a":"it's"}"#);
    }
}
