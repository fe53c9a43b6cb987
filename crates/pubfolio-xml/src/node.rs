//! Read helpers for converted object trees.

use serde_json::Value;

use crate::TEXT_KEY;

/// View a member as a sequence.
///
/// Arrays yield their elements; any other value yields itself once, so a
/// tag that happened to occur a single time reads the same as a repeated one.
pub fn as_sequence(value: &Value) -> &[Value] {
    match value {
        Value::Array(items) => items,
        other => std::slice::from_ref(other),
    }
}

/// The `#text` member of an element object.
pub fn text(value: &Value) -> Option<&str> {
    value.get(TEXT_KEY).and_then(Value::as_str)
}

/// A string member (typically an attribute) of an element object.
pub fn attr<'a>(value: &'a Value, name: &str) -> Option<&'a str> {
    value.get(name).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_as_sequence_wraps_single() {
        let single = json!({"#text": "A"});
        assert_eq!(as_sequence(&single).len(), 1);

        let many = json!([{"#text": "A"}, {"#text": "B"}]);
        assert_eq!(as_sequence(&many).len(), 2);
    }

    #[test]
    fn test_text_and_attr() {
        let author = json!({"pid": "84/5849", "#text": "Erik Saule"});
        assert_eq!(text(&author), Some("Erik Saule"));
        assert_eq!(attr(&author, "pid"), Some("84/5849"));
        assert_eq!(attr(&author, "orcid"), None);
        assert_eq!(text(&json!("bare string")), None);
    }
}
