//! Syntax checks for managed documents
//!
//! Only well-formedness is checked; no schema or semantic rules apply.

use crate::error::ValidationError;
use crate::format::FormatKind;

/// Check that `content` is a single well-formed document of the given kind
pub fn validate(content: &str, kind: FormatKind) -> Result<(), ValidationError> {
    match kind {
        FormatKind::Json => validate_json(content),
        FormatKind::Yaml => validate_yaml(content),
        FormatKind::Xml => validate_xml(content),
    }
}

fn validate_json(content: &str) -> Result<(), ValidationError> {
    serde_json::from_str::<serde_json::Value>(content)
        .map(drop)
        .map_err(|e| ValidationError::syntax(FormatKind::Json, e))
}

// serde_yaml builds plain data values only; tags never construct objects.
// Streams with more than one document are rejected by `from_str`.
fn validate_yaml(content: &str) -> Result<(), ValidationError> {
    serde_yaml::from_str::<serde_yaml::Value>(content)
        .map(drop)
        .map_err(|e| ValidationError::syntax(FormatKind::Yaml, e))
}

fn validate_xml(content: &str) -> Result<(), ValidationError> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    roxmltree::Document::parse_with_options(content, options)
        .map(drop)
        .map_err(|e| ValidationError::syntax(FormatKind::Xml, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_syntax_error(content: &str, kind: FormatKind) {
        match validate(content, kind) {
            Err(ValidationError::Syntax { kind: k, detail }) => {
                assert_eq!(k, kind);
                assert!(!detail.is_empty());
            }
            Ok(()) => panic!("{kind} content {content:?} should be rejected"),
        }
    }

    #[test]
    fn test_valid_json() {
        assert!(validate(r#"{"name": "test", "tags": [1, 2]}"#, FormatKind::Json).is_ok());
        assert!(validate("42", FormatKind::Json).is_ok());
    }

    #[test]
    fn test_invalid_json() {
        assert_syntax_error("", FormatKind::Json);
        assert_syntax_error(r#"{"name": }"#, FormatKind::Json);
        assert_syntax_error(r#"{"a": 1} {"b": 2}"#, FormatKind::Json);
    }

    #[test]
    fn test_valid_yaml() {
        assert!(validate("name: test\nitems:\n  - a\n  - b\n", FormatKind::Yaml).is_ok());
        assert!(validate("plain scalar", FormatKind::Yaml).is_ok());
    }

    #[test]
    fn test_invalid_yaml() {
        assert_syntax_error("a: b: c", FormatKind::Yaml);
        assert_syntax_error("items: [1, 2", FormatKind::Yaml);
        assert_syntax_error("a: 1\n---\nb: 2\n", FormatKind::Yaml);
    }

    #[test]
    fn test_valid_xml() {
        let doc = "<?xml version=\"1.0\"?>\n<root>\n  <n>x</n>\n</root>\n";
        assert!(validate(doc, FormatKind::Xml).is_ok());
        assert!(validate("<!DOCTYPE note><note/>", FormatKind::Xml).is_ok());
    }

    #[test]
    fn test_invalid_xml() {
        assert_syntax_error("", FormatKind::Xml);
        assert_syntax_error("<root><a></root>", FormatKind::Xml);
        assert_syntax_error("<a/><b/>", FormatKind::Xml);
        assert_syntax_error("just text", FormatKind::Xml);
    }
}
