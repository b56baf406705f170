//! Starter documents for files referenced before they exist

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::format::FormatKind;
use crate::history::format_timestamp;

/// Value of the `name` field in every starter document
pub const DEFAULT_NAME: &str = "New File";

#[derive(Serialize)]
struct StarterDocument<'a> {
    name: &'a str,
    created: &'a str,
}

/// Render the starter document for `kind`, stamped with `now`
pub fn generate(kind: FormatKind, now: DateTime<Utc>) -> String {
    let created = format_timestamp(now);
    let doc = StarterDocument {
        name: DEFAULT_NAME,
        created: &created,
    };

    match kind {
        FormatKind::Json => serde_json::to_string_pretty(&doc).unwrap_or_default(),
        FormatKind::Yaml => serde_yaml::to_string(&doc).unwrap_or_default(),
        FormatKind::Xml => format!(
            "<root>\n  <n>{}</n>\n  <created>{}</created>\n</root>\n",
            doc.name, doc.created
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap()
    }

    #[test]
    fn test_json_template() {
        let content = generate(FormatKind::Json, fixed_now());
        assert_eq!(
            content,
            "{\n  \"name\": \"New File\",\n  \"created\": \"2026-10-19T08:30:00Z\"\n}"
        );
    }

    #[test]
    fn test_yaml_template() {
        let content = generate(FormatKind::Yaml, fixed_now());
        let value: serde_yaml::Value = serde_yaml::from_str(&content).unwrap();
        assert_eq!(value["name"].as_str(), Some("New File"));
        assert_eq!(value["created"].as_str(), Some("2026-10-19T08:30:00Z"));
    }

    #[test]
    fn test_xml_template() {
        let content = generate(FormatKind::Xml, fixed_now());
        assert_eq!(
            content,
            "<root>\n  <n>New File</n>\n  <created>2026-10-19T08:30:00Z</created>\n</root>\n"
        );
    }

    #[test]
    fn test_templates_pass_validation() {
        for kind in [FormatKind::Json, FormatKind::Yaml, FormatKind::Xml] {
            let content = generate(kind, fixed_now());
            assert!(validate(&content, kind).is_ok(), "{kind} template invalid");
        }
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(
            generate(FormatKind::Yaml, fixed_now()),
            generate(FormatKind::Yaml, fixed_now())
        );
    }
}
