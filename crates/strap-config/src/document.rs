//! Sectioned `key = value` document parsing
//!
//! The config source is a plain text document of `[section]` headers and
//! `key = value` entries (`key: value` is accepted too). `#` and `;` start
//! comment lines. Unknown sections are preserved here and simply never read
//! by the loader.

use std::collections::BTreeMap;

/// A syntax problem in a config document, with its 1-based line number.
#[derive(Debug, Clone, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct SyntaxError {
    pub line: usize,
    pub message: String,
}

impl SyntaxError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// A parsed config document: section name → entries in document order.
///
/// Duplicate keys within a section are kept in order; a later entry wins
/// once the loader folds them into a map.
#[derive(Debug, Clone, Default)]
pub struct Document {
    sections: BTreeMap<String, Vec<(String, String)>>,
}

impl Document {
    /// Parse document text.
    ///
    /// Any malformed line is an error; a document that exists is never
    /// partially accepted.
    pub fn parse(text: &str) -> Result<Self, SyntaxError> {
        let mut sections: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();
        let mut current: Option<String> = None;

        for (index, raw_line) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw_line.trim();

            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(rest) = line.strip_prefix('[') {
                let Some(name) = rest.strip_suffix(']') else {
                    return Err(SyntaxError::new(line_no, "malformed section header"));
                };
                let name = name.trim();
                if name.is_empty() {
                    return Err(SyntaxError::new(line_no, "empty section name"));
                }
                sections.entry(name.to_string()).or_default();
                current = Some(name.to_string());
                continue;
            }

            let delimiter = line
                .char_indices()
                .find(|(_, c)| *c == '=' || *c == ':')
                .map(|(i, _)| i);
            let Some(at) = delimiter else {
                return Err(SyntaxError::new(line_no, "expected `key = value`"));
            };

            let key = line[..at].trim();
            let value = line[at + 1..].trim();
            if key.is_empty() {
                return Err(SyntaxError::new(line_no, "entry is missing a key"));
            }

            let Some(section) = &current else {
                return Err(SyntaxError::new(line_no, "entry outside of any section"));
            };
            sections
                .get_mut(section)
                .expect("current section was inserted on its header")
                .push((key.to_string(), value.to_string()));
        }

        Ok(Self { sections })
    }

    /// Entries of a section, in document order; `None` if the section is
    /// absent from the document.
    pub fn section(&self, name: &str) -> Option<&[(String, String)]> {
        self.sections.get(name).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_sections_and_entries() {
        let document = Document::parse(
            "[tool]\nenv = .venv\nquiet = yes\n\n[installer]\ntimeout = 30\n",
        )
        .unwrap();

        assert_eq!(
            document.section("tool").unwrap(),
            &[
                ("env".to_string(), ".venv".to_string()),
                ("quiet".to_string(), "yes".to_string()),
            ]
        );
        assert_eq!(
            document.section("installer").unwrap(),
            &[("timeout".to_string(), "30".to_string())]
        );
    }

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let document = Document::parse(
            "# leading comment\n\n[tool]\n; another comment\nenv = env\n",
        )
        .unwrap();
        assert_eq!(document.section("tool").unwrap().len(), 1);
    }

    #[test]
    fn test_parse_accepts_colon_delimiter() {
        let document = Document::parse("[tool]\nenv: .venv\n").unwrap();
        assert_eq!(
            document.section("tool").unwrap(),
            &[("env".to_string(), ".venv".to_string())]
        );
    }

    #[test]
    fn test_parse_unknown_section_is_kept() {
        let document = Document::parse("[future]\nkey = value\n").unwrap();
        assert!(document.section("future").is_some());
        assert!(document.section("tool").is_none());
    }

    #[test]
    fn test_parse_reports_line_of_malformed_entry() {
        let err = Document::parse("[tool]\nenv = env\ngarbage\n").unwrap_err();
        assert_eq!(err.line, 3);
        assert!(err.message.contains("key = value"));
    }

    #[test]
    fn test_parse_rejects_entry_before_any_section() {
        let err = Document::parse("env = env\n").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.message.contains("outside"));
    }

    #[test]
    fn test_parse_rejects_unterminated_section_header() {
        let err = Document::parse("[tool\nenv = env\n").unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_parse_rejects_missing_key() {
        let err = Document::parse("[tool]\n= value\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("key"));
    }

    #[test]
    fn test_duplicate_keys_kept_in_order() {
        let document = Document::parse("[tool]\nenv = a\nenv = b\n").unwrap();
        assert_eq!(
            document.section("tool").unwrap(),
            &[
                ("env".to_string(), "a".to_string()),
                ("env".to_string(), "b".to_string()),
            ]
        );
    }

    #[test]
    fn test_value_may_contain_delimiters() {
        let document =
            Document::parse("[tool]\nhook = echo url: http://localhost\n").unwrap();
        assert_eq!(
            document.section("tool").unwrap(),
            &[(
                "hook".to_string(),
                "echo url: http://localhost".to_string()
            )]
        );
    }

    #[test]
    fn test_empty_document() {
        let document = Document::parse("").unwrap();
        assert!(document.section("tool").is_none());
    }
}
