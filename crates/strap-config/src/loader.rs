//! Reading the optional config document from disk

use std::path::Path;

use crate::document::{Document, SyntaxError};
use crate::error::{Error, Result};
use crate::store::{ConfigStore, Section};
use crate::value;

/// Default config file, looked up relative to the working directory.
///
/// Its absence is normal; any other missing path is an error.
pub const DEFAULT_CONFIG: &str = "strap.cfg";

/// Load configuration values from `path`.
///
/// Returns only the values present in the document; defaults and
/// command-line values are layered on by [`merge`](crate::merge). A
/// document that exists but does not parse is always a hard error.
pub fn load(path: &str) -> Result<ConfigStore> {
    let is_default = path == DEFAULT_CONFIG;
    let expanded = expand_path(path);
    let file = Path::new(&expanded);

    if !file.is_file() {
        if is_default {
            tracing::debug!(path = %expanded, "default config absent, using built-in defaults");
            return Ok(ConfigStore::default());
        }
        return Err(Error::ConfigNotFound { path: expanded });
    }

    let text = std::fs::read_to_string(file)?;
    tracing::debug!(path = %expanded, "loaded config document");
    parse_store(&text).map_err(|err| Error::ConfigParse {
        path: expanded,
        line: err.line,
        message: err.message,
    })
}

/// Parse document text into a partially-populated store.
///
/// Every key found under a recognized section is coerced and kept, known
/// or not; unknown sections are ignored.
pub fn parse_store(text: &str) -> std::result::Result<ConfigStore, SyntaxError> {
    let document = Document::parse(text)?;
    let mut store = ConfigStore::default();

    for section in Section::ALL {
        let Some(entries) = document.section(section.name()) else {
            continue;
        };
        for (key, raw) in entries {
            let value = value::coerce_entry(section, key, raw);
            store.section_mut(section).insert(key.clone(), value);
        }
    }

    Ok(store)
}

/// Expand `~` and `$VAR`/`${VAR}` references in a config path.
///
/// Unknown variables are left verbatim.
pub fn expand_path(path: &str) -> String {
    expand_path_with(path, |name| std::env::var(name).ok())
}

fn expand_path_with(path: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let tilde_expanded = if path == "~" || path.starts_with("~/") {
        match dirs::home_dir() {
            Some(home) => format!("{}{}", home.display(), &path[1..]),
            None => path.to_string(),
        }
    } else {
        path.to_string()
    };

    let mut out = String::with_capacity(tilde_expanded.len());
    let mut chars = tilde_expanded.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        let braced = chars.peek() == Some(&'{');
        if braced {
            chars.next();
        }

        let mut name = String::new();
        while let Some(&next) = chars.peek() {
            let keep = if braced {
                next != '}'
            } else {
                next.is_ascii_alphanumeric() || next == '_'
            };
            if !keep {
                break;
            }
            name.push(next);
            chars.next();
        }
        if braced {
            // consume the closing brace if present
            if chars.peek() == Some(&'}') {
                chars.next();
            } else {
                out.push_str("${");
                out.push_str(&name);
                continue;
            }
        }

        if name.is_empty() {
            out.push('$');
            continue;
        }

        match lookup(&name) {
            Some(value) => out.push_str(&value),
            None if braced => {
                out.push_str("${");
                out.push_str(&name);
                out.push('}');
            }
            None => {
                out.push('$');
                out.push_str(&name);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::error::Error;
    use crate::value::Value;

    fn write_config(dir: &TempDir, name: &str, content: &str) -> String {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path.display().to_string()
    }

    #[test]
    fn test_load_typed_values() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "strap.cfg",
            "[tool]\nenv = .venv\nquiet = yes\npre_requirements = git hg\n\n\
             [installer]\ntimeout = 30\nallow_external = pkg other\n\n\
             [envTool]\nsystem_site_packages = on\n",
        );

        let store = load(&path).unwrap();

        assert_eq!(store.tool.get("env"), Some(&Value::Str(".venv".to_string())));
        assert_eq!(store.tool.get("quiet"), Some(&Value::Bool(true)));
        assert_eq!(
            store.tool.get("pre_requirements"),
            Some(&Value::List(vec!["git".to_string(), "hg".to_string()]))
        );
        assert_eq!(store.installer.get("timeout"), Some(&Value::Int(30)));
        assert_eq!(
            store.installer.get("allow_external"),
            Some(&Value::List(vec!["pkg".to_string(), "other".to_string()]))
        );
        assert_eq!(
            store.env_tool.get("system_site_packages"),
            Some(&Value::Bool(true))
        );
    }

    #[test]
    fn test_load_default_path_missing_is_empty() {
        // Relies on no strap.cfg existing in the test working directory.
        let store = load(DEFAULT_CONFIG).unwrap();
        assert_eq!(store, ConfigStore::default());
    }

    #[test]
    fn test_load_explicit_path_missing_is_an_error() {
        let err = load("/does/not/exist.cfg").unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }

    #[test]
    fn test_load_malformed_document_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "broken.cfg", "[tool]\nenv = env\nnot a pair\n");

        let err = load(&path).unwrap_err();
        match err {
            Error::ConfigParse { line, .. } => assert_eq!(line, 3),
            other => panic!("expected ConfigParse, got {other:?}"),
        }
    }

    #[test]
    fn test_unrecognized_keys_are_retained() {
        let store = parse_store("[installer]\nindex_url = https://example.test/simple\n").unwrap();
        assert_eq!(
            store.installer.get("index_url"),
            Some(&Value::Str("https://example.test/simple".to_string()))
        );
    }

    #[test]
    fn test_unknown_sections_are_ignored() {
        let store = parse_store("[future]\nkey = value\n").unwrap();
        assert_eq!(store, ConfigStore::default());
    }

    #[test]
    fn test_expand_path_home() {
        let expanded = expand_path("~/strap.cfg");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expanded, format!("{}/strap.cfg", home.display()));
        }
    }

    #[test]
    fn test_expand_path_plain_variable() {
        let expanded = expand_path_with("$BASE/strap.cfg", |name| {
            (name == "BASE").then(|| "/opt/project".to_string())
        });
        assert_eq!(expanded, "/opt/project/strap.cfg");
    }

    #[test]
    fn test_expand_path_braced_variable() {
        let expanded = expand_path_with("${BASE}dir/strap.cfg", |name| {
            (name == "BASE").then(|| "/opt/".to_string())
        });
        assert_eq!(expanded, "/opt/dir/strap.cfg");
    }

    #[test]
    fn test_expand_path_unknown_variable_left_verbatim() {
        let expanded = expand_path_with("$MISSING/strap.cfg", |_| None);
        assert_eq!(expanded, "$MISSING/strap.cfg");

        let expanded = expand_path_with("${MISSING}/strap.cfg", |_| None);
        assert_eq!(expanded, "${MISSING}/strap.cfg");
    }

    #[test]
    fn test_expand_path_without_references_is_identity() {
        let expanded = expand_path_with("configs/strap.cfg", |_| None);
        assert_eq!(expanded, "configs/strap.cfg");
    }
}
