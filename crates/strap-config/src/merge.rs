//! Three-tier configuration merge
//!
//! Precedence, highest to lowest: command-line values the user actually
//! supplied, loaded file values, built-in defaults. The installer and
//! env-tool sections are not settable from the command line, so for those
//! the merge is a plain defaults-then-file overlay.

use crate::store::{ConfigStore, Section, SectionMap};
use crate::value::Value;

/// Command-line values, pre-typed by the argument parser.
///
/// `None` means the flag was not provided, which the merge treats
/// differently from a provided falsy value.
#[derive(Debug, Clone, Default)]
pub struct CliValues {
    pub env: Option<String>,
    pub requirements: Option<String>,
    pub quiet: Option<bool>,
    pub recreate: Option<bool>,
    pub ignore_activated: Option<bool>,
    pub dev_requirements: Option<bool>,
    pub hook: Option<String>,
    pub pre_requirements: Vec<String>,
}

/// Built-in defaults, the lowest precedence tier.
pub fn defaults() -> ConfigStore {
    let mut store = ConfigStore::default();
    store
        .tool
        .insert("env".to_string(), Value::Str("env".to_string()));
    store.tool.insert(
        "requirements".to_string(),
        Value::Str("requirements.txt".to_string()),
    );
    store.tool.insert("quiet".to_string(), Value::Bool(false));
    store
}

/// Merge defaults, loaded file values and command-line values into the
/// final configuration.
///
/// Every key from the defaults is present in the result. The recognized
/// bootstrap flags are materialized to `false` when no tier set them;
/// `hook` stays absent when unset. An empty `--pre-requirements` list
/// carries no opinion and never clears a configured list.
pub fn merge(loaded: &ConfigStore, cli: &CliValues) -> ConfigStore {
    let mut merged = defaults();
    for section in Section::ALL {
        overlay(merged.section_mut(section), loaded.section(section));
    }

    let tool = &mut merged.tool;

    if let Some(env) = &cli.env {
        tool.insert("env".to_string(), Value::Str(env.clone()));
    }
    if let Some(requirements) = &cli.requirements {
        tool.insert("requirements".to_string(), Value::Str(requirements.clone()));
    }
    if let Some(hook) = &cli.hook {
        tool.insert("hook".to_string(), Value::Str(hook.clone()));
    }

    for (key, provided) in [
        ("quiet", cli.quiet),
        ("recreate", cli.recreate),
        ("ignore_activated", cli.ignore_activated),
        ("dev_requirements", cli.dev_requirements),
    ] {
        match provided {
            Some(flag) => {
                tool.insert(key.to_string(), Value::Bool(flag));
            }
            None => {
                tool.entry(key.to_string()).or_insert(Value::Bool(false));
            }
        }
    }

    if cli.pre_requirements.is_empty() {
        // An empty list is "no opinion", not "clear the list".
        tool.entry("pre_requirements".to_string())
            .or_insert_with(|| Value::List(Vec::new()));
    } else {
        tool.insert(
            "pre_requirements".to_string(),
            Value::List(cli.pre_requirements.clone()),
        );
    }

    tracing::debug!(?merged, "merged configuration");
    merged
}

fn overlay(base: &mut SectionMap, top: &SectionMap) {
    for (key, value) in top {
        base.insert(key.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::loader::parse_store;

    fn loaded(text: &str) -> ConfigStore {
        parse_store(text).unwrap()
    }

    #[test]
    fn test_defaults_alone() {
        let merged = merge(&ConfigStore::default(), &CliValues::default());

        assert_eq!(merged.tool.get("env"), Some(&Value::Str("env".to_string())));
        assert_eq!(
            merged.tool.get("requirements"),
            Some(&Value::Str("requirements.txt".to_string()))
        );
        assert_eq!(merged.tool.get("quiet"), Some(&Value::Bool(false)));
        assert_eq!(merged.tool.get("recreate"), Some(&Value::Bool(false)));
        assert_eq!(
            merged.tool.get("pre_requirements"),
            Some(&Value::List(Vec::new()))
        );
        assert_eq!(merged.tool.get("hook"), None);
        assert!(merged.installer.is_empty());
        assert!(merged.env_tool.is_empty());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let merged = merge(&loaded("[tool]\nenv = .venv\n"), &CliValues::default());
        assert_eq!(
            merged.tool.get("env"),
            Some(&Value::Str(".venv".to_string()))
        );
    }

    #[test]
    fn test_cli_overrides_file_and_defaults() {
        let cli = CliValues {
            env: Some("cli-env".to_string()),
            quiet: Some(true),
            ..CliValues::default()
        };
        let merged = merge(&loaded("[tool]\nenv = .venv\nquiet = no\n"), &cli);

        assert_eq!(
            merged.tool.get("env"),
            Some(&Value::Str("cli-env".to_string()))
        );
        assert_eq!(merged.tool.get("quiet"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_provided_falsy_cli_value_still_overrides() {
        let cli = CliValues {
            quiet: Some(false),
            ..CliValues::default()
        };
        let merged = merge(&loaded("[tool]\nquiet = yes\n"), &cli);
        assert_eq!(merged.tool.get("quiet"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_unprovided_flag_keeps_file_value() {
        let merged = merge(&loaded("[tool]\nquiet = yes\n"), &CliValues::default());
        assert_eq!(merged.tool.get("quiet"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_empty_cli_prerequisites_do_not_clear_configured_list() {
        let merged = merge(
            &loaded("[tool]\npre_requirements = git hg\n"),
            &CliValues::default(),
        );
        assert_eq!(
            merged.tool.get("pre_requirements"),
            Some(&Value::List(vec!["git".to_string(), "hg".to_string()]))
        );
    }

    #[test]
    fn test_nonempty_cli_prerequisites_override() {
        let cli = CliValues {
            pre_requirements: vec!["svn".to_string()],
            ..CliValues::default()
        };
        let merged = merge(&loaded("[tool]\npre_requirements = git hg\n"), &cli);
        assert_eq!(
            merged.tool.get("pre_requirements"),
            Some(&Value::List(vec!["svn".to_string()]))
        );
    }

    #[test]
    fn test_hook_absent_until_set() {
        let merged = merge(&ConfigStore::default(), &CliValues::default());
        assert_eq!(merged.tool.get("hook"), None);

        let cli = CliValues {
            hook: Some("make docs".to_string()),
            ..CliValues::default()
        };
        let merged = merge(&ConfigStore::default(), &cli);
        assert_eq!(
            merged.tool.get("hook"),
            Some(&Value::Str("make docs".to_string()))
        );
    }

    #[test]
    fn test_installer_and_env_tool_sections_overlay_from_file_only() {
        let merged = merge(
            &loaded("[installer]\ntimeout = 30\n\n[envTool]\nclear = yes\n"),
            &CliValues::default(),
        );
        assert_eq!(merged.installer.get("timeout"), Some(&Value::Int(30)));
        assert_eq!(merged.env_tool.get("clear"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_unrecognized_tool_keys_survive_the_merge() {
        let merged = merge(&loaded("[tool]\ncustom = 7\n"), &CliValues::default());
        assert_eq!(merged.tool.get("custom"), Some(&Value::Int(7)));
    }
}
