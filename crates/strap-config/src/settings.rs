//! Typed view over the merged `tool` section

use crate::store::{ConfigStore, SectionMap};
use crate::value::Value;

/// Resolved bootstrap settings, read-only after the merge.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Virtual environment name or path.
    pub env: String,
    /// Path to the requirements file; decides project vs. library mode.
    pub requirements: String,
    pub quiet: bool,
    pub recreate: bool,
    /// Ignore a pre-activated virtual environment.
    pub ignore_activated: bool,
    /// Install dev requirements after the primary install succeeds.
    pub dev_requirements: bool,
    /// Post-bootstrap hook command, when configured.
    pub hook: Option<String>,
    /// Executables that must resolve on the search path.
    pub pre_requirements: Vec<String>,
}

impl Settings {
    /// Extract the recognized keys from a merged store.
    pub fn from_store(store: &ConfigStore) -> Self {
        let tool = &store.tool;
        Self {
            env: str_key(tool, "env", "env"),
            requirements: str_key(tool, "requirements", "requirements.txt"),
            quiet: flag(tool, "quiet"),
            recreate: flag(tool, "recreate"),
            ignore_activated: flag(tool, "ignore_activated"),
            dev_requirements: flag(tool, "dev_requirements"),
            hook: tool
                .get("hook")
                .and_then(Value::as_str)
                .map(str::to_string),
            pre_requirements: tool
                .get("pre_requirements")
                .and_then(Value::as_list)
                .map(<[String]>::to_vec)
                .unwrap_or_default(),
        }
    }
}

fn str_key(tool: &SectionMap, key: &str, fallback: &str) -> String {
    match tool.get(key) {
        Some(Value::Str(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => fallback.to_string(),
    }
}

fn flag(tool: &SectionMap, key: &str) -> bool {
    tool.get(key).is_some_and(Value::truthy)
}
