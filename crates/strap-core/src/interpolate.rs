//! `{name}` placeholder expansion for configuration values

use std::collections::HashMap;

use strap_config::{SectionMap, Value};

use crate::error::{Error, Result};

/// Name→value context for placeholder expansion.
///
/// Built once per orchestration run: the resolved runtime paths are overlaid
/// on a snapshot of the process environment, so config values can reference
/// any inherited environment variable by name.
#[derive(Debug, Clone, Default)]
pub struct InterpolationContext {
    vars: HashMap<String, String>,
}

impl InterpolationContext {
    /// Context seeded from the current process environment.
    pub fn from_env() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Empty context, for tests and custom assembly.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Overlay a binding, replacing any inherited one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Expand `{name}` placeholders in `template`.
    ///
    /// `{{` and `}}` escape literal braces. A placeholder naming nothing in
    /// the context is an error; placeholder text is never left in place.
    pub fn expand(&self, template: &str) -> Result<String> {
        let mut out = String::with_capacity(template.len());
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    if chars.peek() == Some(&'{') {
                        chars.next();
                        out.push('{');
                        continue;
                    }
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(ch) => name.push(ch),
                            None => return Err(Error::Interpolation { name }),
                        }
                    }
                    match self.vars.get(&name) {
                        Some(value) => out.push_str(value),
                        None => return Err(Error::Interpolation { name }),
                    }
                }
                '}' => {
                    if chars.peek() == Some(&'}') {
                        chars.next();
                    }
                    out.push('}');
                }
                _ => out.push(c),
            }
        }

        Ok(out)
    }

    /// Expand every string value of a section into a fresh mapping.
    ///
    /// The input section is left untouched; stages must not leak
    /// interpolation results into each other. Non-string values pass
    /// through unchanged.
    pub fn expand_section(&self, section: &SectionMap) -> Result<SectionMap> {
        let mut out = section.clone();
        for value in out.values_mut() {
            if let Value::Str(s) = value {
                *value = Value::Str(self.expand(s)?);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn context() -> InterpolationContext {
        let mut ctx = InterpolationContext::empty();
        ctx.set("env", ".venv");
        ctx.set("requirements", "requirements.txt");
        ctx.set("pip", "/work/.venv/bin/pip");
        ctx
    }

    #[test]
    fn test_expand_single_placeholder() {
        assert_eq!(
            context().expand("--prefix={env}").unwrap(),
            "--prefix=.venv"
        );
    }

    #[test]
    fn test_expand_whole_string_command() {
        assert_eq!(
            context()
                .expand("{pip} install -r {requirements}")
                .unwrap(),
            "/work/.venv/bin/pip install -r requirements.txt"
        );
    }

    #[test]
    fn test_expand_unknown_name_is_an_error() {
        let err = context().expand("{nope}").unwrap_err();
        assert!(matches!(
            err,
            Error::Interpolation { name } if name == "nope"
        ));
    }

    #[test]
    fn test_expand_unterminated_placeholder_is_an_error() {
        assert!(context().expand("{env").is_err());
    }

    #[test]
    fn test_expand_escaped_braces() {
        assert_eq!(context().expand("{{env}}").unwrap(), "{env}");
        assert_eq!(context().expand("a {{ b }} c").unwrap(), "a { b } c");
    }

    #[test]
    fn test_expand_without_placeholders_is_identity() {
        assert_eq!(context().expand("plain text").unwrap(), "plain text");
    }

    #[test]
    fn test_overlay_wins_over_inherited_environment() {
        let mut ctx = InterpolationContext::from_env();
        ctx.set("PATH", "overlaid");
        assert_eq!(ctx.get("PATH"), Some("overlaid"));
    }

    #[test]
    fn test_from_env_snapshots_process_environment() {
        // PATH is about the only variable safe to assume everywhere.
        let ctx = InterpolationContext::from_env();
        assert!(ctx.get("PATH").is_some());
    }

    #[test]
    fn test_expand_section_strings_only() {
        use strap_config::Value;

        let mut section = SectionMap::new();
        section.insert("find_links".to_string(), Value::Str("{env}/wheels".to_string()));
        section.insert("timeout".to_string(), Value::Int(30));
        section.insert("no_index".to_string(), Value::Bool(true));

        let expanded = context().expand_section(&section).unwrap();

        assert_eq!(
            expanded.get("find_links"),
            Some(&Value::Str(".venv/wheels".to_string()))
        );
        assert_eq!(expanded.get("timeout"), Some(&Value::Int(30)));
        assert_eq!(expanded.get("no_index"), Some(&Value::Bool(true)));
        // the source section is untouched
        assert_eq!(
            section.get("find_links"),
            Some(&Value::Str("{env}/wheels".to_string()))
        );
    }
}
