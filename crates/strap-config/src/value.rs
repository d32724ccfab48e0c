//! Typed configuration values and raw-string coercion

use std::fmt;

use crate::error::CoercionError;
use crate::store::Section;

/// A configuration value, typed once at load time.
///
/// Every entry in a [`ConfigStore`](crate::ConfigStore) section is exactly
/// one of these kinds; the kind never changes after the merge step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Int(i64),
    Bool(bool),
    List(Vec<String>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Loose truthiness across kinds.
    ///
    /// A flag loaded as `quiet = 1` coerces to an integer before the boolean
    /// spellings are tried, so flag reads go through this instead of
    /// [`Value::as_bool`].
    pub fn truthy(&self) -> bool {
        match self {
            Value::Str(s) => !s.is_empty(),
            Value::Int(n) => *n != 0,
            Value::Bool(b) => *b,
            Value::List(items) => !items.is_empty(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{}", s),
            Value::Int(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::List(items) => write!(f, "{}", items.join(" ")),
        }
    }
}

/// Parse the recognized boolean spellings, case-insensitively.
pub fn parse_bool(raw: &str) -> Result<bool, CoercionError> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(CoercionError {
            raw: raw.to_string(),
        }),
    }
}

/// Coerce a raw document string into a typed value.
///
/// Integer parse is tried first (so `1`/`0` load as integers), then the
/// boolean spellings; anything that is neither stays a string. Coercion
/// never fails outright.
pub fn coerce(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<i64>() {
        return Value::Int(n);
    }
    match parse_bool(raw) {
        Ok(b) => Value::Bool(b),
        Err(_) => Value::Str(raw.to_string()),
    }
}

/// A section/key-specific transform applied after coercion.
///
/// When registered for a key, the transform's output is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Split a string on spaces into a list.
    SplitWords,
    /// Rewrite path separators to the platform's native form.
    NativePath,
}

impl Transform {
    pub fn apply(self, value: Value) -> Value {
        match self {
            Transform::SplitWords => match value {
                Value::Str(s) => Value::List(
                    s.split(' ')
                        .filter(|word| !word.is_empty())
                        .map(str::to_string)
                        .collect(),
                ),
                other => other,
            },
            Transform::NativePath => match value {
                Value::Str(s) => Value::Str(native_path(&s)),
                other => other,
            },
        }
    }
}

/// Look up the registered transform for a section/key pair.
pub fn transform_for(section: Section, key: &str) -> Option<Transform> {
    match (section, key) {
        (Section::Tool, "env") => Some(Transform::NativePath),
        (Section::Tool, "pre_requirements")
        | (Section::Installer, "allow_external")
        | (Section::Installer, "allow_unverified") => Some(Transform::SplitWords),
        _ => None,
    }
}

/// Coerce one document entry, applying its registered transform if any.
pub fn coerce_entry(section: Section, key: &str, raw: &str) -> Value {
    let value = coerce(raw);
    match transform_for(section, key) {
        Some(transform) => transform.apply(value),
        None => value,
    }
}

/// Replace forward slashes with backslashes on Windows.
pub fn native_path(path: &str) -> String {
    if cfg!(windows) {
        path.replace('/', "\\")
    } else {
        path.to_string()
    }
}
