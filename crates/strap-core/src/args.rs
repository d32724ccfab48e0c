//! Mapping → command-line argument serialization

use strap_config::{SectionMap, Value};

/// Serialize an interpolated section into command-line tokens.
///
/// Flag construction rules: boolean false drops the key entirely, boolean
/// true emits a bare `--flag`, a list repeats the flag once per element in
/// list order, and any other scalar emits the flag followed by its text
/// form (integers in base 10). Keys convert underscores to hyphens.
/// Entries serialize in the section's stable key order.
pub fn section_to_args(section: &SectionMap) -> Vec<String> {
    let mut args = Vec::new();

    for (key, value) in section {
        let flag = format!("--{}", key.replace('_', "-"));
        match value {
            Value::Bool(false) => {}
            Value::Bool(true) => args.push(flag),
            Value::List(items) => {
                for item in items {
                    args.push(flag.clone());
                    args.push(item.clone());
                }
            }
            Value::Int(n) => {
                args.push(flag);
                args.push(n.to_string());
            }
            Value::Str(s) => {
                args.push(flag);
                args.push(s.clone());
            }
        }
    }

    args
}
