//! Replacement expressions for live edits.
//!
//! Editing a nested leaf replaces the whole top-level value: the current
//! serialized value is copied, the leaf substituted, and the result printed
//! back as an expression the page can evaluate.

use serde_json::Value;

/// Copy of `root` with the value at `path` replaced by `leaf`.
///
/// Object segments are keys (created when missing on the last step); array
/// segments are indices that must exist. `None` when the path does not fit.
pub fn replace_at_path(root: &Value, path: &[String], leaf: Value) -> Option<Value> {
    let mut updated = root.clone();
    let mut slot = &mut updated;
    for (depth, segment) in path.iter().enumerate() {
        let last = depth + 1 == path.len();
        slot = match slot {
            Value::Object(map) => {
                if last {
                    map.entry(segment.clone()).or_insert(Value::Null)
                } else {
                    map.get_mut(segment)?
                }
            }
            Value::Array(items) => items.get_mut(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    *slot = leaf;
    Some(updated)
}

/// Prints a serialized value as source text.
///
/// Function descriptors print their source and symbol descriptors a fresh
/// symbol with the same description, so untouched siblings survive a
/// round-trip through the page.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            if map.get("isFunction") == Some(&Value::Bool(true)) {
                return map
                    .get("source")
                    .and_then(Value::as_str)
                    .unwrap_or("undefined")
                    .to_string();
            }
            if map.get("isSymbol") == Some(&Value::Bool(true)) {
                let name = map.get("name").and_then(Value::as_str).unwrap_or_default();
                let description = name
                    .strip_prefix("Symbol(")
                    .and_then(|rest| rest.strip_suffix(')'))
                    .unwrap_or(name);
                return format!("Symbol({})", quote(description));
            }
            let fields: Vec<String> = map
                .iter()
                .map(|(key, value)| format!("{}: {}", quote(key), stringify(value)))
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(stringify).collect();
            format!("[{}]", items.join(", "))
        }
        Value::String(s) => quote(s),
        other => other.to_string(),
    }
}

fn quote(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

/// Expression for the top-level value `root` after setting `path` to `leaf`.
pub fn edit_expression(root: &Value, path: &[String], leaf: Value) -> Option<String> {
    replace_at_path(root, path, leaf).map(|value| stringify(&value))
}
