//! Patches between two versions of a duck-typed object

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;

/// JSON patch (RFC 6902) turning `before` into `after`
pub fn create_patch<T: Serialize>(before: &T, after: &T) -> Result<json_patch::Patch> {
    let before = serde_json::to_value(before)?;
    let after = serde_json::to_value(after)?;
    Ok(json_patch::diff(&before, &after))
}

/// JSON merge patch (RFC 7386) turning `before` into `after`.
///
/// Removed keys are set to `null`; arrays are replaced wholesale.
pub fn create_merge_patch<T: Serialize>(before: &T, after: &T) -> Result<Value> {
    let before = serde_json::to_value(before)?;
    let after = serde_json::to_value(after)?;
    Ok(merge_diff(&before, &after).unwrap_or_else(|| Value::Object(Map::new())))
}

/// `None` when the values are equal
fn merge_diff(before: &Value, after: &Value) -> Option<Value> {
    match (before, after) {
        (Value::Object(old), Value::Object(new)) => {
            let mut patch = Map::new();
            for (key, value) in new {
                let changed = match old.get(key) {
                    Some(previous) => merge_diff(previous, value),
                    None => Some(value.clone()),
                };
                if let Some(changed) = changed {
                    patch.insert(key.clone(), changed);
                }
            }
            for key in old.keys().filter(|k| !new.contains_key(*k)) {
                patch.insert(key.clone(), Value::Null);
            }
            (!patch.is_empty()).then_some(Value::Object(patch))
        }
        _ if before == after => None,
        _ => Some(after.clone()),
    }
}
