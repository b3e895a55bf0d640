//! Checking that a concrete type implements a duck type
//!
//! A type implements a duck type when reading one of its instances through
//! the duck loses nothing the duck knows about: every field of the duck's
//! encoding must appear, with the same value, in the instance's encoding.

use serde::Serialize;
use serde_json::Value;

use crate::duck::Duck;
use crate::error::{DuckError, Result};

/// Verify that `instance` can be read through duck type `D` without loss.
///
/// Typically called from a test with a fully populated instance, so that a
/// field renamed or retyped in the concrete type is caught.
pub fn verify_type<D: Duck, I: Serialize>(instance: &I) -> Result<()> {
    let not_implemented = |message: String| DuckError::NotImplemented {
        type_name: std::any::type_name::<I>().to_string(),
        duck: std::any::type_name::<D>(),
        message,
    };

    let encoded = serde_json::to_value(instance)?;
    let duck: D = serde_json::from_value(encoded.clone())
        .map_err(|e| not_implemented(format!("failed to decode: {}", e)))?;
    let roundtrip = serde_json::to_value(&duck)?;

    match first_difference("", &roundtrip, Some(&encoded)) {
        None => Ok(()),
        Some(path) => Err(not_implemented(format!(
            "field {} does not round-trip",
            if path.is_empty() { "." } else { path.as_str() }
        ))),
    }
}

/// Path of the first duck field missing from, or different in, `instance`.
///
/// Empty objects and nulls in the duck encoding match an absent field.
fn first_difference(path: &str, duck: &Value, instance: Option<&Value>) -> Option<String> {
    match duck {
        Value::Null => match instance {
            None | Some(Value::Null) => None,
            Some(_) => Some(path.to_string()),
        },
        Value::Object(fields) => {
            let instance_fields = match instance {
                Some(Value::Object(m)) => Some(m),
                None | Some(Value::Null) => None,
                Some(_) => return Some(path.to_string()),
            };
            fields.iter().find_map(|(key, value)| {
                first_difference(
                    &format!("{}.{}", path, key),
                    value,
                    instance_fields.and_then(|m| m.get(key)),
                )
            })
        }
        Value::Array(items) => match instance {
            Some(Value::Array(other)) if other.len() == items.len() => items
                .iter()
                .zip(other)
                .enumerate()
                .find_map(|(i, (a, b))| first_difference(&format!("{}[{}]", path, i), a, Some(b))),
            _ => Some(path.to_string()),
        },
        scalar => (instance != Some(scalar)).then(|| path.to_string()),
    }
}
