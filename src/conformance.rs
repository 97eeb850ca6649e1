//! Structural check of projected output against a static output shape.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::mirror::TypeShape;
use crate::types::json_type_name;

/// One disagreement between a value and its expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShapeMismatch {
    /// JSON pointer into the value (e.g., "/comments/0/body").
    pub path: String,
    pub message: String,
}

impl fmt::Display for ShapeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        write!(f, "{}: {}", path, self.message)
    }
}

/// Check `value` against `shape`: exact key sets, nullability and scalar kinds.
///
/// # Errors
///
/// Returns every mismatch found, not only the first.
pub fn conform(shape: &TypeShape, value: &Value) -> Result<(), Vec<ShapeMismatch>> {
    let mut mismatches = Vec::new();
    check(shape, value, "", &mut mismatches);
    if mismatches.is_empty() {
        Ok(())
    } else {
        Err(mismatches)
    }
}

fn check(shape: &TypeShape, value: &Value, path: &str, out: &mut Vec<ShapeMismatch>) {
    if value.is_null() {
        if !shape.nullable() {
            out.push(mismatch(path, "null for a non-nullable value"));
        }
        return;
    }

    match shape {
        TypeShape::Scalar { value_type, .. } => {
            if !value_type.accepts(value) {
                out.push(mismatch(
                    path,
                    format!("expected {}, got {}", value_type, json_type_name(value)),
                ));
            }
        }

        TypeShape::Object { fields, .. } => {
            let Some(map) = value.as_object() else {
                out.push(mismatch(
                    path,
                    format!("expected object, got {}", json_type_name(value)),
                ));
                return;
            };

            let expected: HashSet<&str> = fields.iter().map(|f| f.key.as_str()).collect();
            for key in map.keys() {
                if !expected.contains(key.as_str()) {
                    out.push(mismatch(&pointer(path, key), "unexpected key"));
                }
            }
            for field in fields {
                match map.get(&field.key) {
                    Some(child) => check(&field.shape, child, &pointer(path, &field.key), out),
                    None => out.push(mismatch(&pointer(path, &field.key), "missing key")),
                }
            }
        }

        TypeShape::List { item, .. } => {
            let Some(items) = value.as_array() else {
                out.push(mismatch(
                    path,
                    format!("expected array, got {}", json_type_name(value)),
                ));
                return;
            };
            for (i, element) in items.iter().enumerate() {
                check(item, element, &pointer(path, &i.to_string()), out);
            }
        }

        TypeShape::Union { variants, .. } => {
            let Some(map) = value.as_object() else {
                out.push(mismatch(
                    path,
                    format!("expected tagged union, got {}", json_type_name(value)),
                ));
                return;
            };
            if map.len() != 1 {
                out.push(mismatch(
                    path,
                    format!("union must carry exactly one variant, got {}", map.len()),
                ));
                return;
            }
            for (tag, payload) in map {
                match variants.iter().find(|v| v.key == *tag) {
                    Some(variant) => check(&variant.shape, payload, &pointer(path, tag), out),
                    None => out.push(mismatch(&pointer(path, tag), "variant was not selected")),
                }
            }
        }
    }
}

fn pointer(path: &str, segment: &str) -> String {
    // RFC 6901 escaping
    format!("{}/{}", path, segment.replace('~', "~0").replace('/', "~1"))
}

fn mismatch(path: &str, message: impl Into<String>) -> ShapeMismatch {
    ShapeMismatch {
        path: path.to_string(),
        message: message.into(),
    }
}
