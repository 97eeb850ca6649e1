//! Core value types shared by the registry, the projector and the static mirror.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Suffix marking an array value type in definition documents (`"string[]"`).
pub const ARRAY_SUFFIX: &str = "[]";

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Output type of a scalar field.
///
/// Every value type named in a definition document must map onto one of these;
/// the registry refuses to start otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    String,
    Integer,
    Float,
    /// Arbitrary precision; travels as a JSON string or number.
    Decimal,
    Boolean,
    Date,
    Time,
    DateTime,
    Uuid,
    /// Free-form JSON object.
    Map,
    Array(Box<ValueType>),
}

impl ValueType {
    /// Parse a definition-document type name.
    ///
    /// Returns `None` for unknown names (caller should error).
    pub fn parse(name: &str) -> Option<Self> {
        if let Some(inner) = name.strip_suffix(ARRAY_SUFFIX) {
            return Self::parse(inner).map(|t| ValueType::Array(Box::new(t)));
        }

        match name {
            "string" | "ci_string" | "atom" => Some(ValueType::String),
            "integer" => Some(ValueType::Integer),
            "float" => Some(ValueType::Float),
            "decimal" => Some(ValueType::Decimal),
            "boolean" => Some(ValueType::Boolean),
            "date" => Some(ValueType::Date),
            "time" => Some(ValueType::Time),
            "utc_datetime" | "utc_datetime_usec" | "naive_datetime" => Some(ValueType::DateTime),
            "uuid" => Some(ValueType::Uuid),
            "map" => Some(ValueType::Map),
            _ => None,
        }
    }

    /// Canonical name, the inverse of [`ValueType::parse`] for canonical names.
    pub fn name(&self) -> String {
        match self {
            ValueType::String => "string".to_string(),
            ValueType::Integer => "integer".to_string(),
            ValueType::Float => "float".to_string(),
            ValueType::Decimal => "decimal".to_string(),
            ValueType::Boolean => "boolean".to_string(),
            ValueType::Date => "date".to_string(),
            ValueType::Time => "time".to_string(),
            ValueType::DateTime => "utc_datetime".to_string(),
            ValueType::Uuid => "uuid".to_string(),
            ValueType::Map => "map".to_string(),
            ValueType::Array(inner) => format!("{}{}", inner.name(), ARRAY_SUFFIX),
        }
    }

    /// Whether a non-null JSON value has the shape this type serializes to.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueType::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (ValueType::Float, Value::Number(_)) => true,
            (ValueType::Decimal, Value::Number(_) | Value::String(_)) => true,
            (ValueType::Boolean, Value::Bool(_)) => true,
            (
                ValueType::String
                | ValueType::Date
                | ValueType::Time
                | ValueType::DateTime
                | ValueType::Uuid,
                Value::String(_),
            ) => true,
            (ValueType::Map, Value::Object(_)) => true,
            (ValueType::Array(inner), Value::Array(items)) => {
                items.iter().all(|item| item.is_null() || inner.accepts(item))
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

/// Whether a relationship or embedded record holds one value or a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    #[default]
    One,
    Many,
}

impl Cardinality {
    pub fn is_many(self) -> bool {
        matches!(self, Cardinality::Many)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn value_type_parse_aliases() {
        assert_eq!(ValueType::parse("ci_string"), Some(ValueType::String));
        assert_eq!(ValueType::parse("atom"), Some(ValueType::String));
        assert_eq!(ValueType::parse("utc_datetime_usec"), Some(ValueType::DateTime));
        assert_eq!(ValueType::parse("naive_datetime"), Some(ValueType::DateTime));
    }

    #[test]
    fn value_type_parse_arrays() {
        assert_eq!(
            ValueType::parse("integer[]"),
            Some(ValueType::Array(Box::new(ValueType::Integer)))
        );
        assert_eq!(
            ValueType::parse("string[][]"),
            Some(ValueType::Array(Box::new(ValueType::Array(Box::new(
                ValueType::String
            )))))
        );
    }

    #[test]
    fn value_type_parse_unknown() {
        assert_eq!(ValueType::parse("tuple"), None);
        assert_eq!(ValueType::parse("[]"), None);
        assert_eq!(ValueType::parse(""), None);
    }

    #[test]
    fn value_type_name_roundtrips_canonical_names() {
        for name in ["string", "integer", "decimal", "utc_datetime", "uuid[]"] {
            assert_eq!(ValueType::parse(name).unwrap().name(), name);
        }
    }

    #[test]
    fn value_type_accepts() {
        assert!(ValueType::Integer.accepts(&json!(3)));
        assert!(!ValueType::Integer.accepts(&json!(3.5)));
        assert!(ValueType::Float.accepts(&json!(3)));
        assert!(ValueType::Decimal.accepts(&json!("10.25")));
        assert!(ValueType::Uuid.accepts(&json!("0b8f")));
        assert!(!ValueType::Boolean.accepts(&json!("true")));
        assert!(ValueType::parse("string[]")
            .unwrap()
            .accepts(&json!(["a", null, "b"])));
        assert!(!ValueType::parse("string[]").unwrap().accepts(&json!([1])));
    }
}
