//! Result projection - reshapes raw fetched data into exactly the selected shape.
//!
//! Raw data is keyed by canonical field names. The output carries exactly the
//! selected keys, renamed by the naming convention, in selection order.

use serde_json::{Map, Value};

use crate::naming::NamingConvention;
use crate::registry::{Registry, ResourceDescriptor};
use crate::selection::{Children, SelectionEntry, SelectionNode, VariantSelection};
use crate::types::json_type_name;

/// Key holding the active variant tag of a raw union value.
pub const UNION_TAG_KEY: &str = "type";
/// Key holding the payload of a raw union value.
pub const UNION_VALUE_KEY: &str = "value";

/// Projects raw records through parsed selections.
#[derive(Debug, Clone, Copy)]
pub struct Projector<'a> {
    registry: &'a Registry,
    naming: &'a NamingConvention,
}

impl<'a> Projector<'a> {
    pub fn new(registry: &'a Registry, naming: &'a NamingConvention) -> Self {
        Self { registry, naming }
    }

    /// Project a raw record, a list of records, or null.
    ///
    /// Never fails: missing keys project to `null`, and values of the wrong
    /// JSON kind for a record project to `null` with a warning.
    pub fn project(&self, raw: &Value, node: &SelectionNode) -> Value {
        match raw {
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.project(item, node))
                    .collect(),
            ),
            Value::Object(record) => Value::Object(self.project_record(record, node)),
            Value::Null => Value::Null,
            other => {
                tracing::warn!(
                    resource = %node.resource,
                    found = json_type_name(other),
                    "expected a record in raw data"
                );
                Value::Null
            }
        }
    }

    fn project_record(&self, record: &Map<String, Value>, node: &SelectionNode) -> Map<String, Value> {
        let resource = self.registry.get(&node.resource);
        let mut output = Map::new();

        for entry in &node.entries {
            let raw = match record.get(&entry.name) {
                Some(value) => value,
                None => {
                    warn_missing(resource, node, entry);
                    &Value::Null
                }
            };
            output.insert(self.naming.encode(&entry.name), self.project_entry(raw, entry));
        }

        output
    }

    fn project_entry(&self, raw: &Value, entry: &SelectionEntry) -> Value {
        match &entry.children {
            // Scalars (attributes, aggregates, scalar calculations) pass through.
            Children::None => raw.clone(),
            Children::Fields(child) => self.project(raw, child),
            Children::Variants(variants) => self.project_union(raw, variants, &entry.name),
        }
    }

    /// Narrow a raw `{"type": tag, "value": payload}` to `{tag: payload}`.
    ///
    /// Yields `null` when the value is null, or when its active variant was
    /// not selected.
    fn project_union(&self, raw: &Value, variants: &[VariantSelection], field: &str) -> Value {
        match raw {
            Value::Null => Value::Null,
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.project_union(item, variants, field))
                    .collect(),
            ),
            Value::Object(tagged) => {
                let Some(tag) = tagged.get(UNION_TAG_KEY).and_then(Value::as_str) else {
                    tracing::warn!(field, "union value has no active tag");
                    return Value::Null;
                };
                let Some(variant) = variants.iter().find(|v| v.tag == tag) else {
                    return Value::Null;
                };
                let payload = tagged.get(UNION_VALUE_KEY).unwrap_or(&Value::Null);
                if payload.is_null() {
                    return Value::Null;
                }

                let projected = match &variant.children {
                    Some(child) => self.project(payload, child),
                    None => payload.clone(),
                };
                let mut output = Map::new();
                output.insert(self.naming.encode(&variant.tag), projected);
                Value::Object(output)
            }
            other => {
                tracing::warn!(
                    field,
                    found = json_type_name(other),
                    "expected a tagged union value in raw data"
                );
                Value::Null
            }
        }
    }
}

/// Project `raw` through `node`.
pub fn project(
    raw: &Value,
    node: &SelectionNode,
    registry: &Registry,
    naming: &NamingConvention,
) -> Value {
    Projector::new(registry, naming).project(raw, node)
}

fn warn_missing(resource: Option<&ResourceDescriptor>, node: &SelectionNode, entry: &SelectionEntry) {
    let nullable = resource
        .and_then(|r| r.field(&entry.name))
        .map(|f| f.nullable())
        .unwrap_or(true);
    if !nullable {
        tracing::warn!(
            resource = %node.resource,
            field = %entry.name,
            "raw data lacks a non-nullable field"
        );
    }
}
