//! Selection parsing.
//!
//! Turns a client-submitted selection list into a [`SelectionNode`] tree whose
//! every name has been resolved to a canonical field and checked against the
//! registry. Nothing downstream re-validates existence.
//!
//! # Selection grammar
//!
//! ```text
//! SelectionList := [ Entry, ... ]
//! Entry         := "fieldName"
//!                | { "fieldName": SelectionList }
//!                | { "fieldName": { "args"?: { ... }, "fields"?: SelectionList } }
//! ```
//!
//! Union fields take a list of variant tags instead of field names; record
//! variants carry their own nested list.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SelectionError;
use crate::naming::NamingConvention;
use crate::registry::{
    CalculationField, FieldDescriptor, FieldKind, Registry, ResourceDescriptor, UnionField,
    VariantShape,
};
use crate::types::json_type_name;

/// Keys used inside a nested selection object.
///
/// Which words are used is a configuration choice; after normalization only
/// one shape exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSyntax {
    #[serde(default = "default_fields_key")]
    pub fields_key: String,
    #[serde(default = "default_args_key")]
    pub args_key: String,
}

impl Default for SelectionSyntax {
    fn default() -> Self {
        Self {
            fields_key: default_fields_key(),
            args_key: default_args_key(),
        }
    }
}

fn default_fields_key() -> String {
    "fields".to_string()
}

fn default_args_key() -> String {
    "args".to_string()
}

/// Parsed, validated selection for one resource level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionNode {
    /// Resource the entries were validated against.
    pub resource: String,
    pub entries: Vec<SelectionEntry>,
}

impl SelectionNode {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            entries: Vec::new(),
        }
    }

    /// Canonical names in selection order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn entry(&self, name: &str) -> Option<&SelectionEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One selected field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionEntry {
    /// Canonical field name.
    pub name: String,
    /// Calculation arguments with declared defaults filled in.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub arguments: Map<String, Value>,
    #[serde(skip_serializing_if = "Children::is_none")]
    pub children: Children,
}

impl SelectionEntry {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Map::new(),
            children: Children::None,
        }
    }

    /// No arguments and no nested selection.
    pub fn is_leaf(&self) -> bool {
        self.arguments.is_empty() && self.children.is_none()
    }
}

/// Nested part of a selection entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Children {
    None,
    /// Relationship, embedded record or record-returning calculation.
    Fields(SelectionNode),
    /// Union field: the requested variants.
    Variants(Vec<VariantSelection>),
}

impl Children {
    pub fn is_none(&self) -> bool {
        matches!(self, Children::None)
    }
}

/// One requested union variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantSelection {
    pub tag: String,
    /// Present for record variants.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<SelectionNode>,
}

/// Parses raw selections against a registry.
#[derive(Debug, Clone, Copy)]
pub struct SelectionParser<'a> {
    registry: &'a Registry,
    naming: &'a NamingConvention,
    syntax: &'a SelectionSyntax,
}

impl<'a> SelectionParser<'a> {
    pub fn new(
        registry: &'a Registry,
        naming: &'a NamingConvention,
        syntax: &'a SelectionSyntax,
    ) -> Self {
        Self {
            registry,
            naming,
            syntax,
        }
    }

    /// Parse a selection list against `resource`.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError` for unknown fields or arguments, missing
    /// required arguments and entries whose shape does not fit the field.
    pub fn parse(
        &self,
        raw: &Value,
        resource: &ResourceDescriptor,
    ) -> Result<SelectionNode, SelectionError> {
        let node = self.parse_list(raw, resource, "")?;
        tracing::debug!(
            resource = resource.identifier(),
            entries = node.entries.len(),
            "parsed selection"
        );
        Ok(node)
    }

    fn parse_list(
        &self,
        raw: &Value,
        resource: &ResourceDescriptor,
        path: &str,
    ) -> Result<SelectionNode, SelectionError> {
        let Some(items) = raw.as_array() else {
            return Err(SelectionError::shape(
                resource.identifier(),
                path,
                format!("expected a selection list, got {}", json_type_name(raw)),
            ));
        };

        let mut node = SelectionNode::new(resource.identifier());
        let mut seen = HashSet::new();

        for item in items {
            let entry = match item {
                Value::String(client) => {
                    let field = self.resolve(resource, client, path)?;
                    self.parse_leaf(field, resource, &join(path, client))?
                }
                Value::Object(map) => {
                    let (client, body) = single_entry(map, resource, path)?;
                    let field = self.resolve(resource, client, path)?;
                    self.parse_nested(field, body, resource, &join(path, client))?
                }
                other => {
                    return Err(SelectionError::shape(
                        resource.identifier(),
                        path,
                        format!(
                            "selection entries must be strings or objects, got {}",
                            json_type_name(other)
                        ),
                    ))
                }
            };

            if !seen.insert(entry.name.clone()) {
                return Err(SelectionError::shape(
                    resource.identifier(),
                    &join(path, &self.naming.encode(&entry.name)),
                    "field is selected more than once",
                ));
            }
            node.entries.push(entry);
        }

        Ok(node)
    }

    fn resolve<'r>(
        &self,
        resource: &'r ResourceDescriptor,
        client: &str,
        path: &str,
    ) -> Result<&'r FieldDescriptor, SelectionError> {
        resource
            .resolve_client_name(client, self.naming)
            .ok_or_else(|| SelectionError::UnknownField {
                resource: resource.identifier().to_string(),
                field: join(path, client),
            })
    }

    /// A bare field name.
    fn parse_leaf(
        &self,
        field: &FieldDescriptor,
        resource: &ResourceDescriptor,
        path: &str,
    ) -> Result<SelectionEntry, SelectionError> {
        let name = field.name().to_string();
        match field {
            FieldDescriptor::Attribute(_) | FieldDescriptor::Aggregate(_) => {
                Ok(SelectionEntry::leaf(name))
            }
            FieldDescriptor::Calculation(calc) if !calc.returns_record() => Ok(SelectionEntry {
                name,
                arguments: self.parse_arguments(calc, None, resource, path)?,
                children: Children::None,
            }),
            FieldDescriptor::Embedded(embedded) => {
                let target = self.target(&embedded.target)?;
                Ok(SelectionEntry {
                    name,
                    arguments: Map::new(),
                    children: Children::Fields(attribute_selection(target)),
                })
            }
            FieldDescriptor::Union(union) if union.all_scalar() => Ok(SelectionEntry {
                name,
                arguments: Map::new(),
                children: Children::Variants(
                    union
                        .variants
                        .iter()
                        .map(|v| VariantSelection {
                            tag: v.tag.clone(),
                            children: None,
                        })
                        .collect(),
                ),
            }),
            _ => Err(SelectionError::shape(
                resource.identifier(),
                path,
                "field requires a nested selection",
            )),
        }
    }

    /// A `{ field: body }` object.
    fn parse_nested(
        &self,
        field: &FieldDescriptor,
        body: &Value,
        resource: &ResourceDescriptor,
        path: &str,
    ) -> Result<SelectionEntry, SelectionError> {
        let body = split_body(body, self.syntax)
            .map_err(|message| SelectionError::shape(resource.identifier(), path, message))?;
        let name = field.name().to_string();
        let kind = field.kind();

        if body.args.is_some() && !matches!(field, FieldDescriptor::Calculation(_)) {
            return Err(SelectionError::shape(
                resource.identifier(),
                path,
                "field does not accept arguments",
            ));
        }

        if body.fields.is_some() && !(kind.is_record() || kind == FieldKind::Union) {
            return Err(SelectionError::shape(
                resource.identifier(),
                path,
                "scalar field does not accept a nested selection",
            ));
        }

        match field {
            FieldDescriptor::Attribute(_) | FieldDescriptor::Aggregate(_) => {
                Ok(SelectionEntry::leaf(name))
            }

            FieldDescriptor::Calculation(calc) => {
                let arguments = self.parse_arguments(calc, body.args, resource, path)?;
                let children = match field.record_target() {
                    Some((target, _)) => {
                        let fields = require_fields(body.fields, resource, path)?;
                        Children::Fields(self.parse_list(fields, self.target(target)?, path)?)
                    }
                    None => Children::None,
                };
                Ok(SelectionEntry {
                    name,
                    arguments,
                    children,
                })
            }

            FieldDescriptor::Relationship(rel) => {
                let fields = require_fields(body.fields, resource, path)?;
                let target = self.target(&rel.target)?;
                Ok(SelectionEntry {
                    name,
                    arguments: Map::new(),
                    children: Children::Fields(self.parse_list(fields, target, path)?),
                })
            }

            FieldDescriptor::Embedded(embedded) => {
                let target = self.target(&embedded.target)?;
                let children = match body.fields {
                    Some(fields) => self.parse_list(fields, target, path)?,
                    None => attribute_selection(target),
                };
                Ok(SelectionEntry {
                    name,
                    arguments: Map::new(),
                    children: Children::Fields(children),
                })
            }

            FieldDescriptor::Union(union) => {
                let fields = require_fields(body.fields, resource, path)?;
                Ok(SelectionEntry {
                    name,
                    arguments: Map::new(),
                    children: Children::Variants(
                        self.parse_variants(union, fields, resource, path)?,
                    ),
                })
            }
        }
    }

    fn parse_variants(
        &self,
        union: &UnionField,
        raw: &Value,
        resource: &ResourceDescriptor,
        path: &str,
    ) -> Result<Vec<VariantSelection>, SelectionError> {
        let Some(items) = raw.as_array() else {
            return Err(SelectionError::shape(
                resource.identifier(),
                path,
                format!("expected a list of variants, got {}", json_type_name(raw)),
            ));
        };

        let mut selected = Vec::with_capacity(items.len());
        let mut seen = HashSet::new();

        for item in items {
            let (client, body) = match item {
                Value::String(client) => (client.as_str(), None),
                Value::Object(map) => {
                    let (client, body) = single_entry(map, resource, path)?;
                    (client, Some(body))
                }
                other => {
                    return Err(SelectionError::shape(
                        resource.identifier(),
                        path,
                        format!(
                            "variant entries must be strings or objects, got {}",
                            json_type_name(other)
                        ),
                    ))
                }
            };

            let variant_path = join(path, client);
            let variant = self
                .naming
                .resolve(client, union.variants.iter().map(|v| v.tag.as_str()))
                .and_then(|tag| union.variant(tag))
                .ok_or_else(|| SelectionError::UnknownField {
                    resource: resource.identifier().to_string(),
                    field: variant_path.clone(),
                })?;

            let children = match (&variant.shape, body) {
                (VariantShape::Scalar(_), None) => None,
                (VariantShape::Scalar(_), Some(_)) => {
                    return Err(SelectionError::shape(
                        resource.identifier(),
                        &variant_path,
                        "scalar variant does not accept a nested selection",
                    ))
                }
                (VariantShape::Record(_), None) => {
                    return Err(SelectionError::shape(
                        resource.identifier(),
                        &variant_path,
                        "record variant requires a nested selection",
                    ))
                }
                (VariantShape::Record(target), Some(body)) => {
                    let body = split_body(body, self.syntax).map_err(|message| {
                        SelectionError::shape(resource.identifier(), &variant_path, message)
                    })?;
                    if body.args.is_some() {
                        return Err(SelectionError::shape(
                            resource.identifier(),
                            &variant_path,
                            "variant does not accept arguments",
                        ));
                    }
                    let fields = require_fields(body.fields, resource, &variant_path)?;
                    Some(self.parse_list(fields, self.target(target)?, &variant_path)?)
                }
            };

            if !seen.insert(variant.tag.clone()) {
                return Err(SelectionError::shape(
                    resource.identifier(),
                    &variant_path,
                    "variant is selected more than once",
                ));
            }
            selected.push(VariantSelection {
                tag: variant.tag.clone(),
                children,
            });
        }

        Ok(selected)
    }

    /// Validate supplied arguments against the declaration and fill defaults.
    fn parse_arguments(
        &self,
        calc: &CalculationField,
        supplied: Option<&Map<String, Value>>,
        resource: &ResourceDescriptor,
        path: &str,
    ) -> Result<Map<String, Value>, SelectionError> {
        let mut provided = Map::new();
        if let Some(supplied) = supplied {
            for (client, value) in supplied {
                let name = self
                    .naming
                    .resolve(client, calc.arguments.iter().map(|a| a.name.as_str()))
                    .ok_or_else(|| SelectionError::UnknownArgument {
                        resource: resource.identifier().to_string(),
                        field: path.to_string(),
                        argument: client.clone(),
                    })?;
                provided.insert(name.to_string(), value.clone());
            }
        }

        let mut arguments = Map::new();
        for declared in &calc.arguments {
            match provided.remove(&declared.name) {
                Some(Value::Null) | None if declared.required => {
                    return Err(SelectionError::MissingRequiredArgument {
                        resource: resource.identifier().to_string(),
                        field: path.to_string(),
                        argument: self.naming.encode(&declared.name),
                    })
                }
                Some(value) => {
                    arguments.insert(declared.name.clone(), value);
                }
                None => {
                    if let Some(default) = &declared.default {
                        arguments.insert(declared.name.clone(), default.clone());
                    }
                }
            }
        }
        Ok(arguments)
    }

    fn target(&self, identifier: &str) -> Result<&'a ResourceDescriptor, SelectionError> {
        // Targets were checked when the registry was built.
        self.registry
            .get(identifier)
            .ok_or_else(|| SelectionError::UnknownField {
                resource: identifier.to_string(),
                field: String::new(),
            })
    }
}

/// Parse `raw` against `resource` with the given naming and syntax.
pub fn parse_selection(
    raw: &Value,
    resource: &ResourceDescriptor,
    registry: &Registry,
    naming: &NamingConvention,
    syntax: &SelectionSyntax,
) -> Result<SelectionNode, SelectionError> {
    SelectionParser::new(registry, naming, syntax).parse(raw, resource)
}

/// Normalized nested-selection body.
pub(crate) struct Body<'v> {
    pub args: Option<&'v Map<String, Value>>,
    pub fields: Option<&'v Value>,
}

/// Normalize `{field: [...]}` and `{field: {args, fields}}` into one shape.
pub(crate) fn split_body<'v>(body: &'v Value, syntax: &SelectionSyntax) -> Result<Body<'v>, String> {
    match body {
        Value::Array(_) => Ok(Body {
            args: None,
            fields: Some(body),
        }),
        Value::Object(map) => {
            let mut parsed = Body {
                args: None,
                fields: None,
            };
            for (key, value) in map {
                if *key == syntax.fields_key {
                    parsed.fields = Some(value);
                } else if *key == syntax.args_key {
                    match value {
                        Value::Object(args) => parsed.args = Some(args),
                        other => {
                            return Err(format!(
                                "\"{}\" must be an object, got {}",
                                syntax.args_key,
                                json_type_name(other)
                            ))
                        }
                    }
                } else {
                    return Err(format!(
                        "unexpected key \"{}\": expected \"{}\" or \"{}\"",
                        key, syntax.fields_key, syntax.args_key
                    ));
                }
            }
            Ok(parsed)
        }
        other => Err(format!(
            "nested selection must be a list or object, got {}",
            json_type_name(other)
        )),
    }
}

/// The key and body of a single-key selection object.
fn single_entry<'v>(
    map: &'v Map<String, Value>,
    resource: &ResourceDescriptor,
    path: &str,
) -> Result<(&'v str, &'v Value), SelectionError> {
    let mut iter = map.iter();
    match (iter.next(), iter.next()) {
        (Some((key, body)), None) => Ok((key.as_str(), body)),
        _ => Err(SelectionError::shape(
            resource.identifier(),
            path,
            format!(
                "selection objects must have exactly one key, got {}",
                map.len()
            ),
        )),
    }
}

fn require_fields<'v>(
    fields: Option<&'v Value>,
    resource: &ResourceDescriptor,
    path: &str,
) -> Result<&'v Value, SelectionError> {
    fields.ok_or_else(|| {
        SelectionError::shape(
            resource.identifier(),
            path,
            "field requires a nested selection",
        )
    })
}

/// Leaf selection of every plain attribute of an embedded resource.
fn attribute_selection(target: &ResourceDescriptor) -> SelectionNode {
    SelectionNode {
        resource: target.identifier().to_string(),
        entries: target.attribute_names().map(SelectionEntry::leaf).collect(),
    }
}

pub(crate) fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::SchemaDefinition;
    use serde_json::json;

    fn registry() -> Registry {
        let def: SchemaDefinition = serde_json::from_value(json!({
            "resources": [
                {
                    "identifier": "post",
                    "fields": [
                        { "kind": "attribute", "name": "id", "type": "uuid" },
                        { "kind": "attribute", "name": "title", "type": "string" },
                        { "kind": "relationship", "name": "owner", "resource": "user" },
                        { "kind": "aggregate", "name": "comment_count", "aggregate": "count", "path": ["owner"] },
                        { "kind": "calculation", "name": "excerpt", "type": "string",
                          "arguments": [
                              { "name": "length", "type": "integer", "default": 40 },
                              { "name": "word_break", "type": "boolean", "required": true }
                          ] },
                        { "kind": "calculation", "name": "summary", "resource": "summary" },
                        { "kind": "embedded", "name": "metadata", "resource": "metadata" },
                        { "kind": "union", "name": "content", "variants": [
                            { "tag": "note", "type": "string" },
                            { "tag": "text", "resource": "text_content" }
                        ] },
                        { "kind": "union", "name": "rating", "variants": [
                            { "tag": "stars", "type": "integer" },
                            { "tag": "label", "type": "string" }
                        ] }
                    ]
                },
                {
                    "identifier": "user",
                    "fields": [{ "kind": "attribute", "name": "name", "type": "string" }]
                },
                {
                    "identifier": "summary",
                    "embedded": true,
                    "fields": [{ "kind": "attribute", "name": "headline", "type": "string" }]
                },
                {
                    "identifier": "metadata",
                    "embedded": true,
                    "fields": [
                        { "kind": "attribute", "name": "category", "type": "string" },
                        { "kind": "attribute", "name": "priority", "type": "integer" },
                        { "kind": "calculation", "name": "display_category", "type": "string" }
                    ]
                },
                {
                    "identifier": "text_content",
                    "embedded": true,
                    "fields": [
                        { "kind": "attribute", "name": "body", "type": "string" },
                        { "kind": "calculation", "name": "word_count", "type": "integer" }
                    ]
                }
            ]
        }))
        .unwrap();
        Registry::build(&def).unwrap()
    }

    fn parse(raw: Value) -> Result<SelectionNode, SelectionError> {
        let registry = registry();
        let naming = NamingConvention::camel_case();
        let syntax = SelectionSyntax::default();
        let post = registry.lookup("post").unwrap();
        parse_selection(&raw, post, &registry, &naming, &syntax)
    }

    #[test]
    fn parses_leaves() {
        let node = parse(json!(["id", "title", "commentCount"])).unwrap();
        let names: Vec<_> = node.names().collect();
        assert_eq!(names, vec!["id", "title", "comment_count"]);
        assert!(node.entries.iter().all(SelectionEntry::is_leaf));
    }

    #[test]
    fn aggregate_accepts_empty_object() {
        let node = parse(json!([{ "commentCount": {} }])).unwrap();
        assert!(node.entries[0].is_leaf());
    }

    #[test]
    fn unknown_field() {
        let err = parse(json!(["id", "nickname"])).unwrap_err();
        assert_eq!(
            err,
            SelectionError::UnknownField {
                resource: "post".into(),
                field: "nickname".into()
            }
        );
    }

    #[test]
    fn unknown_nested_field_reports_path() {
        let err = parse(json!([{ "owner": ["nickname"] }])).unwrap_err();
        assert!(matches!(
            err,
            SelectionError::UnknownField { ref resource, ref field }
                if resource == "user" && field == "owner.nickname"
        ));
    }

    #[test]
    fn relationship_requires_nested_selection() {
        let err = parse(json!(["owner"])).unwrap_err();
        assert!(matches!(err, SelectionError::InvalidSelectionShape { .. }));

        let err = parse(json!([{ "owner": {} }])).unwrap_err();
        assert!(matches!(err, SelectionError::InvalidSelectionShape { .. }));
    }

    #[test]
    fn relationship_with_fields_key() {
        let node = parse(json!([{ "owner": { "fields": ["name"] } }])).unwrap();
        let Children::Fields(child) = &node.entries[0].children else {
            panic!("expected nested fields");
        };
        assert_eq!(child.resource, "user");
        assert_eq!(child.names().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn scalar_field_rejects_nested_selection() {
        let err = parse(json!([{ "title": ["x"] }])).unwrap_err();
        assert!(matches!(err, SelectionError::InvalidSelectionShape { .. }));
    }

    #[test]
    fn arguments_are_validated_and_defaulted() {
        let node = parse(json!([{ "excerpt": { "args": { "wordBreak": true } } }])).unwrap();
        let entry = &node.entries[0];
        assert_eq!(entry.arguments.get("word_break"), Some(&json!(true)));
        assert_eq!(entry.arguments.get("length"), Some(&json!(40)));
        assert!(entry.children.is_none());
    }

    #[test]
    fn unknown_argument() {
        let err = parse(json!([{ "excerpt": { "args": { "wordBreak": true, "style": "x" } } }]))
            .unwrap_err();
        assert!(matches!(
            err,
            SelectionError::UnknownArgument { ref argument, .. } if argument == "style"
        ));
    }

    #[test]
    fn missing_required_argument() {
        let err = parse(json!(["excerpt"])).unwrap_err();
        assert!(matches!(
            err,
            SelectionError::MissingRequiredArgument { ref argument, .. } if argument == "wordBreak"
        ));

        let err = parse(json!([{ "excerpt": { "args": { "wordBreak": null } } }])).unwrap_err();
        assert!(matches!(err, SelectionError::MissingRequiredArgument { .. }));
    }

    #[test]
    fn arguments_rejected_on_non_calculation() {
        let err = parse(json!([{ "owner": { "args": {}, "fields": ["name"] } }])).unwrap_err();
        assert!(matches!(err, SelectionError::InvalidSelectionShape { .. }));
    }

    #[test]
    fn record_calculation_requires_fields() {
        let err = parse(json!(["summary"])).unwrap_err();
        assert!(matches!(err, SelectionError::InvalidSelectionShape { .. }));

        let node = parse(json!([{ "summary": { "fields": ["headline"] } }])).unwrap();
        assert!(matches!(node.entries[0].children, Children::Fields(_)));
    }

    #[test]
    fn embedded_leaf_expands_to_attributes() {
        let node = parse(json!(["metadata"])).unwrap();
        let Children::Fields(child) = &node.entries[0].children else {
            panic!("expected nested fields");
        };
        assert_eq!(
            child.names().collect::<Vec<_>>(),
            vec!["category", "priority"]
        );
    }

    #[test]
    fn embedded_with_computed_child() {
        let node = parse(json!([{ "metadata": ["category", "displayCategory"] }])).unwrap();
        let Children::Fields(child) = &node.entries[0].children else {
            panic!("expected nested fields");
        };
        assert_eq!(
            child.names().collect::<Vec<_>>(),
            vec!["category", "display_category"]
        );
    }

    #[test]
    fn union_variants() {
        let node = parse(json!([{ "content": ["note", { "text": ["wordCount"] }] }])).unwrap();
        let Children::Variants(variants) = &node.entries[0].children else {
            panic!("expected variants");
        };
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].tag, "note");
        assert!(variants[0].children.is_none());
        assert_eq!(
            variants[1].children.as_ref().unwrap().names().collect::<Vec<_>>(),
            vec!["word_count"]
        );
    }

    #[test]
    fn union_unknown_variant() {
        let err = parse(json!([{ "content": ["video"] }])).unwrap_err();
        assert!(matches!(
            err,
            SelectionError::UnknownField { ref field, .. } if field == "content.video"
        ));
    }

    #[test]
    fn union_variant_shapes() {
        let err = parse(json!([{ "content": ["text"] }])).unwrap_err();
        assert!(matches!(err, SelectionError::InvalidSelectionShape { .. }));

        let err = parse(json!([{ "content": [{ "note": ["x"] }] }])).unwrap_err();
        assert!(matches!(err, SelectionError::InvalidSelectionShape { .. }));
    }

    #[test]
    fn union_leaf_only_for_scalar_unions() {
        let node = parse(json!(["rating"])).unwrap();
        let Children::Variants(variants) = &node.entries[0].children else {
            panic!("expected variants");
        };
        assert_eq!(variants.len(), 2);

        let err = parse(json!(["content"])).unwrap_err();
        assert!(matches!(err, SelectionError::InvalidSelectionShape { .. }));
    }

    #[test]
    fn duplicate_entries_rejected() {
        let err = parse(json!(["id", "title", "id"])).unwrap_err();
        assert!(matches!(err, SelectionError::InvalidSelectionShape { .. }));
    }

    #[test]
    fn multi_key_object_rejected() {
        let err = parse(json!([{ "owner": ["name"], "title": {} }])).unwrap_err();
        assert!(matches!(err, SelectionError::InvalidSelectionShape { .. }));
    }

    #[test]
    fn non_list_selection_rejected() {
        let err = parse(json!({ "id": true })).unwrap_err();
        assert!(matches!(err, SelectionError::InvalidSelectionShape { .. }));
    }

    #[test]
    fn configured_syntax_keys() {
        let registry = registry();
        let naming = NamingConvention::camel_case();
        let syntax = SelectionSyntax {
            fields_key: "children".into(),
            args_key: "arguments".into(),
        };
        let post = registry.lookup("post").unwrap();

        let raw = json!([{ "owner": { "children": ["name"] } }]);
        assert!(parse_selection(&raw, post, &registry, &naming, &syntax).is_ok());

        // The default words are not accepted alongside the configured ones.
        let raw = json!([{ "owner": { "fields": ["name"] } }]);
        assert!(parse_selection(&raw, post, &registry, &naming, &syntax).is_err());
    }
}
