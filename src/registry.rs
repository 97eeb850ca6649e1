//! Schema registry.
//!
//! Built once from definition documents and never mutated afterwards; every
//! request reads it concurrently without locking. Construction runs in two
//! passes so cyclic graphs (self-referential relationships, mutually embedded
//! records) resolve without recursion: pass one declares every resource node,
//! pass two wires fields to their targets by identifier.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::definition::{
    AggregateKind, ArgumentDefinition, FieldDefinition, ResourceDefinition, SchemaDefinition,
    VariantDefinition,
};
use crate::error::RegistryError;
use crate::loader::{load_definition, load_definition_str};
use crate::naming::NamingConvention;
use crate::types::{Cardinality, ValueType};

/// Closed classification of a field. Everything downstream (parser, planner,
/// projector, static mirror) dispatches on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Attribute,
    ScalarCalculation,
    RecordCalculation,
    Aggregate,
    Relationship,
    Embedded,
    Union,
}

impl FieldKind {
    /// Fields the fetch engine must compute or load explicitly.
    pub fn is_computed(self) -> bool {
        matches!(
            self,
            FieldKind::ScalarCalculation
                | FieldKind::RecordCalculation
                | FieldKind::Aggregate
                | FieldKind::Relationship
        )
    }

    /// Fields that produce a nested record and therefore take a sub-selection.
    pub fn is_record(self) -> bool {
        matches!(
            self,
            FieldKind::RecordCalculation | FieldKind::Relationship | FieldKind::Embedded
        )
    }
}

/// A resolved field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldDescriptor {
    Attribute(AttributeField),
    Calculation(CalculationField),
    Aggregate(AggregateField),
    Relationship(RelationshipField),
    Embedded(EmbeddedField),
    Union(UnionField),
}

impl FieldDescriptor {
    pub fn name(&self) -> &str {
        match self {
            FieldDescriptor::Attribute(f) => &f.name,
            FieldDescriptor::Calculation(f) => &f.name,
            FieldDescriptor::Aggregate(f) => &f.name,
            FieldDescriptor::Relationship(f) => &f.name,
            FieldDescriptor::Embedded(f) => &f.name,
            FieldDescriptor::Union(f) => &f.name,
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldDescriptor::Attribute(_) => FieldKind::Attribute,
            FieldDescriptor::Calculation(c) if c.returns_record() => FieldKind::RecordCalculation,
            FieldDescriptor::Calculation(_) => FieldKind::ScalarCalculation,
            FieldDescriptor::Aggregate(_) => FieldKind::Aggregate,
            FieldDescriptor::Relationship(_) => FieldKind::Relationship,
            FieldDescriptor::Embedded(_) => FieldKind::Embedded,
            FieldDescriptor::Union(_) => FieldKind::Union,
        }
    }

    pub fn nullable(&self) -> bool {
        match self {
            FieldDescriptor::Attribute(f) => f.nullable,
            FieldDescriptor::Calculation(f) => f.nullable,
            FieldDescriptor::Aggregate(f) => f.nullable,
            FieldDescriptor::Relationship(f) => f.nullable,
            FieldDescriptor::Embedded(f) => f.nullable,
            FieldDescriptor::Union(f) => f.nullable,
        }
    }

    /// Target resource and cardinality for record-valued fields.
    pub fn record_target(&self) -> Option<(&str, Cardinality)> {
        match self {
            FieldDescriptor::Relationship(f) => Some((f.target.as_str(), f.cardinality)),
            FieldDescriptor::Embedded(f) => Some((f.target.as_str(), f.cardinality)),
            FieldDescriptor::Calculation(CalculationField {
                returns: CalculationReturn::Record {
                    resource,
                    cardinality,
                },
                ..
            }) => Some((resource.as_str(), *cardinality)),
            _ => None,
        }
    }

    /// Value type for scalar fields.
    pub fn value_type(&self) -> Option<&ValueType> {
        match self {
            FieldDescriptor::Attribute(f) => Some(&f.value_type),
            FieldDescriptor::Calculation(CalculationField {
                returns: CalculationReturn::Scalar(t),
                ..
            }) => Some(t),
            FieldDescriptor::Aggregate(f) => Some(&f.value_type),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeField {
    pub name: String,
    pub value_type: ValueType,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationField {
    pub name: String,
    pub returns: CalculationReturn,
    pub nullable: bool,
    pub arguments: Vec<ArgumentDescriptor>,
}

impl CalculationField {
    pub fn returns_record(&self) -> bool {
        matches!(self.returns, CalculationReturn::Record { .. })
    }

    pub fn argument(&self, name: &str) -> Option<&ArgumentDescriptor> {
        self.arguments.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationReturn {
    Scalar(ValueType),
    Record {
        resource: String,
        cardinality: Cardinality,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArgumentDescriptor {
    pub name: String,
    pub value_type: ValueType,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateField {
    pub name: String,
    pub aggregate: AggregateKind,
    pub path: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Resolved by following `path` to the summarized field.
    pub value_type: ValueType,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipField {
    pub name: String,
    pub target: String,
    pub cardinality: Cardinality,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddedField {
    pub name: String,
    pub target: String,
    pub cardinality: Cardinality,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnionField {
    pub name: String,
    pub nullable: bool,
    pub variants: Vec<UnionVariant>,
}

impl UnionField {
    pub fn variant(&self, tag: &str) -> Option<&UnionVariant> {
        self.variants.iter().find(|v| v.tag == tag)
    }

    pub fn all_scalar(&self) -> bool {
        self.variants
            .iter()
            .all(|v| matches!(v.shape, VariantShape::Scalar(_)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnionVariant {
    pub tag: String,
    pub shape: VariantShape,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantShape {
    Scalar(ValueType),
    /// Embedded resource identifier.
    Record(String),
}

/// A registered resource: its field table and primary key.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceDescriptor {
    identifier: String,
    embedded: bool,
    primary_key: Vec<String>,
    fields: Vec<FieldDescriptor>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl ResourceDescriptor {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn is_embedded(&self) -> bool {
        self.embedded
    }

    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// Classify a canonical field name.
    pub fn classify(&self, name: &str) -> Option<FieldKind> {
        self.field(name).map(FieldDescriptor::kind)
    }

    /// Look up a field by its client-facing name.
    pub fn resolve_client_name(
        &self,
        client: &str,
        naming: &NamingConvention,
    ) -> Option<&FieldDescriptor> {
        naming
            .resolve(client, self.fields.iter().map(FieldDescriptor::name))
            .and_then(|name| self.field(name))
    }

    /// Names of plain attribute fields, in declaration order.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.kind() == FieldKind::Attribute)
            .map(FieldDescriptor::name)
    }
}

/// Process-wide, immutable resource graph.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    resources: HashMap<String, ResourceDescriptor>,
    order: Vec<String>,
}

impl Registry {
    /// Build a registry, failing on the first configuration fault.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError` for unmapped value types, unknown targets,
    /// duplicate declarations and invalid aggregate paths.
    pub fn build(definition: &SchemaDefinition) -> Result<Self, RegistryError> {
        let (registry, mut errors) = Builder::new(definition).run();
        if errors.is_empty() {
            tracing::debug!(resources = registry.order.len(), "schema registry built");
            Ok(registry)
        } else {
            Err(errors.remove(0))
        }
    }

    /// Every configuration fault in a document, without stopping at the first.
    pub fn diagnose(definition: &SchemaDefinition) -> Vec<RegistryError> {
        Builder::new(definition).run().1
    }

    /// Load and build from a definition file.
    pub fn from_path(path: &Path) -> Result<Self, RegistryError> {
        Self::build(&load_definition(path)?)
    }

    /// Load and build from a JSON string.
    pub fn from_json_str(content: &str) -> Result<Self, RegistryError> {
        Self::build(&load_definition_str(content)?)
    }

    /// Look up a resource.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::ResourceNotFound` for unknown identifiers.
    pub fn lookup(&self, identifier: &str) -> Result<&ResourceDescriptor, RegistryError> {
        self.get(identifier)
            .ok_or_else(|| RegistryError::ResourceNotFound {
                resource: identifier.to_string(),
            })
    }

    pub fn get(&self, identifier: &str) -> Option<&ResourceDescriptor> {
        self.resources.get(identifier)
    }

    /// All resources, embedded ones included, in declaration order.
    pub fn resources(&self) -> impl Iterator<Item = &ResourceDescriptor> {
        self.order.iter().filter_map(|id| self.resources.get(id))
    }

    /// Externally enumerable resources. Embedded resources are only reachable
    /// through their containers.
    pub fn public_resources(&self) -> impl Iterator<Item = &ResourceDescriptor> {
        self.resources().filter(|r| !r.embedded)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

// --- Internal implementation ---

struct Builder<'a> {
    definition: &'a SchemaDefinition,
    declared: HashMap<&'a str, &'a ResourceDefinition>,
    errors: Vec<RegistryError>,
}

impl<'a> Builder<'a> {
    fn new(definition: &'a SchemaDefinition) -> Self {
        Self {
            definition,
            declared: HashMap::new(),
            errors: Vec::new(),
        }
    }

    fn run(mut self) -> (Registry, Vec<RegistryError>) {
        let definition = self.definition;

        // Pass 1: declare nodes
        for resource in &definition.resources {
            if self
                .declared
                .insert(&resource.identifier, resource)
                .is_some()
            {
                self.errors.push(RegistryError::DuplicateResource {
                    resource: resource.identifier.clone(),
                });
            }
        }

        // Pass 2: wire fields by identifier
        let mut registry = Registry::default();
        for resource in &definition.resources {
            if registry.resources.contains_key(&resource.identifier) {
                continue;
            }
            let descriptor = self.build_resource(resource);
            registry.order.push(resource.identifier.clone());
            registry
                .resources
                .insert(resource.identifier.clone(), descriptor);
        }

        (registry, self.errors)
    }

    fn build_resource(&mut self, resource: &ResourceDefinition) -> ResourceDescriptor {
        let mut fields = Vec::new();
        let mut index = HashMap::new();
        let mut seen = HashSet::new();

        for field in &resource.fields {
            let path = format!("{}.{}", resource.identifier, field.name());
            if !seen.insert(field.name()) {
                self.errors.push(RegistryError::DuplicateField { path });
                continue;
            }
            match self.build_field(resource, field, &path) {
                Ok(descriptor) => {
                    index.insert(field.name().to_string(), fields.len());
                    fields.push(descriptor);
                }
                Err(e) => self.errors.push(e),
            }
        }

        for key in &resource.primary_key {
            let is_attribute = matches!(
                index.get(key).map(|&i| &fields[i]),
                Some(FieldDescriptor::Attribute(_))
            );
            if !is_attribute {
                self.errors.push(RegistryError::InvalidDefinition {
                    path: format!("{}.primary_key", resource.identifier),
                    message: format!("\"{}\" is not an attribute", key),
                });
            }
        }

        ResourceDescriptor {
            identifier: resource.identifier.clone(),
            embedded: resource.embedded,
            primary_key: resource.primary_key.clone(),
            fields,
            index,
        }
    }

    fn build_field(
        &self,
        owner: &ResourceDefinition,
        field: &FieldDefinition,
        path: &str,
    ) -> Result<FieldDescriptor, RegistryError> {
        match field {
            FieldDefinition::Attribute {
                name,
                value_type,
                nullable,
            } => Ok(FieldDescriptor::Attribute(AttributeField {
                name: name.clone(),
                value_type: map_type(value_type, path)?,
                nullable: *nullable,
            })),

            FieldDefinition::Calculation {
                name,
                value_type,
                resource,
                many,
                nullable,
                arguments,
            } => {
                let returns = match (value_type, resource) {
                    (Some(t), None) => CalculationReturn::Scalar(map_type(t, path)?),
                    (None, Some(r)) => {
                        self.target(r, path)?;
                        CalculationReturn::Record {
                            resource: r.clone(),
                            cardinality: if *many {
                                Cardinality::Many
                            } else {
                                Cardinality::One
                            },
                        }
                    }
                    _ => {
                        return Err(RegistryError::InvalidDefinition {
                            path: path.to_string(),
                            message: "calculation needs exactly one of \"type\" or \"resource\""
                                .to_string(),
                        })
                    }
                };
                Ok(FieldDescriptor::Calculation(CalculationField {
                    name: name.clone(),
                    returns,
                    nullable: *nullable,
                    arguments: build_arguments(arguments, path)?,
                }))
            }

            FieldDefinition::Aggregate {
                name,
                aggregate,
                path: rel_path,
                field: summarized,
            } => {
                let (value_type, nullable) = self.resolve_aggregate(
                    owner,
                    *aggregate,
                    rel_path,
                    summarized.as_deref(),
                    path,
                )?;
                Ok(FieldDescriptor::Aggregate(AggregateField {
                    name: name.clone(),
                    aggregate: *aggregate,
                    path: rel_path.clone(),
                    field: summarized.clone(),
                    value_type,
                    nullable,
                }))
            }

            FieldDefinition::Relationship {
                name,
                resource,
                cardinality,
                nullable,
            } => {
                if self.target(resource, path)?.embedded {
                    return Err(RegistryError::InvalidDefinition {
                        path: path.to_string(),
                        message: format!(
                            "relationship target \"{}\" is an embedded resource",
                            resource
                        ),
                    });
                }
                Ok(FieldDescriptor::Relationship(RelationshipField {
                    name: name.clone(),
                    target: resource.clone(),
                    cardinality: *cardinality,
                    nullable: *nullable,
                }))
            }

            FieldDefinition::Embedded {
                name,
                resource,
                cardinality,
                nullable,
            } => {
                self.embedded_target(resource, path)?;
                Ok(FieldDescriptor::Embedded(EmbeddedField {
                    name: name.clone(),
                    target: resource.clone(),
                    cardinality: *cardinality,
                    nullable: *nullable,
                }))
            }

            FieldDefinition::Union {
                name,
                nullable,
                variants,
            } => Ok(FieldDescriptor::Union(UnionField {
                name: name.clone(),
                nullable: *nullable,
                variants: self.build_variants(variants, path)?,
            })),
        }
    }

    fn build_variants(
        &self,
        variants: &[VariantDefinition],
        path: &str,
    ) -> Result<Vec<UnionVariant>, RegistryError> {
        if variants.is_empty() {
            return Err(RegistryError::InvalidDefinition {
                path: path.to_string(),
                message: "union declares no variants".to_string(),
            });
        }

        let mut seen = HashSet::new();
        let mut result = Vec::with_capacity(variants.len());
        for variant in variants {
            let variant_path = format!("{}.{}", path, variant.tag);
            if !seen.insert(variant.tag.as_str()) {
                return Err(RegistryError::DuplicateField { path: variant_path });
            }
            let shape = match (&variant.value_type, &variant.resource) {
                (Some(t), None) => VariantShape::Scalar(map_type(t, &variant_path)?),
                (None, Some(r)) => {
                    self.embedded_target(r, &variant_path)?;
                    VariantShape::Record(r.clone())
                }
                _ => {
                    return Err(RegistryError::InvalidDefinition {
                        path: variant_path,
                        message: "variant needs exactly one of \"type\" or \"resource\""
                            .to_string(),
                    })
                }
            };
            result.push(UnionVariant {
                tag: variant.tag.clone(),
                shape,
            });
        }
        Ok(result)
    }

    fn target(&self, resource: &str, path: &str) -> Result<&'a ResourceDefinition, RegistryError> {
        self.declared
            .get(resource)
            .copied()
            .ok_or_else(|| RegistryError::UnknownResource {
                path: path.to_string(),
                resource: resource.to_string(),
            })
    }

    fn embedded_target(
        &self,
        resource: &str,
        path: &str,
    ) -> Result<&'a ResourceDefinition, RegistryError> {
        let target = self.target(resource, path)?;
        if !target.embedded {
            return Err(RegistryError::InvalidDefinition {
                path: path.to_string(),
                message: format!("\"{}\" is not an embedded resource", resource),
            });
        }
        Ok(target)
    }

    /// Follow an aggregate's relationship path to the summarized field and
    /// derive the aggregate's output type.
    fn resolve_aggregate(
        &self,
        owner: &ResourceDefinition,
        kind: AggregateKind,
        rel_path: &[String],
        summarized: Option<&str>,
        path: &str,
    ) -> Result<(ValueType, bool), RegistryError> {
        let invalid = |message: String| RegistryError::InvalidAggregatePath {
            path: path.to_string(),
            message,
        };

        if rel_path.is_empty() {
            return Err(invalid("path is empty".to_string()));
        }

        let mut current = owner;
        for segment in rel_path {
            match current.fields.iter().find(|f| f.name() == segment.as_str()) {
                Some(FieldDefinition::Relationship { resource, .. }) => {
                    current = self.target(resource, path)?;
                }
                Some(_) => {
                    return Err(invalid(format!(
                        "\"{}\" on {} is not a relationship",
                        segment, current.identifier
                    )))
                }
                None => {
                    return Err(invalid(format!(
                        "\"{}\" not found on {}",
                        segment, current.identifier
                    )))
                }
            }
        }

        if !kind.needs_field() {
            return Ok(match kind {
                AggregateKind::Exists => (ValueType::Boolean, false),
                _ => (ValueType::Integer, false),
            });
        }

        let Some(field_name) = summarized else {
            return Err(invalid(format!("{:?} aggregate needs a field", kind).to_lowercase()));
        };

        let field_type = match current.fields.iter().find(|f| f.name() == field_name) {
            Some(FieldDefinition::Attribute { value_type, .. })
            | Some(FieldDefinition::Calculation {
                value_type: Some(value_type),
                ..
            }) => map_type(value_type, path)?,
            Some(_) => {
                return Err(invalid(format!(
                    "\"{}\" on {} is not an attribute or scalar calculation",
                    field_name, current.identifier
                )))
            }
            None => {
                return Err(invalid(format!(
                    "\"{}\" not found on {}",
                    field_name, current.identifier
                )))
            }
        };

        Ok(match kind {
            AggregateKind::Avg if field_type == ValueType::Decimal => (ValueType::Decimal, true),
            AggregateKind::Avg => (ValueType::Float, true),
            AggregateKind::List => (ValueType::Array(Box::new(field_type)), false),
            _ => (field_type, true),
        })
    }
}

fn map_type(name: &str, path: &str) -> Result<ValueType, RegistryError> {
    ValueType::parse(name).ok_or_else(|| RegistryError::UnmappedType {
        path: path.to_string(),
        type_name: name.to_string(),
    })
}

fn build_arguments(
    arguments: &[ArgumentDefinition],
    path: &str,
) -> Result<Vec<ArgumentDescriptor>, RegistryError> {
    let mut seen = HashSet::new();
    arguments
        .iter()
        .map(|arg| {
            let arg_path = format!("{}({})", path, arg.name);
            if !seen.insert(arg.name.as_str()) {
                return Err(RegistryError::DuplicateField { path: arg_path });
            }
            Ok(ArgumentDescriptor {
                name: arg.name.clone(),
                value_type: map_type(&arg.value_type, &arg_path)?,
                required: arg.required && arg.default.is_none(),
                default: arg.default.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn definition(value: Value) -> SchemaDefinition {
        serde_json::from_value(value).unwrap()
    }

    fn blog() -> SchemaDefinition {
        definition(json!({
            "resources": [
                {
                    "identifier": "post",
                    "primary_key": ["id"],
                    "fields": [
                        { "kind": "attribute", "name": "id", "type": "uuid", "nullable": false },
                        { "kind": "attribute", "name": "title", "type": "string" },
                        { "kind": "relationship", "name": "comments", "resource": "comment", "cardinality": "many" },
                        { "kind": "relationship", "name": "parent", "resource": "post" },
                        { "kind": "aggregate", "name": "comment_count", "aggregate": "count", "path": ["comments"] },
                        { "kind": "aggregate", "name": "total_likes", "aggregate": "sum", "path": ["comments"], "field": "likes" },
                        { "kind": "aggregate", "name": "avg_likes", "aggregate": "avg", "path": ["comments"], "field": "likes" },
                        { "kind": "aggregate", "name": "commenter_names", "aggregate": "list", "path": ["comments", "author"], "field": "name" },
                        { "kind": "embedded", "name": "metadata", "resource": "post_metadata" }
                    ]
                },
                {
                    "identifier": "comment",
                    "fields": [
                        { "kind": "attribute", "name": "likes", "type": "integer" },
                        { "kind": "relationship", "name": "author", "resource": "user" },
                        { "kind": "relationship", "name": "post", "resource": "post" }
                    ]
                },
                {
                    "identifier": "user",
                    "fields": [{ "kind": "attribute", "name": "name", "type": "string" }]
                },
                {
                    "identifier": "post_metadata",
                    "embedded": true,
                    "fields": [{ "kind": "attribute", "name": "category", "type": "atom" }]
                }
            ]
        }))
    }

    #[test]
    fn builds_cyclic_graph() {
        let registry = Registry::build(&blog()).unwrap();
        let post = registry.lookup("post").unwrap();
        assert_eq!(post.classify("parent"), Some(FieldKind::Relationship));
        assert_eq!(
            post.field("parent").unwrap().record_target(),
            Some(("post", Cardinality::One))
        );
        let comment = registry.lookup("comment").unwrap();
        assert_eq!(comment.classify("post"), Some(FieldKind::Relationship));
    }

    #[test]
    fn classifies_fields() {
        let registry = Registry::build(&blog()).unwrap();
        let post = registry.lookup("post").unwrap();
        assert_eq!(post.classify("id"), Some(FieldKind::Attribute));
        assert_eq!(post.classify("comment_count"), Some(FieldKind::Aggregate));
        assert_eq!(post.classify("metadata"), Some(FieldKind::Embedded));
        assert_eq!(post.classify("nope"), None);
    }

    #[test]
    fn resolves_aggregate_types_through_paths() {
        let registry = Registry::build(&blog()).unwrap();
        let post = registry.lookup("post").unwrap();

        let count = post.field("comment_count").unwrap();
        assert_eq!(count.value_type(), Some(&ValueType::Integer));
        assert!(!count.nullable());

        let sum = post.field("total_likes").unwrap();
        assert_eq!(sum.value_type(), Some(&ValueType::Integer));
        assert!(sum.nullable());

        let avg = post.field("avg_likes").unwrap();
        assert_eq!(avg.value_type(), Some(&ValueType::Float));

        let list = post.field("commenter_names").unwrap();
        assert_eq!(
            list.value_type(),
            Some(&ValueType::Array(Box::new(ValueType::String)))
        );
    }

    #[test]
    fn embedded_resources_are_not_public() {
        let registry = Registry::build(&blog()).unwrap();
        let public: Vec<_> = registry.public_resources().map(|r| r.identifier()).collect();
        assert_eq!(public, vec!["post", "comment", "user"]);
        assert!(registry.lookup("post_metadata").unwrap().is_embedded());
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn unmapped_type_is_fatal() {
        let def = definition(json!({
            "resources": [{
                "identifier": "post",
                "fields": [{ "kind": "attribute", "name": "rating", "type": "tuple" }]
            }]
        }));
        let err = Registry::build(&def).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::UnmappedType { ref path, ref type_name }
                if path == "post.rating" && type_name == "tuple"
        ));
    }

    #[test]
    fn unknown_target_is_fatal() {
        let def = definition(json!({
            "resources": [{
                "identifier": "post",
                "fields": [{ "kind": "relationship", "name": "owner", "resource": "account" }]
            }]
        }));
        assert!(matches!(
            Registry::build(&def),
            Err(RegistryError::UnknownResource { resource, .. }) if resource == "account"
        ));
    }

    #[test]
    fn embedded_field_requires_embedded_target() {
        let def = definition(json!({
            "resources": [
                { "identifier": "user", "fields": [] },
                {
                    "identifier": "post",
                    "fields": [{ "kind": "embedded", "name": "meta", "resource": "user" }]
                }
            ]
        }));
        assert!(matches!(
            Registry::build(&def),
            Err(RegistryError::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn aggregate_path_must_follow_relationships() {
        let def = definition(json!({
            "resources": [{
                "identifier": "post",
                "fields": [
                    { "kind": "attribute", "name": "title", "type": "string" },
                    { "kind": "aggregate", "name": "n", "aggregate": "count", "path": ["title"] }
                ]
            }]
        }));
        assert!(matches!(
            Registry::build(&def),
            Err(RegistryError::InvalidAggregatePath { .. })
        ));
    }

    #[test]
    fn diagnose_collects_every_fault() {
        let def = definition(json!({
            "resources": [
                {
                    "identifier": "post",
                    "fields": [
                        { "kind": "attribute", "name": "a", "type": "tuple" },
                        { "kind": "attribute", "name": "a", "type": "string" },
                        { "kind": "relationship", "name": "r", "resource": "nope" }
                    ]
                },
                { "identifier": "post", "fields": [] }
            ]
        }));
        let errors = Registry::diagnose(&def);
        assert_eq!(errors.len(), 4);
        assert!(errors
            .iter()
            .any(|e| matches!(e, RegistryError::DuplicateResource { .. })));
    }

    #[test]
    fn required_argument_with_default_is_optional() {
        let def = definition(json!({
            "resources": [{
                "identifier": "post",
                "fields": [{
                    "kind": "calculation",
                    "name": "excerpt",
                    "type": "string",
                    "arguments": [
                        { "name": "length", "type": "integer", "required": true, "default": 40 },
                        { "name": "suffix", "type": "string", "required": true }
                    ]
                }]
            }]
        }));
        let registry = Registry::build(&def).unwrap();
        let Some(FieldDescriptor::Calculation(calc)) =
            registry.lookup("post").unwrap().field("excerpt")
        else {
            panic!("expected calculation");
        };
        assert!(!calc.argument("length").unwrap().required);
        assert!(calc.argument("suffix").unwrap().required);
    }

    #[test]
    fn resolve_client_name_uses_naming() {
        let registry = Registry::build(&blog()).unwrap();
        let post = registry.lookup("post").unwrap();
        let naming = NamingConvention::camel_case();
        let field = post.resolve_client_name("commentCount", &naming).unwrap();
        assert_eq!(field.name(), "comment_count");
    }

    #[test]
    fn lookup_unknown_resource() {
        let registry = Registry::build(&blog()).unwrap();
        assert!(matches!(
            registry.lookup("ghost"),
            Err(RegistryError::ResourceNotFound { .. })
        ));
    }
}
