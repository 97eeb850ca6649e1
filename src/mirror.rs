//! Static type mirror.
//!
//! A generated, serializable representation of the registry in which every
//! resource's fields are partitioned by kind into separate key tables, and an
//! evaluator that computes the exact output shape of a selection literal from
//! those tables alone. It never touches runtime data or the registry; the
//! result is what `typegen` turns into client types.
//!
//! Classification is by table membership: a selected key is a calculation
//! because it appears in the resource's `calculations` table, not because the
//! literal happens to carry nested fields.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SelectionError;
use crate::naming::NamingConvention;
use crate::registry::{CalculationReturn, FieldDescriptor, Registry, VariantShape};
use crate::selection::{join, split_body, SelectionSyntax};
use crate::types::{json_type_name, ValueType};

/// Key-partitioned schema of every resource, by identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticSchema {
    pub resources: BTreeMap<String, StaticResource>,
}

/// One resource's fields, partitioned by kind. Tables keep declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticResource {
    #[serde(default)]
    pub embedded: bool,
    #[serde(default)]
    pub attributes: Vec<StaticScalar>,
    #[serde(default)]
    pub calculations: Vec<StaticCalculation>,
    #[serde(default)]
    pub aggregates: Vec<StaticScalar>,
    #[serde(default)]
    pub relationships: Vec<StaticRecord>,
    #[serde(default)]
    pub embeds: Vec<StaticRecord>,
    #[serde(default)]
    pub unions: Vec<StaticUnion>,
    /// Every key in declaration order, across all tables.
    pub order: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticScalar {
    pub name: String,
    pub value_type: ValueType,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticCalculation {
    pub name: String,
    pub returns: StaticReturn,
    pub nullable: bool,
    #[serde(default)]
    pub arguments: Vec<StaticArgument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaticReturn {
    Scalar(ValueType),
    Record { resource: String, many: bool },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticArgument {
    pub name: String,
    pub required: bool,
}

/// Relationship or embedded record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticRecord {
    pub name: String,
    pub target: String,
    pub many: bool,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticUnion {
    pub name: String,
    pub variants: Vec<StaticVariant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticVariant {
    pub tag: String,
    /// Scalar payload type; exclusive with `resource`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

/// Which table a key belongs to.
#[derive(Debug, Clone, Copy)]
enum Member<'s> {
    Attribute(&'s StaticScalar),
    Calculation(&'s StaticCalculation),
    Aggregate(&'s StaticScalar),
    Relationship(&'s StaticRecord),
    Embedded(&'s StaticRecord),
    Union(&'s StaticUnion),
}

impl StaticSchema {
    /// Generate the static representation of a registry.
    pub fn from_registry(registry: &Registry) -> Self {
        let mut resources = BTreeMap::new();

        for descriptor in registry.resources() {
            let mut resource = StaticResource {
                embedded: descriptor.is_embedded(),
                ..StaticResource::default()
            };

            for field in descriptor.fields() {
                resource.order.push(field.name().to_string());
                match field {
                    FieldDescriptor::Attribute(f) => resource.attributes.push(StaticScalar {
                        name: f.name.clone(),
                        value_type: f.value_type.clone(),
                        nullable: f.nullable,
                    }),
                    FieldDescriptor::Calculation(f) => {
                        resource.calculations.push(StaticCalculation {
                            name: f.name.clone(),
                            returns: match &f.returns {
                                CalculationReturn::Scalar(t) => StaticReturn::Scalar(t.clone()),
                                CalculationReturn::Record {
                                    resource,
                                    cardinality,
                                } => StaticReturn::Record {
                                    resource: resource.clone(),
                                    many: cardinality.is_many(),
                                },
                            },
                            nullable: f.nullable,
                            arguments: f
                                .arguments
                                .iter()
                                .map(|a| StaticArgument {
                                    name: a.name.clone(),
                                    required: a.required,
                                })
                                .collect(),
                        })
                    }
                    FieldDescriptor::Aggregate(f) => resource.aggregates.push(StaticScalar {
                        name: f.name.clone(),
                        value_type: f.value_type.clone(),
                        nullable: f.nullable,
                    }),
                    FieldDescriptor::Relationship(f) => {
                        resource.relationships.push(StaticRecord {
                            name: f.name.clone(),
                            target: f.target.clone(),
                            many: f.cardinality.is_many(),
                            nullable: f.nullable,
                        })
                    }
                    FieldDescriptor::Embedded(f) => resource.embeds.push(StaticRecord {
                        name: f.name.clone(),
                        target: f.target.clone(),
                        many: f.cardinality.is_many(),
                        nullable: f.nullable,
                    }),
                    FieldDescriptor::Union(f) => resource.unions.push(StaticUnion {
                        name: f.name.clone(),
                        variants: f
                            .variants
                            .iter()
                            .map(|v| match &v.shape {
                                VariantShape::Scalar(t) => StaticVariant {
                                    tag: v.tag.clone(),
                                    value_type: Some(t.clone()),
                                    resource: None,
                                },
                                VariantShape::Record(r) => StaticVariant {
                                    tag: v.tag.clone(),
                                    value_type: None,
                                    resource: Some(r.clone()),
                                },
                            })
                            .collect(),
                    }),
                }
            }

            resources.insert(descriptor.identifier().to_string(), resource);
        }

        Self { resources }
    }

    pub fn resource(&self, identifier: &str) -> Option<&StaticResource> {
        self.resources.get(identifier)
    }
}

impl StaticResource {
    /// Every key across all tables, in declaration order.
    ///
    /// Client names resolve against this order, the same order the runtime
    /// registry uses.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    fn member(&self, name: &str) -> Option<Member<'_>> {
        if let Some(f) = self.attributes.iter().find(|f| f.name == name) {
            return Some(Member::Attribute(f));
        }
        if let Some(f) = self.calculations.iter().find(|f| f.name == name) {
            return Some(Member::Calculation(f));
        }
        if let Some(f) = self.aggregates.iter().find(|f| f.name == name) {
            return Some(Member::Aggregate(f));
        }
        if let Some(f) = self.relationships.iter().find(|f| f.name == name) {
            return Some(Member::Relationship(f));
        }
        if let Some(f) = self.embeds.iter().find(|f| f.name == name) {
            return Some(Member::Embedded(f));
        }
        self.unions
            .iter()
            .find(|f| f.name == name)
            .map(Member::Union)
    }
}

/// Output shape of a projected value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TypeShape {
    Scalar {
        value_type: ValueType,
        nullable: bool,
    },
    Object {
        fields: Vec<ShapeField>,
        nullable: bool,
    },
    List {
        item: Box<TypeShape>,
        nullable: bool,
    },
    /// Exactly one of `variants` is present.
    Union {
        variants: Vec<ShapeField>,
        nullable: bool,
    },
}

impl TypeShape {
    pub fn nullable(&self) -> bool {
        match self {
            TypeShape::Scalar { nullable, .. }
            | TypeShape::Object { nullable, .. }
            | TypeShape::List { nullable, .. }
            | TypeShape::Union { nullable, .. } => *nullable,
        }
    }

    /// Field of an object shape, by output key.
    pub fn field(&self, key: &str) -> Option<&TypeShape> {
        match self {
            TypeShape::Object { fields, .. } => {
                fields.iter().find(|f| f.key == key).map(|f| &f.shape)
            }
            _ => None,
        }
    }
}

/// Keyed member of an object or union shape. `key` is the client-facing name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeField {
    pub key: String,
    pub shape: TypeShape,
}

/// Compute the output shape of `selection` against `resource`.
///
/// # Errors
///
/// Rejects the same literals the runtime selection parser rejects.
pub fn output_type(
    schema: &StaticSchema,
    resource: &str,
    selection: &Value,
    naming: &NamingConvention,
    syntax: &SelectionSyntax,
) -> Result<TypeShape, SelectionError> {
    let mirror = Mirror {
        schema,
        naming,
        syntax,
    };
    Ok(TypeShape::Object {
        fields: mirror.object(selection, resource, "")?,
        nullable: false,
    })
}

struct Mirror<'a> {
    schema: &'a StaticSchema,
    naming: &'a NamingConvention,
    syntax: &'a SelectionSyntax,
}

impl<'a> Mirror<'a> {
    fn resource(&self, identifier: &str, path: &str) -> Result<&'a StaticResource, SelectionError> {
        self.schema
            .resource(identifier)
            .ok_or_else(|| SelectionError::shape(identifier, path, "resource is not in the schema"))
    }

    fn object(
        &self,
        selection: &Value,
        identifier: &str,
        path: &str,
    ) -> Result<Vec<ShapeField>, SelectionError> {
        let resource = self.resource(identifier, path)?;
        let Some(items) = selection.as_array() else {
            return Err(SelectionError::shape(
                identifier,
                path,
                format!("expected a selection list, got {}", json_type_name(selection)),
            ));
        };

        let mut fields = Vec::with_capacity(items.len());
        let mut seen = HashSet::new();

        for item in items {
            let (client, body) = match item {
                Value::String(client) => (client.as_str(), None),
                Value::Object(map) if map.len() == 1 => match map.iter().next() {
                    Some((client, body)) => (client.as_str(), Some(body)),
                    None => continue,
                },
                Value::Object(map) => {
                    return Err(SelectionError::shape(
                        identifier,
                        path,
                        format!(
                            "selection objects must have exactly one key, got {}",
                            map.len()
                        ),
                    ))
                }
                other => {
                    return Err(SelectionError::shape(
                        identifier,
                        path,
                        format!(
                            "selection entries must be strings or objects, got {}",
                            json_type_name(other)
                        ),
                    ))
                }
            };

            let name = self
                .naming
                .resolve(client, resource.keys())
                .ok_or_else(|| SelectionError::UnknownField {
                    resource: identifier.to_string(),
                    field: join(path, client),
                })?;
            let member = resource
                .member(name)
                .ok_or_else(|| SelectionError::UnknownField {
                    resource: identifier.to_string(),
                    field: join(path, client),
                })?;

            let field_path = join(path, client);
            let shape = self.member_shape(member, body, identifier, &field_path)?;

            if !seen.insert(name) {
                return Err(SelectionError::shape(
                    identifier,
                    &join(path, &self.naming.encode(name)),
                    "field is selected more than once",
                ));
            }
            fields.push(ShapeField {
                key: self.naming.encode(name),
                shape,
            });
        }

        Ok(fields)
    }

    fn member_shape(
        &self,
        member: Member<'a>,
        body: Option<&Value>,
        identifier: &str,
        path: &str,
    ) -> Result<TypeShape, SelectionError> {
        let (args, fields) = match body {
            Some(body) => {
                let body = split_body(body, self.syntax)
                    .map_err(|message| SelectionError::shape(identifier, path, message))?;
                (body.args, body.fields)
            }
            None => (None, None),
        };

        if args.is_some() && !matches!(member, Member::Calculation(_)) {
            return Err(SelectionError::shape(
                identifier,
                path,
                "field does not accept arguments",
            ));
        }

        let takes_fields = match member {
            Member::Calculation(c) => matches!(c.returns, StaticReturn::Record { .. }),
            Member::Relationship(_) | Member::Embedded(_) | Member::Union(_) => true,
            Member::Attribute(_) | Member::Aggregate(_) => false,
        };
        if fields.is_some() && !takes_fields {
            return Err(SelectionError::shape(
                identifier,
                path,
                "scalar field does not accept a nested selection",
            ));
        }

        match member {
            Member::Attribute(f) | Member::Aggregate(f) => Ok(TypeShape::Scalar {
                value_type: f.value_type.clone(),
                nullable: f.nullable,
            }),

            Member::Calculation(calc) => {
                self.check_arguments(calc, args, identifier, path)?;
                match &calc.returns {
                    StaticReturn::Scalar(value_type) => Ok(TypeShape::Scalar {
                        value_type: value_type.clone(),
                        nullable: calc.nullable,
                    }),
                    StaticReturn::Record { resource, many } => {
                        let fields = require(fields, identifier, path)?;
                        Ok(record_shape(
                            self.object(fields, resource, path)?,
                            *many,
                            calc.nullable,
                        ))
                    }
                }
            }

            Member::Relationship(rel) => {
                let fields = require(fields, identifier, path)?;
                Ok(record_shape(
                    self.object(fields, &rel.target, path)?,
                    rel.many,
                    rel.nullable,
                ))
            }

            Member::Embedded(embedded) => {
                let shape = match fields {
                    Some(fields) => self.object(fields, &embedded.target, path)?,
                    None => self.attribute_fields(&embedded.target, path)?,
                };
                Ok(record_shape(shape, embedded.many, embedded.nullable))
            }

            Member::Union(union) => {
                let variants = match fields {
                    Some(fields) => self.variants(union, fields, identifier, path)?,
                    None if union.variants.iter().all(|v| v.resource.is_none()) => union
                        .variants
                        .iter()
                        .filter_map(|v| {
                            v.value_type.as_ref().map(|t| ShapeField {
                                key: self.naming.encode(&v.tag),
                                shape: TypeShape::Scalar {
                                    value_type: t.clone(),
                                    nullable: false,
                                },
                            })
                        })
                        .collect(),
                    None => {
                        return Err(SelectionError::shape(
                            identifier,
                            path,
                            "field requires a nested selection",
                        ))
                    }
                };
                // Null whenever the active variant was not selected.
                Ok(TypeShape::Union {
                    variants,
                    nullable: true,
                })
            }
        }
    }

    fn variants(
        &self,
        union: &StaticUnion,
        selection: &Value,
        identifier: &str,
        path: &str,
    ) -> Result<Vec<ShapeField>, SelectionError> {
        let Some(items) = selection.as_array() else {
            return Err(SelectionError::shape(
                identifier,
                path,
                format!("expected a list of variants, got {}", json_type_name(selection)),
            ));
        };

        let mut variants = Vec::with_capacity(items.len());
        let mut seen = HashSet::new();

        for item in items {
            let (client, body) = match item {
                Value::String(client) => (client.as_str(), None),
                Value::Object(map) if map.len() == 1 => match map.iter().next() {
                    Some((client, body)) => (client.as_str(), Some(body)),
                    None => continue,
                },
                _ => {
                    return Err(SelectionError::shape(
                        identifier,
                        path,
                        "variant entries must be strings or single-key objects",
                    ))
                }
            };

            let variant_path = join(path, client);
            let variant = self
                .naming
                .resolve(client, union.variants.iter().map(|v| v.tag.as_str()))
                .and_then(|tag| union.variants.iter().find(|v| v.tag == tag))
                .ok_or_else(|| SelectionError::UnknownField {
                    resource: identifier.to_string(),
                    field: variant_path.clone(),
                })?;

            let shape = match (&variant.value_type, &variant.resource, body) {
                (Some(value_type), None, None) => TypeShape::Scalar {
                    value_type: value_type.clone(),
                    nullable: false,
                },
                (None, Some(resource), Some(body)) => {
                    let body = split_body(body, self.syntax).map_err(|message| {
                        SelectionError::shape(identifier, &variant_path, message)
                    })?;
                    if body.args.is_some() {
                        return Err(SelectionError::shape(
                            identifier,
                            &variant_path,
                            "variant does not accept arguments",
                        ));
                    }
                    let fields = require(body.fields, identifier, &variant_path)?;
                    TypeShape::Object {
                        fields: self.object(fields, resource, &variant_path)?,
                        nullable: false,
                    }
                }
                (Some(_), _, Some(_)) => {
                    return Err(SelectionError::shape(
                        identifier,
                        &variant_path,
                        "scalar variant does not accept a nested selection",
                    ))
                }
                _ => {
                    return Err(SelectionError::shape(
                        identifier,
                        &variant_path,
                        "record variant requires a nested selection",
                    ))
                }
            };

            if !seen.insert(variant.tag.as_str()) {
                return Err(SelectionError::shape(
                    identifier,
                    &variant_path,
                    "variant is selected more than once",
                ));
            }
            variants.push(ShapeField {
                key: self.naming.encode(&variant.tag),
                shape,
            });
        }

        Ok(variants)
    }

    fn check_arguments(
        &self,
        calc: &StaticCalculation,
        supplied: Option<&Map<String, Value>>,
        identifier: &str,
        path: &str,
    ) -> Result<(), SelectionError> {
        let mut provided = HashSet::new();
        if let Some(supplied) = supplied {
            for (client, value) in supplied {
                let name = self
                    .naming
                    .resolve(client, calc.arguments.iter().map(|a| a.name.as_str()))
                    .ok_or_else(|| SelectionError::UnknownArgument {
                        resource: identifier.to_string(),
                        field: path.to_string(),
                        argument: client.clone(),
                    })?;
                if !value.is_null() {
                    provided.insert(name);
                }
            }
        }

        match calc
            .arguments
            .iter()
            .find(|a| a.required && !provided.contains(a.name.as_str()))
        {
            Some(missing) => Err(SelectionError::MissingRequiredArgument {
                resource: identifier.to_string(),
                field: path.to_string(),
                argument: self.naming.encode(&missing.name),
            }),
            None => Ok(()),
        }
    }

    /// Shape of a bare embedded key: every attribute of the target.
    fn attribute_fields(&self, identifier: &str, path: &str) -> Result<Vec<ShapeField>, SelectionError> {
        let resource = self.resource(identifier, path)?;
        Ok(resource
            .attributes
            .iter()
            .map(|a| ShapeField {
                key: self.naming.encode(&a.name),
                shape: TypeShape::Scalar {
                    value_type: a.value_type.clone(),
                    nullable: a.nullable,
                },
            })
            .collect())
    }
}

fn record_shape(fields: Vec<ShapeField>, many: bool, nullable: bool) -> TypeShape {
    if many {
        TypeShape::List {
            item: Box::new(TypeShape::Object {
                fields,
                nullable: false,
            }),
            nullable,
        }
    } else {
        TypeShape::Object { fields, nullable }
    }
}

fn require<'v>(
    fields: Option<&'v Value>,
    identifier: &str,
    path: &str,
) -> Result<&'v Value, SelectionError> {
    fields.ok_or_else(|| SelectionError::shape(identifier, path, "field requires a nested selection"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> StaticSchema {
        let registry =
            Registry::from_json_str(include_str!("../tests/fixtures/blog.json")).unwrap();
        StaticSchema::from_registry(&registry)
    }

    fn shape(selection: Value) -> Result<TypeShape, SelectionError> {
        output_type(
            &schema(),
            "post",
            &selection,
            &NamingConvention::camel_case(),
            &SelectionSyntax::default(),
        )
    }

    fn keys(shape: &TypeShape) -> Vec<&str> {
        match shape {
            TypeShape::Object { fields, .. } | TypeShape::Union { variants: fields, .. } => {
                fields.iter().map(|f| f.key.as_str()).collect()
            }
            _ => vec![],
        }
    }

    #[test]
    fn partitions_keys_by_kind() {
        let schema = schema();
        let post = schema.resource("post").unwrap();
        let attributes: Vec<_> = post.attributes.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            attributes,
            vec!["id", "title", "status", "tags", "published_at"]
        );
        assert_eq!(post.aggregates.len(), 2);
        assert_eq!(post.relationships.len(), 2);
        assert_eq!(post.embeds[0].target, "post_metadata");
        assert_eq!(post.unions.len(), 2);
        assert!(schema.resource("post_metadata").unwrap().embedded);
    }

    #[test]
    fn colliding_client_names_resolve_like_the_registry() {
        let registry = Registry::from_json_str(
            r#"{"resources":[{"identifier":"row","fields":[
                {"kind":"calculation","name":"ab_c","type":"integer","nullable":false},
                {"kind":"attribute","name":"a_bc","type":"string"}]}]}"#,
        )
        .unwrap();
        let naming = NamingConvention::custom(
            "squashed",
            |name| name.replace('_', "").to_uppercase(),
            |client| client.to_string(),
        );

        let runtime = registry
            .lookup("row")
            .unwrap()
            .resolve_client_name("ABC", &naming)
            .unwrap();
        assert_eq!(runtime.name(), "ab_c");

        let shape = output_type(
            &StaticSchema::from_registry(&registry),
            "row",
            &json!(["ABC"]),
            &naming,
            &SelectionSyntax::default(),
        )
        .unwrap();
        assert_eq!(
            shape.field("ABC"),
            Some(&TypeShape::Scalar {
                value_type: ValueType::Integer,
                nullable: false
            })
        );
    }

    #[test]
    fn attribute_shapes() {
        let shape = shape(json!(["id", "status"])).unwrap();
        assert_eq!(keys(&shape), vec!["id", "status"]);
        assert_eq!(
            shape.field("id"),
            Some(&TypeShape::Scalar {
                value_type: ValueType::Uuid,
                nullable: false
            })
        );
        assert!(shape.field("status").unwrap().nullable());
    }

    #[test]
    fn scalar_calculation_contributes_only_its_type() {
        let shape = shape(json!([{ "excerpt": { "args": { "length": 5 } } }])).unwrap();
        assert_eq!(
            shape.field("excerpt"),
            Some(&TypeShape::Scalar {
                value_type: ValueType::String,
                nullable: true
            })
        );
    }

    #[test]
    fn record_calculation_is_nested() {
        let shape = shape(json!([
            { "summary": { "args": { "locale": "en" }, "fields": ["headline"] } }
        ]))
        .unwrap();
        let summary = shape.field("summary").unwrap();
        assert_eq!(keys(summary), vec!["headline"]);
    }

    #[test]
    fn many_relationship_is_a_list() {
        let shape = shape(json!([{ "comments": ["body", "likes"] }])).unwrap();
        let TypeShape::List { item, nullable } = shape.field("comments").unwrap() else {
            panic!("expected list");
        };
        assert!(*nullable);
        assert_eq!(keys(item), vec!["body", "likes"]);
        assert!(!item.nullable());
    }

    #[test]
    fn embedded_leaf_is_attributes_only() {
        let shape = shape(json!(["metadata"])).unwrap();
        assert_eq!(
            keys(shape.field("metadata").unwrap()),
            vec!["category", "priority"]
        );
    }

    #[test]
    fn embedded_computed_children_are_required_keys() {
        let shape = shape(json!([{ "metadata": ["category", "displayCategory"] }])).unwrap();
        assert_eq!(
            keys(shape.field("metadata").unwrap()),
            vec!["category", "displayCategory"]
        );
    }

    #[test]
    fn union_is_nullable_with_selected_variants() {
        let shape = shape(json!([{ "content": ["note", { "text": ["wordCount"] }] }])).unwrap();
        let content = shape.field("content").unwrap();
        assert!(content.nullable());
        assert_eq!(keys(content), vec!["note", "text"]);
    }

    #[test]
    fn rejects_what_the_parser_rejects() {
        assert!(matches!(
            shape(json!(["nickname"])),
            Err(SelectionError::UnknownField { .. })
        ));
        assert!(matches!(
            shape(json!(["owner"])),
            Err(SelectionError::InvalidSelectionShape { .. })
        ));
        assert!(matches!(
            shape(json!([{ "summary": ["headline"] }])),
            Err(SelectionError::MissingRequiredArgument { .. })
        ));
        assert!(matches!(
            shape(json!([{ "excerpt": { "args": { "style": 1 } } }])),
            Err(SelectionError::UnknownArgument { .. })
        ));
        assert!(matches!(
            shape(json!(["content"])),
            Err(SelectionError::InvalidSelectionShape { .. })
        ));
        assert!(matches!(
            shape(json!(["id", "id"])),
            Err(SelectionError::InvalidSelectionShape { .. })
        ));
    }

    #[test]
    fn schema_round_trips_through_json() {
        let schema = schema();
        let json = serde_json::to_string(&schema).unwrap();
        let back: StaticSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schema);
    }
}
