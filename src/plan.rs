//! Fetch planning.
//!
//! Splits a parsed selection into fields the fetch engine loads directly and
//! fields it must compute or join. The engine rejects non-attributes on the
//! direct channel, so the split has to be exact:
//!
//! - attributes go to `direct`;
//! - calculations, aggregates and relationships go to `computed`;
//! - embedded records go to `direct` (their attributes arrive with the
//!   container) and, only when a computed child was requested, also to
//!   `computed` with a computed-only nested plan;
//! - unions go to `direct`, plus a `computed` entry when a record variant
//!   requested computed children.

use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::error::PlanError;
use crate::registry::{FieldKind, Registry, ResourceDescriptor};
use crate::selection::{Children, SelectionEntry, SelectionNode};

/// Fetch instructions for one resource level.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FetchPlan {
    /// Canonical names loaded with the record itself.
    pub direct: Vec<String>,
    /// Fields needing an explicit computation or load step.
    pub computed: Vec<ComputedField>,
}

impl FetchPlan {
    pub fn is_empty(&self) -> bool {
        self.direct.is_empty() && self.computed.is_empty()
    }

    pub fn is_direct(&self, name: &str) -> bool {
        self.direct.iter().any(|d| d == name)
    }

    pub fn computed(&self, name: &str) -> Option<&ComputedField> {
        self.computed.iter().find(|c| c.name() == name)
    }
}

/// One computed-channel instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComputedField {
    Calculation {
        name: String,
        #[serde(skip_serializing_if = "Map::is_empty")]
        arguments: Map<String, Value>,
        /// Present for record-returning calculations.
        #[serde(skip_serializing_if = "Option::is_none")]
        nested: Option<FetchPlan>,
    },
    Aggregate {
        name: String,
    },
    Relationship {
        name: String,
        nested: FetchPlan,
    },
    /// Computed children of an embedded record. `nested.direct` is always empty.
    Embedded {
        name: String,
        nested: FetchPlan,
    },
    /// Computed children of record variants, by variant tag.
    Union {
        name: String,
        variants: Vec<VariantPlan>,
    },
}

impl ComputedField {
    pub fn name(&self) -> &str {
        match self {
            ComputedField::Calculation { name, .. }
            | ComputedField::Aggregate { name }
            | ComputedField::Relationship { name, .. }
            | ComputedField::Embedded { name, .. }
            | ComputedField::Union { name, .. } => name,
        }
    }

    /// Nested plan, for instructions that carry exactly one.
    pub fn nested(&self) -> Option<&FetchPlan> {
        match self {
            ComputedField::Calculation { nested, .. } => nested.as_ref(),
            ComputedField::Relationship { nested, .. } | ComputedField::Embedded { nested, .. } => {
                Some(nested)
            }
            _ => None,
        }
    }
}

/// Computed-only plan for one record variant of a union.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantPlan {
    pub tag: String,
    pub plan: FetchPlan,
}

/// Whether the level being planned is fetched as its own record or rides
/// inside a directly fetched container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Record,
    ComputedOnly,
}

/// Builds fetch plans against a registry.
#[derive(Debug, Clone, Copy)]
pub struct PlanBuilder<'a> {
    registry: &'a Registry,
}

impl<'a> PlanBuilder<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Plan a parsed selection against `resource`.
    ///
    /// # Errors
    ///
    /// `PlanError` only when the selection was not produced by the parser for
    /// this registry.
    pub fn build(
        &self,
        node: &SelectionNode,
        resource: &ResourceDescriptor,
    ) -> Result<FetchPlan, PlanError> {
        let plan = self.level(node, resource, Scope::Record)?;
        tracing::debug!(
            resource = resource.identifier(),
            direct = plan.direct.len(),
            computed = plan.computed.len(),
            "built fetch plan"
        );
        Ok(plan)
    }

    fn level(
        &self,
        node: &SelectionNode,
        resource: &ResourceDescriptor,
        scope: Scope,
    ) -> Result<FetchPlan, PlanError> {
        let mut plan = FetchPlan::default();

        for entry in &node.entries {
            let kind = resource
                .classify(&entry.name)
                .ok_or_else(|| unreachable(resource, entry))?;

            match kind {
                FieldKind::Attribute => {
                    if scope == Scope::Record {
                        plan.direct.push(entry.name.clone());
                    }
                }

                FieldKind::ScalarCalculation => plan.computed.push(ComputedField::Calculation {
                    name: entry.name.clone(),
                    arguments: entry.arguments.clone(),
                    nested: None,
                }),

                FieldKind::RecordCalculation => {
                    let nested = self.record_children(entry, resource, Scope::Record)?;
                    plan.computed.push(ComputedField::Calculation {
                        name: entry.name.clone(),
                        arguments: entry.arguments.clone(),
                        nested: Some(nested),
                    });
                }

                FieldKind::Aggregate => plan.computed.push(ComputedField::Aggregate {
                    name: entry.name.clone(),
                }),

                FieldKind::Relationship => {
                    let nested = self.record_children(entry, resource, Scope::Record)?;
                    plan.computed.push(ComputedField::Relationship {
                        name: entry.name.clone(),
                        nested,
                    });
                }

                FieldKind::Embedded => {
                    if scope == Scope::Record {
                        plan.direct.push(entry.name.clone());
                    }
                    let nested = self.record_children(entry, resource, Scope::ComputedOnly)?;
                    if !nested.computed.is_empty() {
                        plan.computed.push(ComputedField::Embedded {
                            name: entry.name.clone(),
                            nested,
                        });
                    } else {
                        tracing::trace!(field = %entry.name, "embedded record has no computed children");
                    }
                }

                FieldKind::Union => {
                    if scope == Scope::Record {
                        plan.direct.push(entry.name.clone());
                    }
                    let variants = self.union_variants(entry, resource)?;
                    if !variants.is_empty() {
                        plan.computed.push(ComputedField::Union {
                            name: entry.name.clone(),
                            variants,
                        });
                    }
                }
            }
        }

        Ok(plan)
    }

    /// Plan the nested selection of a record-valued field.
    fn record_children(
        &self,
        entry: &SelectionEntry,
        resource: &ResourceDescriptor,
        scope: Scope,
    ) -> Result<FetchPlan, PlanError> {
        let Children::Fields(child) = &entry.children else {
            return Err(mismatch(resource, entry));
        };
        let target = resource
            .field(&entry.name)
            .and_then(|f| f.record_target())
            .and_then(|(target, _)| self.registry.get(target))
            .ok_or_else(|| unreachable(resource, entry))?;
        self.level(child, target, scope)
    }

    /// Computed-only plans of the selected record variants, dropping empty ones.
    fn union_variants(
        &self,
        entry: &SelectionEntry,
        resource: &ResourceDescriptor,
    ) -> Result<Vec<VariantPlan>, PlanError> {
        let Children::Variants(selected) = &entry.children else {
            return Err(mismatch(resource, entry));
        };

        let mut variants = Vec::new();
        for variant in selected {
            let Some(child) = &variant.children else {
                continue;
            };
            let target = self
                .registry
                .get(&child.resource)
                .ok_or_else(|| unreachable(resource, entry))?;
            let plan = self.level(child, target, Scope::ComputedOnly)?;
            if !plan.computed.is_empty() {
                variants.push(VariantPlan {
                    tag: variant.tag.clone(),
                    plan,
                });
            }
        }
        Ok(variants)
    }
}

/// Plan `node` against `resource`.
pub fn build_plan(
    node: &SelectionNode,
    resource: &ResourceDescriptor,
    registry: &Registry,
) -> Result<FetchPlan, PlanError> {
    PlanBuilder::new(registry).build(node, resource)
}

fn unreachable(resource: &ResourceDescriptor, entry: &SelectionEntry) -> PlanError {
    tracing::error!(
        resource = resource.identifier(),
        field = %entry.name,
        "selection entry does not classify against its resource"
    );
    PlanError::UnreachableClassification {
        resource: resource.identifier().to_string(),
        field: entry.name.clone(),
    }
}

fn mismatch(resource: &ResourceDescriptor, entry: &SelectionEntry) -> PlanError {
    tracing::error!(
        resource = resource.identifier(),
        field = %entry.name,
        "selection entry children do not fit the field kind"
    );
    PlanError::SelectionMismatch {
        resource: resource.identifier().to_string(),
        field: entry.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::NamingConvention;
    use crate::selection::{parse_selection, SelectionSyntax};
    use serde_json::json;

    fn registry() -> Registry {
        Registry::from_json_str(include_str!("../tests/fixtures/blog.json")).unwrap()
    }

    fn plan(raw: Value) -> FetchPlan {
        let registry = registry();
        let post = registry.lookup("post").unwrap();
        let node = parse_selection(
            &raw,
            post,
            &registry,
            &NamingConvention::camel_case(),
            &SelectionSyntax::default(),
        )
        .unwrap();
        build_plan(&node, post, &registry).unwrap()
    }

    #[test]
    fn attributes_only() {
        let plan = plan(json!(["id", "title"]));
        assert_eq!(plan.direct, vec!["id", "title"]);
        assert!(plan.computed.is_empty());
    }

    #[test]
    fn aggregate_is_computed() {
        let plan = plan(json!(["id", { "commentCount": {} }]));
        assert_eq!(plan.direct, vec!["id"]);
        assert_eq!(
            plan.computed,
            vec![ComputedField::Aggregate {
                name: "comment_count".into()
            }]
        );
    }

    #[test]
    fn relationship_gets_nested_plan() {
        let plan = plan(json!(["id", { "owner": { "fields": ["name"] } }]));
        assert_eq!(plan.direct, vec!["id"]);
        assert_eq!(
            plan.computed,
            vec![ComputedField::Relationship {
                name: "owner".into(),
                nested: FetchPlan {
                    direct: vec!["name".into()],
                    computed: vec![],
                },
            }]
        );
    }

    #[test]
    fn embedded_attributes_only_stay_direct() {
        let plan = plan(json!(["id", { "metadata": ["category"] }]));
        assert_eq!(plan.direct, vec!["id", "metadata"]);
        assert!(plan.computed.is_empty());
    }

    #[test]
    fn embedded_computed_child_is_scoped() {
        let plan = plan(json!(["id", { "metadata": ["category", "displayCategory"] }]));
        assert_eq!(plan.direct, vec!["id", "metadata"]);
        assert_eq!(
            plan.computed,
            vec![ComputedField::Embedded {
                name: "metadata".into(),
                nested: FetchPlan {
                    direct: vec![],
                    computed: vec![ComputedField::Calculation {
                        name: "display_category".into(),
                        arguments: Map::new(),
                        nested: None,
                    }],
                },
            }]
        );
    }

    #[test]
    fn nested_embedded_without_computed_children_is_omitted() {
        let plan = plan(json!([{ "metadata": ["category", { "seo": ["slug"] }] }]));
        assert_eq!(plan.direct, vec!["metadata"]);
        assert!(plan.computed.is_empty());
    }

    #[test]
    fn computed_child_of_nested_embedded_propagates() {
        let plan = plan(json!([{ "metadata": [{ "seo": ["slug", "canonicalUrl"] }] }]));
        let Some(ComputedField::Embedded { nested, .. }) = plan.computed("metadata") else {
            panic!("expected embedded scope");
        };
        assert!(nested.direct.is_empty());
        let Some(ComputedField::Embedded { nested: seo, .. }) = nested.computed("seo") else {
            panic!("expected nested embedded scope");
        };
        assert!(seo.direct.is_empty());
        assert_eq!(seo.computed[0].name(), "canonical_url");
    }

    #[test]
    fn relationship_inside_embedded_gets_full_plan() {
        let plan = plan(json!([{ "metadata": [{ "reviewer": ["name"] }] }]));
        let nested = plan.computed("metadata").and_then(ComputedField::nested).unwrap();
        assert_eq!(
            nested.computed("reviewer").and_then(ComputedField::nested).unwrap().direct,
            vec!["name"]
        );
    }

    #[test]
    fn union_with_computed_record_variant() {
        let plan = plan(json!(["id", { "content": ["note", { "text": ["wordCount"] }] }]));
        assert_eq!(plan.direct, vec!["id", "content"]);
        let Some(ComputedField::Union { variants, .. }) = plan.computed("content") else {
            panic!("expected union instruction");
        };
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].tag, "text");
        assert_eq!(variants[0].plan.computed[0].name(), "word_count");
    }

    #[test]
    fn union_without_computed_children_is_direct_only() {
        let plan = plan(json!([{ "content": ["note", { "text": ["body"] }] }, "rating"]));
        assert_eq!(plan.direct, vec!["content", "rating"]);
        assert!(plan.computed.is_empty());
    }

    #[test]
    fn calculation_carries_arguments() {
        let plan = plan(json!([{ "excerpt": { "args": { "length": 10 } } }]));
        assert_eq!(
            plan.computed,
            vec![ComputedField::Calculation {
                name: "excerpt".into(),
                arguments: json!({ "length": 10 }).as_object().cloned().unwrap(),
                nested: None,
            }]
        );
    }

    #[test]
    fn record_calculation_gets_nested_plan() {
        let plan = plan(json!([{ "summary": { "args": { "locale": "en" }, "fields": ["headline"] } }]));
        let Some(ComputedField::Calculation { arguments, nested, .. }) = plan.computed("summary")
        else {
            panic!("expected calculation");
        };
        assert_eq!(arguments.get("locale"), Some(&json!("en")));
        assert_eq!(nested.as_ref().unwrap().direct, vec!["headline"]);
    }

    #[test]
    fn partition_is_exact() {
        let registry = registry();
        let post = registry.lookup("post").unwrap();
        let plan = plan(json!([
            "id", "title", "status", "commentCount", "totalLikes",
            { "owner": ["name"] }, { "comments": ["body"] },
            { "metadata": ["category", "displayCategory"] },
            { "excerpt": {} }
        ]));

        for name in &plan.direct {
            let kind = post.classify(name).unwrap();
            assert!(!kind.is_computed(), "{} must not be direct", name);
        }
        for computed in &plan.computed {
            let kind = post.classify(computed.name()).unwrap();
            assert_ne!(kind, FieldKind::Attribute, "{} must not be computed", computed.name());
            if plan.is_direct(computed.name()) {
                assert!(matches!(kind, FieldKind::Embedded | FieldKind::Union));
            }
        }
    }

    #[test]
    fn foreign_selection_is_unreachable() {
        let registry = registry();
        let post = registry.lookup("post").unwrap();
        let mut node = SelectionNode::new("post");
        node.entries.push(SelectionEntry::leaf("ghost"));
        assert_eq!(
            build_plan(&node, post, &registry),
            Err(PlanError::UnreachableClassification {
                resource: "post".into(),
                field: "ghost".into()
            })
        );
    }

    #[test]
    fn relationship_without_children_is_a_mismatch() {
        let registry = registry();
        let post = registry.lookup("post").unwrap();
        let mut node = SelectionNode::new("post");
        node.entries.push(SelectionEntry::leaf("owner"));
        assert!(matches!(
            build_plan(&node, post, &registry),
            Err(PlanError::SelectionMismatch { .. })
        ));
    }

    #[test]
    fn serializes_tagged_instructions() {
        let plan = plan(json!(["id", { "commentCount": {} }]));
        assert_eq!(
            serde_json::to_value(&plan).unwrap(),
            json!({ "direct": ["id"], "computed": [{ "kind": "aggregate", "name": "comment_count" }] })
        );
    }
}
