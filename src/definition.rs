//! Resource definition documents.
//!
//! The registry is built from one or more of these. Authoring them is someone
//! else's job; this module only fixes their serialized shape.
//!
//! ```json
//! {
//!   "resources": [
//!     {
//!       "identifier": "post",
//!       "primary_key": ["id"],
//!       "fields": [
//!         { "kind": "attribute", "name": "id", "type": "uuid", "nullable": false },
//!         { "kind": "relationship", "name": "owner", "resource": "user" },
//!         { "kind": "aggregate", "name": "comment_count", "aggregate": "count", "path": ["comments"] }
//!       ]
//!     }
//!   ],
//!   "actions": [{ "name": "list_posts", "resource": "post", "kind": "read" }]
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::Cardinality;

/// Top-level definition document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDefinition {
    #[serde(default)]
    pub resources: Vec<ResourceDefinition>,
    #[serde(default)]
    pub actions: Vec<ActionDefinition>,
}

impl SchemaDefinition {
    /// Merge several documents into one, preserving declaration order.
    pub fn merge(documents: impl IntoIterator<Item = SchemaDefinition>) -> Self {
        let mut merged = SchemaDefinition::default();
        for doc in documents {
            merged.resources.extend(doc.resources);
            merged.actions.extend(doc.actions);
        }
        merged
    }
}

/// One resource (or embedded sub-record type).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDefinition {
    pub identifier: String,
    /// Embedded resources are only reachable through containment.
    #[serde(default)]
    pub embedded: bool,
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

/// Field declaration, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldDefinition {
    Attribute {
        name: String,
        #[serde(rename = "type")]
        value_type: String,
        #[serde(default = "default_true")]
        nullable: bool,
    },
    Calculation {
        name: String,
        /// Scalar return type. Exclusive with `resource`.
        #[serde(rename = "type", default)]
        value_type: Option<String>,
        /// Record return type. Exclusive with `type`.
        #[serde(default)]
        resource: Option<String>,
        #[serde(default)]
        many: bool,
        #[serde(default = "default_true")]
        nullable: bool,
        #[serde(default)]
        arguments: Vec<ArgumentDefinition>,
    },
    Aggregate {
        name: String,
        aggregate: AggregateKind,
        path: Vec<String>,
        #[serde(default)]
        field: Option<String>,
    },
    Relationship {
        name: String,
        resource: String,
        #[serde(default)]
        cardinality: Cardinality,
        #[serde(default = "default_true")]
        nullable: bool,
    },
    Embedded {
        name: String,
        resource: String,
        #[serde(default)]
        cardinality: Cardinality,
        #[serde(default = "default_true")]
        nullable: bool,
    },
    Union {
        name: String,
        #[serde(default = "default_true")]
        nullable: bool,
        variants: Vec<VariantDefinition>,
    },
}

impl FieldDefinition {
    pub fn name(&self) -> &str {
        match self {
            FieldDefinition::Attribute { name, .. }
            | FieldDefinition::Calculation { name, .. }
            | FieldDefinition::Aggregate { name, .. }
            | FieldDefinition::Relationship { name, .. }
            | FieldDefinition::Embedded { name, .. }
            | FieldDefinition::Union { name, .. } => name,
        }
    }
}

/// Declared calculation argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgumentDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<Value>,
}

/// Union variant: scalar (`type`) or embedded record (`resource`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantDefinition {
    pub tag: String,
    #[serde(rename = "type", default)]
    pub value_type: Option<String>,
    #[serde(default)]
    pub resource: Option<String>,
}

/// Summary function of an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateKind {
    Count,
    Exists,
    Sum,
    Avg,
    Min,
    Max,
    First,
    List,
}

impl AggregateKind {
    /// Whether the aggregate summarizes a field of the target (vs. rows).
    pub fn needs_field(self) -> bool {
        !matches!(self, AggregateKind::Count | AggregateKind::Exists)
    }
}

/// What an action does with its resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// List of records, optionally paginated.
    Read,
    /// Single record or null.
    Get,
    Create,
    Update,
    Destroy,
}

/// Named entry point a request envelope can invoke.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDefinition {
    pub name: String,
    pub resource: String,
    pub kind: ActionKind,
    #[serde(default)]
    pub requires_tenant: bool,
}

fn default_true() -> bool {
    true
}
