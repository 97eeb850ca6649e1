//! Resource Projection
//!
//! Schema-driven field selection over a graph of typed resources.
//!
//! A client sends a declarative selection tree. The engine validates it
//! against the [`Registry`], splits it into a [`FetchPlan`] (fields read
//! directly vs. fields that need computation), hands the plan to an external
//! fetch engine, and projects the raw result back into exactly the requested
//! shape. The [`StaticSchema`] mirror derives the same shape ahead of time.
//!
//! # Example
//!
//! ```
//! use resource_projection::{
//!     build_plan, parse_selection, project, NamingConvention, Registry, SelectionSyntax,
//! };
//! use serde_json::json;
//!
//! let registry = Registry::from_json_str(r#"{
//!     "resources": [{
//!         "identifier": "post",
//!         "primary_key": ["id"],
//!         "fields": [
//!             { "kind": "attribute", "name": "id", "type": "uuid", "nullable": false },
//!             { "kind": "attribute", "name": "title", "type": "string" },
//!             { "kind": "attribute", "name": "published_at", "type": "utc_datetime" }
//!         ]
//!     }]
//! }"#).unwrap();
//!
//! let naming = NamingConvention::camel_case();
//! let post = registry.lookup("post").unwrap();
//! let selection = parse_selection(
//!     &json!(["id", "publishedAt"]),
//!     post,
//!     &registry,
//!     &naming,
//!     &SelectionSyntax::default(),
//! )
//! .unwrap();
//!
//! let plan = build_plan(&selection, post, &registry).unwrap();
//! assert_eq!(plan.direct, vec!["id", "published_at"]);
//!
//! let raw = json!({ "id": "p1", "title": "Hello", "published_at": "2024-01-01T00:00:00Z" });
//! let output = project(&raw, &selection, &registry, &naming);
//! assert_eq!(output, json!({ "id": "p1", "publishedAt": "2024-01-01T00:00:00Z" }));
//! ```
//!
//! # Field kinds
//!
//! | Kind | Fetch | Output |
//! |------|-------|--------|
//! | attribute | direct | scalar |
//! | calculation | computed (with arguments) | scalar or record |
//! | aggregate | computed | scalar |
//! | relationship | computed (nested plan) | record or list |
//! | embedded | direct, plus computed when computed children are selected | record or list |
//! | union | direct, plus computed for record variants that need it | single-key object |

mod config;
mod conformance;
mod definition;
mod error;
mod handler;
mod linter;
mod loader;
mod mirror;
mod naming;
mod plan;
mod projector;
mod registry;
mod selection;
mod sort;
mod typegen;
mod types;

pub use config::{EngineConfig, NamingConfig, PaginationConfig};
pub use conformance::{conform, ShapeMismatch};
pub use definition::{
    ActionDefinition, ActionKind, AggregateKind, ArgumentDefinition, FieldDefinition,
    ResourceDefinition, SchemaDefinition, VariantDefinition,
};
pub use error::{
    ErrorDescriptor, FetchError, PlanError, RegistryError, RequestError, SelectionError,
};
pub use handler::{
    Action, ActionRegistry, Engine, FetchContext, FetchRequest, Fetcher, Page, RequestEnvelope,
    Response, StaticFetcher,
};
pub use linter::{lint, Diagnostic, FileResult, FileStatus, LintResult, Severity};
pub use loader::{collect_json_files, load_definition, load_definition_str, load_json, load_json_str};
pub use mirror::{
    output_type, ShapeField, StaticArgument, StaticCalculation, StaticRecord, StaticResource,
    StaticReturn, StaticScalar, StaticSchema, StaticUnion, StaticVariant, TypeShape,
};
pub use naming::{NameCase, NamingConvention};
pub use plan::{build_plan, ComputedField, FetchPlan, PlanBuilder, VariantPlan};
pub use projector::{project, Projector, UNION_TAG_KEY, UNION_VALUE_KEY};
pub use registry::{
    AggregateField, ArgumentDescriptor, AttributeField, CalculationField, CalculationReturn,
    EmbeddedField, FieldDescriptor, FieldKind, Registry, RelationshipField, ResourceDescriptor,
    UnionField, UnionVariant, VariantShape,
};
pub use selection::{
    parse_selection, Children, SelectionEntry, SelectionNode, SelectionParser, SelectionSyntax,
    VariantSelection,
};
pub use sort::{parse_sort, SortOrder, SortTerm};
pub use typegen::{render_output_type, render_schema_module};
pub use types::{Cardinality, ValueType};
