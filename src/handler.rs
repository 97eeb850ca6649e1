//! Request handling.
//!
//! Takes a request envelope, resolves its action, parses and plans the
//! selection, calls the external fetch engine through [`Fetcher`] and
//! projects what comes back. Every failure ends up in the response's
//! `errors` list; nothing here panics on client input.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::EngineConfig;
use crate::definition::{ActionKind, SchemaDefinition};
use crate::error::{ErrorDescriptor, FetchError, RegistryError, RequestError};
use crate::naming::NamingConvention;
use crate::plan::{FetchPlan, PlanBuilder};
use crate::projector::Projector;
use crate::registry::Registry;
use crate::selection::{SelectionParser, SelectionSyntax};
use crate::sort::{parse_sort, SortTerm};
use crate::types::json_type_name;

/// Incoming request, as submitted by the transport layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestEnvelope {
    pub action: String,
    #[serde(default)]
    pub input: Option<Value>,
    pub fields: Value,
    #[serde(default)]
    pub filter: Option<Value>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub page: Option<Page>,
    #[serde(default)]
    pub tenant: Option<String>,
}

/// Requested page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Page {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

/// A routable action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    pub name: String,
    pub resource: String,
    pub kind: ActionKind,
    pub requires_tenant: bool,
}

/// Actions by name.
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Action>,
}

impl ActionRegistry {
    /// Collect the document's actions, checking each targets a public resource.
    ///
    /// # Errors
    ///
    /// `RegistryError` for unknown or embedded target resources and duplicate
    /// action names.
    pub fn build(definition: &SchemaDefinition, registry: &Registry) -> Result<Self, RegistryError> {
        let mut actions = HashMap::new();
        for action in &definition.actions {
            let path = format!("actions.{}", action.name);
            let resource = registry
                .get(&action.resource)
                .ok_or_else(|| RegistryError::UnknownResource {
                    path: path.clone(),
                    resource: action.resource.clone(),
                })?;
            if resource.is_embedded() {
                return Err(RegistryError::InvalidDefinition {
                    path,
                    message: format!(
                        "\"{}\" is an embedded resource and cannot be acted on",
                        action.resource
                    ),
                });
            }

            let entry = Action {
                name: action.name.clone(),
                resource: action.resource.clone(),
                kind: action.kind,
                requires_tenant: action.requires_tenant,
            };
            if actions.insert(action.name.clone(), entry).is_some() {
                return Err(RegistryError::InvalidDefinition {
                    path,
                    message: "action is declared more than once".to_string(),
                });
            }
        }
        Ok(Self { actions })
    }

    pub fn get(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    /// Action names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Who is asking, forwarded opaquely to the fetch engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FetchContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<Value>,
}

/// Everything the fetch engine needs for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchRequest {
    pub action: String,
    pub resource: String,
    pub kind: ActionKind,
    pub plan: FetchPlan,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortTerm>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<Page>,
    pub context: FetchContext,
}

/// The external data-fetch engine.
///
/// Returns raw data keyed by canonical field names: a list of records for
/// `read` (or `{"results": [...], "has_more": bool}` when paginated), a record
/// or null for `get`, and a record for `create`, `update` and `destroy`.
pub trait Fetcher {
    fn fetch(&self, request: &FetchRequest) -> Result<Value, FetchError>;
}

impl<F> Fetcher for F
where
    F: Fn(&FetchRequest) -> Result<Value, FetchError>,
{
    fn fetch(&self, request: &FetchRequest) -> Result<Value, FetchError> {
        self(request)
    }
}

/// Fetcher that answers every request with the same raw data.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticFetcher {
    data: Value,
}

impl StaticFetcher {
    pub fn new(data: Value) -> Self {
        Self { data }
    }
}

impl Fetcher for StaticFetcher {
    fn fetch(&self, _request: &FetchRequest) -> Result<Value, FetchError> {
        Ok(self.data.clone())
    }
}

/// `{success: true, data}` or `{success: false, errors}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorDescriptor>>,
}

impl Response {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            errors: None,
        }
    }

    pub fn failed(errors: Vec<ErrorDescriptor>) -> Self {
        Self {
            success: false,
            data: None,
            errors: Some(errors),
        }
    }
}

/// Request entry point: registry, actions, naming and a fetch engine.
pub struct Engine<F> {
    registry: Arc<Registry>,
    actions: ActionRegistry,
    naming: NamingConvention,
    syntax: SelectionSyntax,
    max_limit: usize,
    fetcher: F,
}

impl<F: Fetcher> Engine<F> {
    pub fn new(
        registry: Arc<Registry>,
        actions: ActionRegistry,
        config: &EngineConfig,
        fetcher: F,
    ) -> Self {
        Self {
            registry,
            actions,
            naming: config.naming(),
            syntax: config.syntax(),
            max_limit: config.pagination.max_limit,
            fetcher,
        }
    }

    /// Build the registry and actions from a definition document.
    ///
    /// # Errors
    ///
    /// Fails on the first configuration fault in the document.
    pub fn from_definition(
        definition: &SchemaDefinition,
        config: &EngineConfig,
        fetcher: F,
    ) -> Result<Self, RegistryError> {
        let registry = Registry::build(definition)?;
        let actions = ActionRegistry::build(definition, &registry)?;
        Ok(Self::new(Arc::new(registry), actions, config, fetcher))
    }

    /// Replace the naming convention (e.g. with a custom encode/decode pair).
    pub fn with_naming(mut self, naming: NamingConvention) -> Self {
        self.naming = naming;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    /// Handle one request envelope.
    pub fn handle(&self, envelope: &Value, actor: Option<&Value>) -> Response {
        match self.try_handle(envelope, actor) {
            Ok(data) => Response::ok(data),
            Err(error) => {
                tracing::warn!(%error, "request failed");
                Response::failed(vec![error.descriptor()])
            }
        }
    }

    fn try_handle(&self, envelope: &Value, actor: Option<&Value>) -> Result<Value, RequestError> {
        let envelope = RequestEnvelope::deserialize(envelope).map_err(|e| {
            RequestError::InvalidEnvelope {
                message: e.to_string(),
            }
        })?;

        let action = self
            .actions
            .get(&envelope.action)
            .ok_or_else(|| RequestError::ActionNotFound {
                action: envelope.action.clone(),
            })?;
        if action.requires_tenant && envelope.tenant.is_none() {
            return Err(RequestError::TenantRequired {
                action: action.name.clone(),
            });
        }
        tracing::info!(
            action = %action.name,
            tenant = ?envelope.tenant,
            "handling request"
        );

        let resource = self.registry.lookup(&action.resource)?;
        let page = self.check_page(action, envelope.page)?;
        let sort = match &envelope.sort {
            Some(sort) => parse_sort(sort, resource, &self.registry, &self.naming)?,
            None => Vec::new(),
        };

        let selection = SelectionParser::new(&self.registry, &self.naming, &self.syntax)
            .parse(&envelope.fields, resource)?;
        let plan = PlanBuilder::new(&self.registry).build(&selection, resource)?;

        let request = FetchRequest {
            action: action.name.clone(),
            resource: action.resource.clone(),
            kind: action.kind,
            plan,
            input: envelope.input,
            filter: envelope.filter,
            sort,
            page,
            context: FetchContext {
                tenant: envelope.tenant,
                actor: actor.cloned(),
            },
        };
        let raw = self.fetcher.fetch(&request)?;

        let projector = Projector::new(&self.registry, &self.naming);
        let unexpected = |expected: &'static str, raw: &Value| RequestError::UnexpectedResult {
            action: action.name.clone(),
            expected,
            actual: json_type_name(raw),
        };

        match (action.kind, page) {
            (ActionKind::Read, None) => match &raw {
                Value::Array(_) => Ok(projector.project(&raw, &selection)),
                other => Err(unexpected("array", other)),
            },
            (ActionKind::Read, Some(page)) => {
                let results = raw.get("results").filter(|r| r.is_array());
                let has_more = raw.get("has_more").and_then(Value::as_bool);
                let (Some(results), Some(has_more)) = (results, has_more) else {
                    return Err(unexpected("page object", &raw));
                };

                let mut output = Map::new();
                output.insert(
                    self.naming.encode("results"),
                    projector.project(results, &selection),
                );
                output.insert(self.naming.encode("has_more"), Value::Bool(has_more));
                output.insert(self.naming.encode("limit"), page.limit.map_or(Value::Null, Value::from));
                output.insert(self.naming.encode("offset"), page.offset.map_or(Value::Null, Value::from));
                Ok(Value::Object(output))
            }
            (ActionKind::Get, _) => match &raw {
                Value::Object(_) | Value::Null => Ok(projector.project(&raw, &selection)),
                other => Err(unexpected("object or null", other)),
            },
            (ActionKind::Create | ActionKind::Update | ActionKind::Destroy, _) => match &raw {
                Value::Object(_) => Ok(projector.project(&raw, &selection)),
                other => Err(unexpected("object", other)),
            },
        }
    }

    /// Validate a page window and fill in the effective limit and offset.
    fn check_page(&self, action: &Action, page: Option<Page>) -> Result<Option<Page>, RequestError> {
        let Some(page) = page else {
            return Ok(None);
        };
        if action.kind != ActionKind::Read {
            return Err(RequestError::InvalidPage {
                message: format!("{} is not a read action", action.name),
            });
        }

        let limit = page.limit.unwrap_or(self.max_limit);
        if limit == 0 {
            return Err(RequestError::InvalidPage {
                message: "limit must be positive".to_string(),
            });
        }
        if limit > self.max_limit {
            return Err(RequestError::InvalidPage {
                message: format!("limit {} exceeds the maximum of {}", limit, self.max_limit),
            });
        }

        Ok(Some(Page {
            limit: Some(limit),
            offset: Some(page.offset.unwrap_or(0)),
        }))
    }
}
