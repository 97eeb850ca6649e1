//! Error types for registration, selection parsing, planning and request handling.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Configuration faults raised while building the schema registry.
///
/// These are fatal at startup: the registry is never built from a document
/// that produces one.
#[derive(Debug, Error)]
pub enum RegistryError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    // Schema errors (exit code 2)
    #[error("{path}: value type \"{type_name}\" has no output type mapping")]
    UnmappedType { path: String, type_name: String },

    #[error("{path}: unknown resource \"{resource}\"")]
    UnknownResource { path: String, resource: String },

    #[error("resource \"{resource}\" is declared more than once")]
    DuplicateResource { resource: String },

    #[error("{path}: field is declared more than once")]
    DuplicateField { path: String },

    #[error("{path}: invalid aggregate path: {message}")]
    InvalidAggregatePath { path: String, message: String },

    #[error("{path}: {message}")]
    InvalidDefinition { path: String, message: String },

    #[error("resource not found: {resource}")]
    ResourceNotFound { resource: String },
}

impl RegistryError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            RegistryError::FileNotFound { .. } | RegistryError::ReadError { .. } => 3,
            _ => 2,
        }
    }

    /// Definition path the error points at (`resource.field`), if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            RegistryError::UnmappedType { path, .. }
            | RegistryError::UnknownResource { path, .. }
            | RegistryError::DuplicateField { path }
            | RegistryError::InvalidAggregatePath { path, .. }
            | RegistryError::InvalidDefinition { path, .. } => Some(path),
            RegistryError::DuplicateResource { resource }
            | RegistryError::ResourceNotFound { resource } => Some(resource),
            _ => None,
        }
    }
}

/// Client-input faults found while parsing a selection or sort string.
///
/// `field` is the dotted, client-facing path of the offending entry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectionError {
    #[error("unknown field \"{field}\" on {resource}")]
    UnknownField { resource: String, field: String },

    #[error("unknown argument \"{argument}\" for {field} on {resource}")]
    UnknownArgument {
        resource: String,
        field: String,
        argument: String,
    },

    #[error("missing required argument \"{argument}\" for {field} on {resource}")]
    MissingRequiredArgument {
        resource: String,
        field: String,
        argument: String,
    },

    #[error("invalid selection for {field} on {resource}: {message}")]
    InvalidSelectionShape {
        resource: String,
        field: String,
        message: String,
    },

    #[error("invalid sort on {resource}: {message}")]
    InvalidSort { resource: String, message: String },
}

impl SelectionError {
    pub(crate) fn shape(resource: &str, field: &str, message: impl Into<String>) -> Self {
        SelectionError::InvalidSelectionShape {
            resource: resource.to_string(),
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Stable machine-readable type name.
    pub fn kind(&self) -> &'static str {
        match self {
            SelectionError::UnknownField { .. } => "unknown_field",
            SelectionError::UnknownArgument { .. } => "unknown_argument",
            SelectionError::MissingRequiredArgument { .. } => "missing_required_argument",
            SelectionError::InvalidSelectionShape { .. } => "invalid_selection_shape",
            SelectionError::InvalidSort { .. } => "invalid_sort",
        }
    }

    pub fn resource(&self) -> &str {
        match self {
            SelectionError::UnknownField { resource, .. }
            | SelectionError::UnknownArgument { resource, .. }
            | SelectionError::MissingRequiredArgument { resource, .. }
            | SelectionError::InvalidSelectionShape { resource, .. }
            | SelectionError::InvalidSort { resource, .. } => resource,
        }
    }

    pub fn field(&self) -> Option<&str> {
        match self {
            SelectionError::UnknownField { field, .. }
            | SelectionError::UnknownArgument { field, .. }
            | SelectionError::MissingRequiredArgument { field, .. }
            | SelectionError::InvalidSelectionShape { field, .. } => Some(field),
            SelectionError::InvalidSort { .. } => None,
        }
    }
}

/// Internal invariant violations while building a fetch plan.
///
/// Never produced for a selection that came out of the parser.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("field \"{field}\" does not classify against {resource}")]
    UnreachableClassification { resource: String, field: String },

    #[error("selection of \"{field}\" on {resource} does not fit its field kind")]
    SelectionMismatch { resource: String, field: String },
}

/// Failure reported by the external fetch engine. Passed through as-is.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("fetch failed: {message}")]
pub struct FetchError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Errors while handling one request envelope.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("invalid request envelope: {message}")]
    InvalidEnvelope { message: String },

    #[error("action not found: {action}")]
    ActionNotFound { action: String },

    #[error("action {action} requires a tenant")]
    TenantRequired { action: String },

    #[error("invalid page: {message}")]
    InvalidPage { message: String },

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("unexpected fetch result for {action}: expected {expected}, got {actual}")]
    UnexpectedResult {
        action: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl RequestError {
    /// Build the serializable failure entry for this error.
    pub fn descriptor(&self) -> ErrorDescriptor {
        match self {
            RequestError::Selection(e) => ErrorDescriptor {
                kind: e.kind().to_string(),
                message: e.to_string(),
                resource: Some(e.resource().to_string()),
                field: e.field().map(String::from),
                details: None,
            },
            RequestError::Fetch(e) => ErrorDescriptor {
                kind: "fetch_error".to_string(),
                message: e.message.clone(),
                resource: None,
                field: None,
                details: e.details.clone(),
            },
            other => ErrorDescriptor {
                kind: other.kind().to_string(),
                message: other.to_string(),
                resource: None,
                field: None,
                details: None,
            },
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            RequestError::InvalidEnvelope { .. } => "invalid_envelope",
            RequestError::ActionNotFound { .. } => "action_not_found",
            RequestError::TenantRequired { .. } => "tenant_required",
            RequestError::InvalidPage { .. } => "invalid_page",
            RequestError::Selection(e) => e.kind(),
            RequestError::Plan(_) => "internal_error",
            RequestError::Fetch(_) => "fetch_error",
            RequestError::UnexpectedResult { .. } => "unexpected_result",
            RequestError::Registry(_) => "configuration_error",
        }
    }
}

/// Single failure entry in a `{success: false, errors: [...]}` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    /// Dotted client-facing field path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl std::fmt::Display for ErrorDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
