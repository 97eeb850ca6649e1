//! Sort-string mini-language.
//!
//! `"-publishedAt,++owner.name,title"`: comma-separated terms, each an optional
//! order prefix followed by a dotted path through relationships.
//!
//! | prefix | order |
//! |--------|-------|
//! | none, `+` | ascending |
//! | `-` | descending |
//! | `++` | ascending, nulls first |
//! | `--` | descending, nulls last |

use serde::Serialize;

use crate::error::SelectionError;
use crate::naming::NamingConvention;
use crate::registry::{FieldDescriptor, FieldKind, Registry, ResourceDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
    AscNullsFirst,
    DescNullsLast,
}

impl SortOrder {
    /// Split an order prefix off a term.
    fn split(term: &str) -> (SortOrder, &str) {
        if let Some(rest) = term.strip_prefix("++") {
            (SortOrder::AscNullsFirst, rest)
        } else if let Some(rest) = term.strip_prefix("--") {
            (SortOrder::DescNullsLast, rest)
        } else if let Some(rest) = term.strip_prefix('+') {
            (SortOrder::Asc, rest)
        } else if let Some(rest) = term.strip_prefix('-') {
            (SortOrder::Desc, rest)
        } else {
            (SortOrder::Asc, term)
        }
    }
}

/// One sort key: canonical field path from the sorted resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortTerm {
    pub path: Vec<String>,
    pub order: SortOrder,
}

/// Parse and validate a sort string against `resource`.
///
/// # Errors
///
/// `SelectionError::InvalidSort` for empty terms, unknown path segments,
/// non-relationship intermediate segments and unsortable final fields.
pub fn parse_sort(
    input: &str,
    resource: &ResourceDescriptor,
    registry: &Registry,
    naming: &NamingConvention,
) -> Result<Vec<SortTerm>, SelectionError> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }

    let invalid = |message: String| SelectionError::InvalidSort {
        resource: resource.identifier().to_string(),
        message,
    };

    let mut terms = Vec::new();
    for raw in input.split(',') {
        let raw = raw.trim();
        let (order, path) = SortOrder::split(raw);
        if path.is_empty() {
            return Err(invalid(format!("empty sort term \"{}\"", raw)));
        }

        let segments: Vec<&str> = path.split('.').collect();
        let mut current = resource;
        let mut canonical = Vec::with_capacity(segments.len());

        for (i, segment) in segments.iter().enumerate() {
            let field = current
                .resolve_client_name(segment, naming)
                .ok_or_else(|| {
                    invalid(format!(
                        "unknown field \"{}\" on {}",
                        segment,
                        current.identifier()
                    ))
                })?;
            canonical.push(field.name().to_string());

            let last = i + 1 == segments.len();
            if last {
                if !sortable(field) {
                    return Err(invalid(format!("\"{}\" is not sortable", path)));
                }
            } else {
                let FieldDescriptor::Relationship(rel) = field else {
                    return Err(invalid(format!(
                        "\"{}\" on {} is not a relationship",
                        segment,
                        current.identifier()
                    )));
                };
                if rel.cardinality.is_many() {
                    return Err(invalid(format!(
                        "cannot sort through to-many relationship \"{}\"",
                        segment
                    )));
                }
                current = registry
                    .get(&rel.target)
                    .ok_or_else(|| invalid(format!("unknown resource \"{}\"", rel.target)))?;
            }
        }

        terms.push(SortTerm {
            path: canonical,
            order,
        });
    }

    tracing::debug!(
        resource = resource.identifier(),
        terms = terms.len(),
        "parsed sort"
    );
    Ok(terms)
}

/// Scalar fields a sort can reach without client input. A calculation with a
/// required argument has no value to sort on.
fn sortable(field: &FieldDescriptor) -> bool {
    if let FieldDescriptor::Calculation(calc) = field {
        if calc.arguments.iter().any(|a| a.required) {
            return false;
        }
    }
    matches!(
        field.kind(),
        FieldKind::Attribute | FieldKind::Aggregate | FieldKind::ScalarCalculation
    )
}
