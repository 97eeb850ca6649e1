//! Definition linting - static analysis of resource definition files.
//!
//! Unlike [`Registry::build`], which stops at the first fault, the linter
//! reports every problem across every file:
//! - JSON syntax and document shape errors
//! - unmapped value types, unknown targets, duplicates, bad aggregate paths
//! - actions pointing at unknown or embedded resources
//! - embedded resources nothing contains, public resources without a primary key
//!
//! Files are merged before checking, so cross-file references resolve.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::definition::{FieldDefinition, SchemaDefinition};
use crate::error::RegistryError;
use crate::loader::{collect_json_files, load_definition};
use crate::registry::Registry;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: PathBuf,
    /// Definition path of the issue (e.g., "post.comment_count")
    pub path: String,
    pub message: String,
}

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a directory or set of files.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// Returns true if all files passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Lint a definition file or directory.
///
/// If `strict` is true, files with warnings count as failed.
pub fn lint(path: &Path, strict: bool) -> LintResult {
    let files = collect_json_files(path);
    let base = if path.is_dir() {
        path
    } else {
        path.parent().unwrap_or(Path::new("."))
    };

    let mut diagnostics: HashMap<PathBuf, Vec<Diagnostic>> = HashMap::new();
    let mut documents = Vec::new();
    let mut owners = Owners::default();

    for file in &files {
        let relative = file.strip_prefix(base).unwrap_or(file).to_path_buf();
        diagnostics.entry(relative.clone()).or_default();
        match load_definition(file) {
            Ok(document) => {
                owners.record(&document, &relative);
                documents.push(document);
            }
            Err(e) => diagnostics.entry(relative.clone()).or_default().push(Diagnostic {
                severity: Severity::Error,
                code: "E001".to_string(),
                file: relative,
                path: "/".to_string(),
                message: format!("cannot load definition: {}", e),
            }),
        }
    }

    let merged = SchemaDefinition::merge(documents);
    for diagnostic in check_definition(&merged, &owners) {
        diagnostics
            .entry(diagnostic.file.clone())
            .or_default()
            .push(diagnostic);
    }

    let mut results: Vec<FileResult> = diagnostics
        .into_iter()
        .map(|(file, diagnostics)| FileResult {
            status: status_of(&diagnostics),
            file,
            diagnostics,
        })
        .collect();
    results.sort_by(|a, b| a.file.cmp(&b.file));

    let total_errors = count(&results, Severity::Error);
    let total_warnings = count(&results, Severity::Warning);
    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: results.len(),
        passed: results.len() - failed,
        failed,
        errors: total_errors,
        warnings: total_warnings,
        results,
    }
}

/// Every diagnostic for one (merged) definition document.
fn check_definition(definition: &SchemaDefinition, owners: &Owners) -> Vec<Diagnostic> {
    let mut diagnostics: Vec<Diagnostic> = Registry::diagnose(definition)
        .iter()
        .map(|e| {
            let path = e.path().unwrap_or("/").to_string();
            Diagnostic {
                severity: Severity::Error,
                code: error_code(e).to_string(),
                file: owners.file_for(&path),
                path,
                message: e.to_string(),
            }
        })
        .collect();

    let declared: HashMap<&str, bool> = definition
        .resources
        .iter()
        .map(|r| (r.identifier.as_str(), r.embedded))
        .collect();

    let mut action_names = HashSet::new();
    for action in &definition.actions {
        let path = format!("actions.{}", action.name);
        let mut messages = Vec::new();
        if !action_names.insert(action.name.as_str()) {
            messages.push("action is declared more than once".to_string());
        }
        match declared.get(action.resource.as_str()) {
            None => messages.push(format!("unknown resource \"{}\"", action.resource)),
            Some(true) => {
                messages.push(format!("\"{}\" is an embedded resource", action.resource))
            }
            Some(false) => {}
        }
        for message in messages {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                code: "E007".to_string(),
                file: owners.file_for(&path),
                path: path.clone(),
                message,
            });
        }
    }

    let contained = contained_resources(definition);
    for resource in &definition.resources {
        let path = resource.identifier.clone();
        if resource.embedded && !contained.contains(resource.identifier.as_str()) {
            diagnostics.push(Diagnostic {
                severity: Severity::Warning,
                code: "W001".to_string(),
                file: owners.file_for(&path),
                path,
                message: "embedded resource is not contained by any field".to_string(),
            });
        } else if !resource.embedded && resource.primary_key.is_empty() {
            diagnostics.push(Diagnostic {
                severity: Severity::Warning,
                code: "W002".to_string(),
                file: owners.file_for(&path),
                path,
                message: "resource has no primary key".to_string(),
            });
        }
    }

    diagnostics
}

/// Which file declared each resource and action.
#[derive(Debug, Clone, Default)]
struct Owners {
    resources: HashMap<String, PathBuf>,
    actions: HashMap<String, PathBuf>,
}

impl Owners {
    fn record(&mut self, document: &SchemaDefinition, file: &Path) {
        for resource in &document.resources {
            self.resources
                .entry(resource.identifier.clone())
                .or_insert_with(|| file.to_path_buf());
        }
        for action in &document.actions {
            self.actions
                .entry(action.name.clone())
                .or_insert_with(|| file.to_path_buf());
        }
    }

    fn file_for(&self, path: &str) -> PathBuf {
        let owner = match path.strip_prefix("actions.") {
            Some(action) => self.actions.get(action),
            None => {
                let resource = path.split(['.', '(']).next().unwrap_or(path);
                self.resources.get(resource)
            }
        };
        owner.cloned().unwrap_or_default()
    }
}

/// Embedded resources some field (or union variant) contains.
fn contained_resources(definition: &SchemaDefinition) -> HashSet<&str> {
    let mut contained = HashSet::new();
    for resource in &definition.resources {
        for field in &resource.fields {
            match field {
                FieldDefinition::Embedded { resource, .. }
                | FieldDefinition::Calculation {
                    resource: Some(resource),
                    ..
                } => {
                    contained.insert(resource.as_str());
                }
                FieldDefinition::Union { variants, .. } => {
                    contained.extend(variants.iter().filter_map(|v| v.resource.as_deref()));
                }
                _ => {}
            }
        }
    }
    contained
}

fn error_code(error: &RegistryError) -> &'static str {
    match error {
        RegistryError::FileNotFound { .. }
        | RegistryError::ReadError { .. }
        | RegistryError::InvalidJson { .. } => "E001",
        RegistryError::UnmappedType { .. } => "E002",
        RegistryError::UnknownResource { .. } | RegistryError::ResourceNotFound { .. } => "E003",
        RegistryError::DuplicateResource { .. } | RegistryError::DuplicateField { .. } => "E004",
        RegistryError::InvalidAggregatePath { .. } => "E005",
        RegistryError::InvalidDefinition { .. } => "E006",
    }
}

fn status_of(diagnostics: &[Diagnostic]) -> FileStatus {
    if diagnostics.iter().any(|d| d.severity == Severity::Error) {
        FileStatus::Error
    } else if diagnostics.iter().any(|d| d.severity == Severity::Warning) {
        FileStatus::Warning
    } else {
        FileStatus::Ok
    }
}

fn count(results: &[FileResult], severity: Severity) -> usize {
    results
        .iter()
        .flat_map(|r| &r.diagnostics)
        .filter(|d| d.severity == severity)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn lint_valid_definition() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("blog.json");
        fs::write(&file, include_str!("../tests/fixtures/blog.json")).unwrap();

        let result = lint(&file, true);
        assert!(result.is_ok());
        assert_eq!(result.files_checked, 1);
        assert_eq!(result.results[0].status, FileStatus::Ok);
    }

    #[test]
    fn lint_invalid_json_syntax() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("broken.json"), "{ not valid json }").unwrap();

        let result = lint(dir.path(), false);
        assert!(!result.is_ok());
        assert_eq!(result.results[0].diagnostics[0].code, "E001");
    }

    #[test]
    fn cross_file_references_resolve() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("post.json"),
            r#"{"resources":[{"identifier":"post","primary_key":["id"],"fields":[
                {"kind":"attribute","name":"id","type":"uuid"},
                {"kind":"relationship","name":"owner","resource":"user"}]}]}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("user.json"),
            r#"{"resources":[{"identifier":"user","primary_key":["id"],"fields":[
                {"kind":"attribute","name":"id","type":"uuid"}]}]}"#,
        )
        .unwrap();

        let result = lint(dir.path(), true);
        assert!(result.is_ok());
        assert_eq!(result.passed, 2);
    }

    #[test]
    fn collects_every_error_with_its_file() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("post.json"),
            r#"{"resources":[{"identifier":"post","primary_key":["id"],"fields":[
                {"kind":"attribute","name":"id","type":"uuid"},
                {"kind":"attribute","name":"rating","type":"tuple"},
                {"kind":"relationship","name":"owner","resource":"account"}]}],
              "actions":[{"name":"list_things","resource":"thing","kind":"read"}]}"#,
        )
        .unwrap();

        let result = lint(dir.path(), false);
        assert_eq!(result.errors, 3);
        let codes: Vec<_> = result.results[0]
            .diagnostics
            .iter()
            .map(|d| d.code.as_str())
            .collect();
        assert!(codes.contains(&"E002"));
        assert!(codes.contains(&"E003"));
        assert!(codes.contains(&"E007"));
        assert!(result.results[0]
            .diagnostics
            .iter()
            .all(|d| d.file == Path::new("post.json")));
    }

    #[test]
    fn duplicate_action_names() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("defs.json"),
            r#"{"resources":[{"identifier":"post","primary_key":["id"],"fields":[
                {"kind":"attribute","name":"id","type":"uuid"}]}],
              "actions":[
                {"name":"list_posts","resource":"post","kind":"read"},
                {"name":"list_posts","resource":"post","kind":"get"}]}"#,
        )
        .unwrap();

        let result = lint(dir.path(), true);
        assert!(!result.is_ok());
        assert_eq!(result.errors, 1);
        let diagnostic = &result.results[0].diagnostics[0];
        assert_eq!(diagnostic.code, "E007");
        assert_eq!(diagnostic.path, "actions.list_posts");
        assert_eq!(diagnostic.message, "action is declared more than once");
    }

    #[test]
    fn warnings_fail_only_in_strict_mode() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("defs.json"),
            r#"{"resources":[
                {"identifier":"post","fields":[{"kind":"attribute","name":"id","type":"uuid"}]},
                {"identifier":"orphan","embedded":true,"fields":[]}]}"#,
        )
        .unwrap();

        let result = lint(dir.path(), false);
        assert!(result.is_ok());
        assert_eq!(result.warnings, 2);
        assert_eq!(result.failed, 0);

        let result = lint(dir.path(), true);
        assert_eq!(result.failed, 1);
    }
}
