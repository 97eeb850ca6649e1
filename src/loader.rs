//! Loading definition documents and JSON inputs from files and strings.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::definition::SchemaDefinition;
use crate::error::RegistryError;

/// Load a JSON value from a file path.
///
/// # Errors
///
/// Returns `RegistryError::FileNotFound` if the file doesn't exist,
/// or `RegistryError::InvalidJson` if the file isn't valid JSON.
pub fn load_json(path: &Path) -> Result<Value, RegistryError> {
    let content = read_file(path)?;
    load_json_str(&content)
}

/// Load a JSON value from a string.
pub fn load_json_str(content: &str) -> Result<Value, RegistryError> {
    serde_json::from_str(content).map_err(|source| RegistryError::InvalidJson { source })
}

/// Load a definition document from a file path.
///
/// A directory loads every `.json` file beneath it (sorted by path) and
/// merges them into one document.
pub fn load_definition(path: &Path) -> Result<SchemaDefinition, RegistryError> {
    if path.is_dir() {
        let documents = collect_json_files(path)
            .iter()
            .map(|file| load_definition(file))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(SchemaDefinition::merge(documents));
    }

    let content = read_file(path)?;
    load_definition_str(&content)
}

/// Load a definition document from a JSON string.
pub fn load_definition_str(content: &str) -> Result<SchemaDefinition, RegistryError> {
    serde_json::from_str(content).map_err(|source| RegistryError::InvalidJson { source })
}

/// Collect all .json files in a path (file or directory), sorted.
pub fn collect_json_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            return vec![path.to_path_buf()];
        }
        return vec![];
    }

    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(path) {
        for entry in entries.flatten() {
            let entry_path = entry.path();
            if entry_path.is_dir() {
                files.extend(collect_json_files(&entry_path));
            } else if entry_path.extension().map(|e| e == "json").unwrap_or(false) {
                files.push(entry_path);
            }
        }
    }
    files.sort();
    files
}

fn read_file(path: &Path) -> Result<String, RegistryError> {
    if !path.exists() {
        return Err(RegistryError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    std::fs::read_to_string(path).map_err(|source| RegistryError::ReadError {
        path: path.to_path_buf(),
        source,
    })
}
