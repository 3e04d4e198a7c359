//! Schema loading from files and strings.

use std::path::Path;

use serde_json::Value;

use crate::document::ResourceSchema;
use crate::error::NormalizeError;

/// Load a JSON document from a file path.
///
/// # Errors
///
/// Returns `NormalizeError::FileNotFound` if the file doesn't exist,
/// or `NormalizeError::InvalidJson` if the file isn't valid JSON.
pub fn load_schema(path: &Path) -> Result<Value, NormalizeError> {
    if !path.exists() {
        return Err(NormalizeError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| NormalizeError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    load_schema_str(&content)
}

/// Load a JSON document from a string.
///
/// # Errors
///
/// Returns `NormalizeError::InvalidJson` if the string isn't valid JSON.
pub fn load_schema_str(content: &str) -> Result<Value, NormalizeError> {
    serde_json::from_str(content).map_err(|source| NormalizeError::InvalidJson { source })
}

/// Load and type a resource schema file.
///
/// # Errors
///
/// IO and JSON errors as for [`load_schema`], plus
/// `NormalizeError::InvalidDocument` when the top-level fields have the wrong
/// shape (e.g. a missing `typeName`).
pub fn load_resource_schema(path: &Path) -> Result<ResourceSchema, NormalizeError> {
    let value = load_schema(path)?;
    parse_resource_schema(value)
}

/// Type an already-parsed resource schema.
///
/// # Errors
///
/// Returns `NormalizeError::InvalidDocument` when the top-level fields have
/// the wrong shape.
pub fn parse_resource_schema(value: Value) -> Result<ResourceSchema, NormalizeError> {
    serde_json::from_value(value).map_err(|source| NormalizeError::InvalidDocument { source })
}
