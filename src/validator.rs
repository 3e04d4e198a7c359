//! Resource schema document validation against the provider-definition
//! meta-schema.

use once_cell::sync::Lazy;
use serde_json::{json, Value};

use crate::error::{SchemaError, ValidateError};

/// The subset of the provider-definition meta-schema the generator relies on.
static META_SCHEMA: Lazy<Value> = Lazy::new(|| {
    let pointers = json!({
        "type": "array",
        "items": { "type": "string", "pattern": "^/properties/" }
    });
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "required": ["typeName", "properties"],
        "properties": {
            "typeName": {
                "type": "string",
                "pattern": "^[A-Za-z0-9]{2,64}::[A-Za-z0-9]{2,64}::[A-Za-z0-9]{2,64}$"
            },
            "description": { "type": "string" },
            "properties": {
                "type": "object",
                "minProperties": 1,
                "additionalProperties": { "type": "object" }
            },
            "definitions": {
                "type": "object",
                "additionalProperties": { "type": "object" }
            },
            "required": {
                "type": "array",
                "items": { "type": "string" }
            },
            "primaryIdentifier": pointers.clone(),
            "readOnlyProperties": pointers.clone(),
            "createOnlyProperties": pointers.clone(),
            "writeOnlyProperties": pointers,
            "taggable": { "type": "boolean" },
            "tagging": {
                "type": "object",
                "properties": { "taggable": { "type": "boolean" } }
            },
            "handlers": {
                "type": "object",
                "propertyNames": {
                    "enum": ["create", "read", "update", "delete", "list"]
                }
            }
        }
    })
});

/// The embedded meta-schema.
pub fn meta_schema() -> &'static Value {
    &META_SCHEMA
}

/// Validate a resource schema document.
///
/// Every violation is collected with the JSON Pointer of the offending value.
///
/// # Errors
///
/// Returns `ValidateError::Invalid` listing the violations, or
/// `ValidateError::InvalidMetaSchema` if the meta-schema fails to compile.
pub fn validate_document(document: &Value) -> Result<(), ValidateError> {
    validate_against_schema(meta_schema(), document)
}

/// Validate a document against an arbitrary schema.
pub fn validate_against_schema(schema: &Value, document: &Value) -> Result<(), ValidateError> {
    let validator = jsonschema::validator_for(schema).map_err(|e| {
        ValidateError::InvalidMetaSchema {
            message: e.to_string(),
        }
    })?;

    let errors: Vec<SchemaError> = validator
        .iter_errors(document)
        .map(|e| SchemaError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { errors })
    }
}
