//! Error types for schema normalization, validation and module configuration.
//!
//! Fatal conditions are `Err` values. Per-option problems found during a
//! normalization pass are [`Defect`]s: they are collected and returned next to
//! the (degraded) output instead of aborting the pass.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Errors that abort loading or normalizing a schema.
#[derive(Debug, Error)]
pub enum NormalizeError {
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

    #[error("invalid resource schema document: {source}")]
    InvalidDocument {
        #[source]
        source: serde_json::Error,
    },

    // Schema errors (exit code 2)
    #[error("malformed schema at {path}: expected {expected}, got {actual}")]
    Malformed {
        path: String,
        expected: &'static str,
        actual: String,
    },
}

impl NormalizeError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            NormalizeError::FileNotFound { .. } | NormalizeError::ReadError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors during meta-schema validation of a resource schema document.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("meta-schema failed to compile: {message}")]
    InvalidMetaSchema { message: String },

    #[error("validation failed with {} error(s)", errors.len())]
    Invalid { errors: Vec<SchemaError> },
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Normalize(e) => e.exit_code(),
            ValidateError::InvalidMetaSchema { .. } => 2,
            ValidateError::Invalid { .. } => 1,
        }
    }
}

/// Single validation error with path context.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaError {
    /// JSON Pointer (RFC 6901) to the offending value.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Errors while loading the module configuration table.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML: {source}")]
    InvalidYaml {
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config entry: {message}")]
    InvalidEntry { message: String },
}

impl ConfigError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConfigError::FileNotFound { .. } | ConfigError::ReadError { .. } => 3,
            _ => 2,
        }
    }
}

/// A non-fatal problem recorded while normalizing one option.
///
/// The affected option is degraded (left partially normalized, or dropped for
/// collisions) and the rest of the tree keeps normalizing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Defect {
    #[error("{path}: unresolvable reference {reference}")]
    UnresolvableRef { path: String, reference: String },

    #[error("{path}: reference cycle through {reference}")]
    RefCycle { path: String, reference: String },

    #[error("{path}: required entry \"{name}\" names no suboption")]
    UnknownRequired { path: String, name: String },

    #[error("{path}: choices mix incomparable types, declaration order kept")]
    AmbiguousSort { path: String },

    #[error("{path}: \"{source_name}\" collides with an existing option after case conversion")]
    NameCollision { path: String, source_name: String },

    #[error("{path}: nesting deeper than {limit} levels, subtree truncated")]
    DepthExceeded { path: String, limit: usize },
}

impl Defect {
    /// Option path the defect was recorded at.
    pub fn path(&self) -> &str {
        match self {
            Defect::UnresolvableRef { path, .. }
            | Defect::RefCycle { path, .. }
            | Defect::UnknownRequired { path, .. }
            | Defect::AmbiguousSort { path }
            | Defect::NameCollision { path, .. }
            | Defect::DepthExceeded { path, .. } => path,
        }
    }
}
