//! Core types and constants for schema normalization.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Schema-only presentation keys removed from every option.
pub const SCRUBBED_KEYS: &[&str] = &[
    "additionalProperties",
    "insertionOrder",
    "uniqueItems",
    "pattern",
    "patternProperties",
    "examples",
    "minLength",
    "maxLength",
    "minItems",
    "maxItems",
    "minProperties",
    "maxProperties",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "multipleOf",
    "format",
    "$comment",
    "$schema",
    "$id",
    "title",
    "arrayType",
    "relationshipRef",
];

/// Option keys that are never forwarded to the resource API request body.
pub const NON_REQUEST_PARAMS: &[&str] = &["wait", "wait_timeout", "state", "purge_tags", "force"];

/// Sentence inserted where a schema node carries no description.
pub const PLACEHOLDER_DESCRIPTION: &str = "Not Provided.";

/// Default nesting limit for one normalization pass.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Canonical option type.
///
/// Serialized as its short name (`str`, `int`, ...). Unrecognized schema type
/// names are carried through unchanged as [`OptionType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OptionType {
    Str,
    Int,
    Bool,
    Float,
    List,
    Dict,
    Other(String),
}

impl OptionType {
    /// Translate a raw schema type name.
    ///
    /// Already-canonical names map to themselves so a normalized tree can be
    /// normalized again without change.
    pub fn from_schema(name: &str) -> Self {
        match name {
            "string" | "str" => OptionType::Str,
            "integer" | "number" | "int" => OptionType::Int,
            "boolean" | "bool" => OptionType::Bool,
            "float" => OptionType::Float,
            "array" | "list" => OptionType::List,
            "object" | "dict" => OptionType::Dict,
            other => OptionType::Other(other.to_string()),
        }
    }

    /// Returns the canonical short name.
    pub fn as_str(&self) -> &str {
        match self {
            OptionType::Str => "str",
            OptionType::Int => "int",
            OptionType::Bool => "bool",
            OptionType::Float => "float",
            OptionType::List => "list",
            OptionType::Dict => "dict",
            OptionType::Other(name) => name,
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for OptionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OptionType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(OptionType::from_schema(&name))
    }
}

/// Options for one normalization pass.
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Maximum option nesting before a subtree is truncated.
    pub max_depth: usize,
    /// Keys dropped from every node.
    pub scrubbed_keys: BTreeSet<String>,
    /// Drop read-only properties that are not part of the primary identifier.
    pub elide_read_only: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            scrubbed_keys: SCRUBBED_KEYS.iter().map(|k| k.to_string()).collect(),
            elide_read_only: true,
        }
    }
}

impl NormalizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the nesting limit.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Scrub an additional key.
    pub fn scrub(mut self, key: impl Into<String>) -> Self {
        self.scrubbed_keys.insert(key.into());
        self
    }

    /// Keep read-only properties in the option tree.
    pub fn elide_read_only(mut self, elide: bool) -> Self {
        self.elide_read_only = elide;
        self
    }

    pub(crate) fn is_scrubbed(&self, key: &str) -> bool {
        self.scrubbed_keys.contains(key)
    }
}
