//! Parsed schema tree.
//!
//! Raw JSON is discriminated once, at parse time, into [`SchemaNode`]. Any
//! mapping carrying a string `$ref` becomes a [`SchemaNode::Reference`] so the
//! normalizer can match on references instead of probing maps for keys.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::NormalizeError;
use crate::types::json_type_name;

/// One node of a raw resource schema.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// String, number, boolean or null.
    Scalar(Value),
    List(Vec<SchemaNode>),
    /// A mapping with a `$ref`. Sibling keys are kept as the overlay.
    Reference {
        target: String,
        overlay: IndexMap<String, SchemaNode>,
    },
    Object(IndexMap<String, SchemaNode>),
}

impl SchemaNode {
    /// Parse a JSON value.
    ///
    /// # Errors
    ///
    /// Returns `NormalizeError::Malformed` when a `$ref` is not a string.
    pub fn parse(value: &Value) -> Result<Self, NormalizeError> {
        parse_at(value, "")
    }

    /// Parse every entry of a JSON object, keeping key order.
    pub fn parse_map(
        map: &Map<String, Value>,
        path: &str,
    ) -> Result<IndexMap<String, SchemaNode>, NormalizeError> {
        let mut entries = IndexMap::with_capacity(map.len());
        for (key, child) in map {
            entries.insert(key.clone(), parse_at(child, &format!("{}/{}", path, key))?);
        }
        Ok(entries)
    }

    /// Convert back to JSON.
    pub fn to_value(&self) -> Value {
        match self {
            SchemaNode::Scalar(value) => value.clone(),
            SchemaNode::List(items) => Value::Array(items.iter().map(Self::to_value).collect()),
            SchemaNode::Reference { target, overlay } => {
                let mut map = Map::new();
                map.insert("$ref".to_string(), Value::String(target.clone()));
                for (key, child) in overlay {
                    map.insert(key.clone(), child.to_value());
                }
                Value::Object(map)
            }
            SchemaNode::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, child)| (key.clone(), child.to_value()))
                    .collect(),
            ),
        }
    }

    /// Look up a key on an object or on a reference's overlay.
    pub fn get(&self, key: &str) -> Option<&SchemaNode> {
        match self {
            SchemaNode::Object(entries) | SchemaNode::Reference { overlay: entries, .. } => {
                entries.get(key)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SchemaNode::Scalar(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Type name for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            SchemaNode::Scalar(value) => json_type_name(value),
            SchemaNode::List(_) => "array",
            SchemaNode::Reference { .. } => "reference",
            SchemaNode::Object(_) => "object",
        }
    }
}

fn parse_at(value: &Value, path: &str) -> Result<SchemaNode, NormalizeError> {
    match value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| parse_at(item, &format!("{}/{}", path, i)))
            .collect::<Result<Vec<_>, _>>()
            .map(SchemaNode::List),
        Value::Object(map) => {
            let mut entries = IndexMap::with_capacity(map.len());
            let mut target = None;

            for (key, child) in map {
                let child_path = format!("{}/{}", path, key);
                if key == "$ref" {
                    match child {
                        Value::String(s) => target = Some(s.clone()),
                        other => {
                            return Err(NormalizeError::Malformed {
                                path: child_path,
                                expected: "string",
                                actual: json_type_name(other).to_string(),
                            })
                        }
                    }
                    continue;
                }
                entries.insert(key.clone(), parse_at(child, &child_path)?);
            }

            Ok(match target {
                Some(target) => SchemaNode::Reference {
                    target,
                    overlay: entries,
                },
                None => SchemaNode::Object(entries),
            })
        }
        scalar => Ok(SchemaNode::Scalar(scalar.clone())),
    }
}

/// Named definitions a `$ref` can point at.
///
/// Read-only for the duration of a pass; passes over different roots can share
/// one table across threads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefinitionTable {
    entries: IndexMap<String, SchemaNode>,
}

impl DefinitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table from a schema's `definitions` object.
    ///
    /// `null` yields an empty table.
    ///
    /// # Errors
    ///
    /// Returns `NormalizeError::Malformed` if `definitions` is not an object or
    /// a definition contains a malformed `$ref`.
    pub fn from_value(definitions: &Value) -> Result<Self, NormalizeError> {
        match definitions {
            Value::Null => Ok(Self::new()),
            Value::Object(map) => Self::from_map(map),
            other => Err(NormalizeError::Malformed {
                path: "/definitions".to_string(),
                expected: "object",
                actual: json_type_name(other).to_string(),
            }),
        }
    }

    pub fn from_map(map: &Map<String, Value>) -> Result<Self, NormalizeError> {
        Ok(Self {
            entries: SchemaNode::parse_map(map, "/definitions")?,
        })
    }

    pub fn insert(&mut self, name: impl Into<String>, node: SchemaNode) {
        self.entries.insert(name.into(), node);
    }

    pub fn get(&self, name: &str) -> Option<&SchemaNode> {
        self.entries.get(name)
    }

    /// Resolve a `$ref` to its definition name and node.
    pub fn lookup(&self, reference: &str) -> Option<(&str, &SchemaNode)> {
        let name = definition_name(reference)?;
        self.entries
            .get_key_value(name)
            .map(|(name, node)| (name.as_str(), node))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, SchemaNode)> for DefinitionTable {
    fn from_iter<I: IntoIterator<Item = (String, SchemaNode)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Definition name targeted by a reference of the form `.../definitions/<name>`
/// (or `.../$defs/<name>`).
pub fn definition_name(reference: &str) -> Option<&str> {
    let (_, name) = reference
        .rsplit_once("/definitions/")
        .or_else(|| reference.rsplit_once("/$defs/"))?;
    let name = name.trim();
    (!name.is_empty() && !name.contains('/')).then_some(name)
}
