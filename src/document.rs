//! Typed view of a resource-provider schema document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::naming::{module_name, property_path};

/// Handler names that make a resource manageable through `state`.
pub const LIFECYCLE_HANDLERS: &[&str] = &["create", "read", "update", "delete", "list"];

/// Top-level resource schema.
///
/// `properties` and `definitions` stay raw JSON; they are parsed into
/// [`crate::SchemaNode`] trees by the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSchema {
    pub type_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub properties: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub definitions: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_identifier: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub read_only_properties: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub create_only_properties: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub write_only_properties: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taggable: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagging: Option<Tagging>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handlers: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tagging {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taggable: Option<bool>,
}

impl ResourceSchema {
    /// Module name derived from the type name.
    pub fn module_name(&self) -> String {
        module_name(&self.type_name)
    }

    /// `tagging.taggable` when present, else the legacy top-level flag.
    pub fn is_taggable(&self) -> bool {
        self.tagging
            .as_ref()
            .and_then(|tagging| tagging.taggable)
            .or(self.taggable)
            .unwrap_or(false)
    }

    /// False only when a `handlers` object is declared and names no
    /// lifecycle handler.
    pub fn has_lifecycle(&self) -> bool {
        match &self.handlers {
            None => true,
            Some(handlers) => LIFECYCLE_HANDLERS.iter().any(|h| handlers.contains_key(*h)),
        }
    }

    /// Case-converted primary identifier components, e.g. `["log_group_name"]`.
    pub fn identifier_options(&self) -> Vec<String> {
        options_for(&self.primary_identifier)
    }

    /// Case-converted read-only property names.
    pub fn read_only_options(&self) -> Vec<String> {
        options_for(&self.read_only_properties)
    }

    /// Case-converted create-only property names.
    pub fn create_only_options(&self) -> Vec<String> {
        options_for(&self.create_only_properties)
    }
}

/// Last option segment of each pointer; entries that yield nothing are dropped.
fn options_for(pointers: &[String]) -> Vec<String> {
    pointers
        .iter()
        .filter_map(|pointer| property_path(pointer).pop())
        .collect()
}

/// Slash-joined option path for a property pointer, or `None` when the pointer
/// names no property.
pub fn option_path(pointer: &str) -> Option<String> {
    let segments = property_path(pointer);
    if segments.is_empty() {
        None
    } else {
        Some(format!("/{}", segments.join("/")))
    }
}
