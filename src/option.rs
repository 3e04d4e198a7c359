//! Normalized option tree.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::types::{OptionType, NON_REQUEST_PARAMS};

/// Options keyed by their case-converted name, in schema order.
pub type OptionTree = IndexMap<String, OptionNode>;

/// One canonical, documented, typed option.
///
/// The struct has no slot for `enum`, `const`, `properties`, `items` or
/// `oneOf`, so a normalized tree cannot carry them. The only schema keyword that
/// can survive is `$ref`, and only as the marker of a reference that failed
/// to resolve.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OptionNode {
    #[serde(
        default,
        deserialize_with = "sentences",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub description: Vec<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub option_type: Option<OptionType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<OptionType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suboptions: Option<OptionTree>,

    /// Target of a `$ref` that could not be resolved.
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub unresolved: Option<String>,

    /// Keys with no canonical meaning, passed through case-converted.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl OptionNode {
    pub fn new(option_type: OptionType) -> Self {
        Self {
            option_type: Some(option_type),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, sentence: impl Into<String>) -> Self {
        self.description.push(sentence.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_choices<I, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_elements(mut self, elements: OptionType) -> Self {
        self.elements = Some(elements);
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Child options, or an empty iterator for leaves.
    pub fn children(&self) -> impl Iterator<Item = (&String, &OptionNode)> {
        self.suboptions.iter().flat_map(|tree| tree.iter())
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Accept a description as a single string or a list of sentences.
pub(crate) fn sentences<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Sentences {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Sentences::deserialize(deserializer)? {
        Sentences::One(s) => vec![s],
        Sentences::Many(v) => v,
    })
}

/// The option tree without documentation, ready to be rendered as an
/// argument specification.
pub fn argument_spec(tree: &OptionTree) -> OptionTree {
    tree.iter()
        .map(|(name, node)| {
            let mut node = node.clone();
            node.description.clear();
            node.suboptions = node.suboptions.as_ref().map(argument_spec);
            (name.clone(), node)
        })
        .collect()
}

/// Top-level option names forwarded to the resource API request body.
pub fn request_params(tree: &OptionTree) -> Vec<String> {
    let mut params: Vec<String> = tree
        .keys()
        .filter(|key| !NON_REQUEST_PARAMS.contains(&key.as_str()))
        .cloned()
        .collect();
    params.sort();
    params
}

/// Visit every option depth-first with its slash-separated path.
pub fn walk<F: FnMut(&str, &OptionNode)>(tree: &OptionTree, f: &mut F) {
    walk_inner(tree, "", f);
}

fn walk_inner<F: FnMut(&str, &OptionNode)>(tree: &OptionTree, prefix: &str, f: &mut F) {
    for (name, node) in tree {
        let path = format!("{}/{}", prefix, name);
        f(&path, node);
        if let Some(children) = &node.suboptions {
            walk_inner(children, &path, f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_tree() -> OptionTree {
        let mut tags = OptionTree::new();
        tags.insert(
            "key".to_string(),
            OptionNode::new(OptionType::Str)
                .with_description("The key name of the tag.")
                .with_required(true),
        );

        let mut tree = OptionTree::new();
        tree.insert(
            "tags".to_string(),
            OptionNode {
                suboptions: Some(tags),
                ..OptionNode::new(OptionType::List)
                    .with_elements(OptionType::Dict)
                    .with_description("Tags.")
            },
        );
        tree.insert(
            "wait".to_string(),
            OptionNode::new(OptionType::Bool).with_default(false),
        );
        tree.insert(
            "kms_key_id".to_string(),
            OptionNode::new(OptionType::Str),
        );
        tree
    }

    #[test]
    fn serializes_canonical_keys_only() {
        let node = OptionNode::new(OptionType::Int)
            .with_description("Days.")
            .with_choices([1, 3]);
        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({ "description": ["Days."], "type": "int", "choices": [1, 3] })
        );
    }

    #[test]
    fn required_false_is_omitted() {
        let value = serde_json::to_value(OptionNode::new(OptionType::Str)).unwrap();
        assert!(value.get("required").is_none());
    }

    #[test]
    fn deserializes_string_description() {
        let node: OptionNode = serde_json::from_value(json!({
            "description": "One sentence.",
            "type": "string",
            "aliases": ["resource_tags"]
        }))
        .unwrap();
        assert_eq!(node.description, vec!["One sentence."]);
        assert_eq!(node.option_type, Some(OptionType::Str));
        assert_eq!(node.extra["aliases"], json!(["resource_tags"]));
    }

    #[test]
    fn argument_spec_strips_descriptions_recursively() {
        let spec = argument_spec(&sample_tree());
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(
            value["tags"],
            json!({
                "type": "list",
                "elements": "dict",
                "suboptions": { "key": { "type": "str", "required": true } }
            })
        );
    }

    #[test]
    fn request_params_exclude_standard_options() {
        assert_eq!(request_params(&sample_tree()), vec!["kms_key_id", "tags"]);
    }

    #[test]
    fn walk_visits_nested_paths() {
        let mut paths = Vec::new();
        walk(&sample_tree(), &mut |path, _| paths.push(path.to_string()));
        assert_eq!(paths, vec!["/tags", "/tags/key", "/wait", "/kms_key_id"]);
    }
}
