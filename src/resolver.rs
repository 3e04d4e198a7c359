//! Reference resolution and shape normalization.
//!
//! Walks a parsed property map, expands `$ref`s against a [`DefinitionTable`]
//! and collapses the schema dialect (`enum`, `const`, `oneOf`, `items`,
//! `properties`, `required` lists) into a fresh [`OptionTree`]. The input tree
//! and the definitions are never mutated.
//!
//! Per-option problems become [`Defect`]s and the pass keeps going; only
//! malformed structure aborts it.

use std::cmp::Ordering;
use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use crate::description::split_sentences;
use crate::document::{option_path, ResourceSchema};
use crate::error::{Defect, NormalizeError};
use crate::naming::camel_to_snake;
use crate::node::{DefinitionTable, SchemaNode};
use crate::option::{OptionNode, OptionTree};
use crate::types::{NormalizeOptions, OptionType};

/// Schema keywords of a `oneOf` alternative that are never property names.
const ALTERNATIVE_KEYWORDS: &[&str] = &[
    "required",
    "type",
    "description",
    "properties",
    "items",
    "enum",
    "const",
    "default",
    "definitions",
    "$defs",
    "dependencies",
    "oneOf",
    "anyOf",
    "allOf",
    "not",
    "if",
    "then",
    "else",
];

/// Output of one normalization pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub options: OptionTree,
    /// Non-fatal problems, in the order they were found, without duplicates.
    pub defects: Vec<Defect>,
}

/// Normalize a property map with default options.
///
/// `root` is the schema's `properties` object, parsed.
///
/// # Errors
///
/// Returns `NormalizeError::Malformed` if a node has the wrong JSON shape for
/// its key (e.g. a property that is not an object, a non-list `enum`).
pub fn normalize(
    root: &SchemaNode,
    definitions: &DefinitionTable,
) -> Result<Normalized, NormalizeError> {
    normalize_with(root, definitions, &NormalizeOptions::default())
}

/// Normalize a property map.
///
/// # Errors
///
/// See [`normalize`].
pub fn normalize_with(
    root: &SchemaNode,
    definitions: &DefinitionTable,
    options: &NormalizeOptions,
) -> Result<Normalized, NormalizeError> {
    let entries = match root {
        SchemaNode::Object(entries) => entries,
        other => {
            return Err(NormalizeError::Malformed {
                path: "/".to_string(),
                expected: "object",
                actual: other.kind().to_string(),
            })
        }
    };

    let mut pass = Pass::new(definitions, options, HashSet::new());
    let tree = pass.properties(entries, "", 0)?;
    Ok(pass.finish(tree))
}

/// Normalize a whole resource schema.
///
/// Read-only properties outside the primary identifier are elided first (when
/// enabled), then the document's top-level `required` list marks options as
/// required. Required names that were elided are skipped.
///
/// # Errors
///
/// See [`normalize`].
pub fn normalize_schema(
    schema: &ResourceSchema,
    options: &NormalizeOptions,
) -> Result<Normalized, NormalizeError> {
    let definitions = DefinitionTable::from_map(&schema.definitions)?;
    let root = SchemaNode::parse_map(&schema.properties, "/properties")?;

    let elided = if options.elide_read_only {
        elided_paths(schema)
    } else {
        HashSet::new()
    };

    let mut pass = Pass::new(&definitions, options, elided);
    let mut tree = pass.properties(&root, "", 0)?;
    pass.mark_required(&mut tree, &schema.required, "");

    let normalized = pass.finish(tree);
    debug!(
        type_name = %schema.type_name,
        options = normalized.options.len(),
        defects = normalized.defects.len(),
        "normalized resource schema"
    );
    Ok(normalized)
}

/// Option paths of read-only properties that are not part of the identifier.
fn elided_paths(schema: &ResourceSchema) -> HashSet<String> {
    let identifiers: HashSet<String> = schema
        .primary_identifier
        .iter()
        .filter_map(|pointer| option_path(pointer))
        .collect();

    schema
        .read_only_properties
        .iter()
        .filter_map(|pointer| option_path(pointer))
        .filter(|path| !identifiers.contains(path))
        .collect()
}

/// A node with its references expanded.
struct Expanded {
    fields: IndexMap<String, SchemaNode>,
    unresolved: Option<String>,
}

/// State of one pass over one root.
struct Pass<'a> {
    definitions: &'a DefinitionTable,
    options: &'a NormalizeOptions,
    elided: HashSet<String>,
    /// Definition names being expanded on the current path.
    active: Vec<String>,
    defects: Vec<Defect>,
}

impl<'a> Pass<'a> {
    fn new(
        definitions: &'a DefinitionTable,
        options: &'a NormalizeOptions,
        elided: HashSet<String>,
    ) -> Self {
        Self {
            definitions,
            options,
            elided,
            active: Vec::new(),
            defects: Vec::new(),
        }
    }

    fn finish(self, options: OptionTree) -> Normalized {
        let mut seen = HashSet::new();
        let defects = self
            .defects
            .into_iter()
            .filter(|defect| seen.insert(defect.clone()))
            .collect();
        Normalized { options, defects }
    }

    fn record(&mut self, defect: Defect) {
        warn!(%defect, "normalization defect");
        self.defects.push(defect);
    }

    /// Normalize a property map into options named by case conversion.
    fn properties(
        &mut self,
        entries: &IndexMap<String, SchemaNode>,
        path: &str,
        depth: usize,
    ) -> Result<OptionTree, NormalizeError> {
        let mut tree = OptionTree::with_capacity(entries.len());

        for (source_name, node) in entries {
            let name = camel_to_snake(source_name);
            let child_path = format!("{}/{}", path, name);

            if self.elided.contains(&child_path) {
                debug!(path = %child_path, "eliding read-only property");
                continue;
            }
            if tree.contains_key(&name) {
                self.record(Defect::NameCollision {
                    path: child_path,
                    source_name: source_name.clone(),
                });
                continue;
            }

            let option = self.option(node, &child_path, depth + 1)?;
            tree.insert(name, option);
        }

        Ok(tree)
    }

    /// Normalize one property node.
    fn option(
        &mut self,
        node: &SchemaNode,
        path: &str,
        depth: usize,
    ) -> Result<OptionNode, NormalizeError> {
        if depth > self.options.max_depth {
            self.record(Defect::DepthExceeded {
                path: path.to_string(),
                limit: self.options.max_depth,
            });
            return Ok(OptionNode::default());
        }

        let mark = self.active.len();
        let result = self
            .expand(node, path)
            .and_then(|expanded| self.build(expanded, path, depth));
        self.active.truncate(mark);
        result
    }

    /// Follow a reference chain, merging each overlay over its target.
    ///
    /// Expanded definition names stay on the active path until the caller
    /// truncates it, so references inside the expanded subtree see them.
    fn expand(&mut self, node: &SchemaNode, path: &str) -> Result<Expanded, NormalizeError> {
        let (mut target, mut overlay) = match node {
            SchemaNode::Object(entries) => {
                return Ok(Expanded {
                    fields: entries.clone(),
                    unresolved: None,
                })
            }
            SchemaNode::Reference { target, overlay } => (target.clone(), overlay.clone()),
            other => {
                return Err(NormalizeError::Malformed {
                    path: path.to_string(),
                    expected: "object",
                    actual: other.kind().to_string(),
                })
            }
        };

        let definitions = self.definitions;
        loop {
            let Some((name, definition)) = definitions.lookup(&target) else {
                self.record(Defect::UnresolvableRef {
                    path: path.to_string(),
                    reference: target.clone(),
                });
                return Ok(Expanded {
                    fields: overlay,
                    unresolved: Some(target),
                });
            };

            if self.active.iter().any(|active| active == name) {
                self.record(Defect::RefCycle {
                    path: path.to_string(),
                    reference: target.clone(),
                });
                return Ok(Expanded {
                    fields: overlay,
                    unresolved: Some(target),
                });
            }
            self.active.push(name.to_string());

            match definition {
                SchemaNode::Object(entries) => {
                    return Ok(Expanded {
                        fields: merge(overlay, entries, path)?,
                        unresolved: None,
                    })
                }
                SchemaNode::Reference {
                    target: next,
                    overlay: inner,
                } => {
                    overlay = merge(overlay, inner, path)?;
                    target = next.clone();
                }
                other => {
                    return Err(NormalizeError::Malformed {
                        path: format!("/definitions/{}", name),
                        expected: "object",
                        actual: other.kind().to_string(),
                    })
                }
            }
        }
    }

    /// Build the option from expanded fields.
    fn build(
        &mut self,
        expanded: Expanded,
        path: &str,
        depth: usize,
    ) -> Result<OptionNode, NormalizeError> {
        let Expanded { fields, unresolved } = expanded;
        let mut option = OptionNode {
            unresolved,
            ..OptionNode::default()
        };
        let mut suboptions: Option<OptionTree> = None;
        let mut required_names: Vec<String> = Vec::new();
        let mut constant: Option<Value> = None;
        let mut items: Option<&SchemaNode> = None;
        let mut all_of: Option<&SchemaNode> = None;

        for (key, value) in &fields {
            let key_path = format!("{}/{}", path, key);
            match key.as_str() {
                "description" => option.description = description_sentences(value, &key_path)?,
                "type" => option.option_type = Some(schema_type(value, &key_path)?),
                "elements" => option.elements = Some(schema_type(value, &key_path)?),
                "enum" | "choices" => option.choices = Some(self.choices(value, path, &key_path)?),
                "const" => constant = Some(value.to_value()),
                "default" => option.default = Some(value.to_value()),
                "properties" | "suboptions" => {
                    let entries = expect_object(value, &key_path)?;
                    let tree = self.properties(entries, path, depth)?;
                    union(&mut suboptions, tree);
                }
                "oneOf" | "anyOf" => {
                    let tree = self.one_of(value, path, &key_path, depth)?;
                    union(&mut suboptions, tree);
                }
                "allOf" => all_of = Some(value),
                "items" => items = Some(value),
                "required" => {
                    if let Some(flag) = required_list(value, &key_path, &mut required_names)? {
                        option.required = flag;
                    }
                }
                // Validation-only keywords
                "not" | "if" | "then" | "else" | "dependencies" | "definitions" | "$defs" => {}
                key if self.options.is_scrubbed(key) => {}
                _ => {
                    option
                        .extra
                        .insert(camel_to_snake(key), snake_keys(value.to_value()));
                }
            }
        }

        if let Some(value) = constant {
            option.default = Some(value);
        }
        if let Some(parts) = all_of {
            let key_path = format!("{}/allOf", path);
            self.all_of(
                &mut option,
                &mut suboptions,
                &mut required_names,
                parts,
                path,
                &key_path,
                depth,
            )?;
        }
        if let Some(items) = items {
            self.hoist_items(&mut option, &mut suboptions, items, path, depth)?;
        }
        let mut tree = suboptions.unwrap_or_default();
        self.mark_required(&mut tree, &required_names, path);
        if !tree.is_empty() {
            option.suboptions = Some(tree);
        }

        Ok(option)
    }

    /// Set `required` on the named children of `tree`.
    fn mark_required(&mut self, tree: &mut OptionTree, names: &[String], path: &str) {
        for name in names {
            let option_name = camel_to_snake(name);
            if let Some(child) = tree.get_mut(&option_name) {
                child.required = true;
            } else if !self.elided.contains(&format!("{}/{}", path, option_name)) {
                self.record(Defect::UnknownRequired {
                    path: if path.is_empty() { "/".to_string() } else { path.to_string() },
                    name: name.clone(),
                });
            }
        }
    }

    /// Fold a list's `items` schema into the list option itself.
    fn hoist_items(
        &mut self,
        option: &mut OptionNode,
        suboptions: &mut Option<OptionTree>,
        items: &SchemaNode,
        path: &str,
        depth: usize,
    ) -> Result<(), NormalizeError> {
        let item = self.option(items, path, depth + 1)?;

        let elements = item
            .option_type
            .clone()
            .or_else(|| item.suboptions.as_ref().map(|_| OptionType::Dict));
        if option.elements.is_none() {
            option.elements = elements;
        }
        if option.choices.is_none() {
            option.choices = item.choices;
        }
        if option.description.is_empty() {
            option.description = item.description;
        }
        if option.unresolved.is_none() {
            option.unresolved = item.unresolved;
        }
        for (key, value) in item.extra {
            option.extra.entry(key).or_insert(value);
        }
        if let Some(tree) = item.suboptions {
            union(suboptions, tree);
        }
        Ok(())
    }

    /// Fold every `allOf` part into the option.
    ///
    /// The option's own keys win; descriptions are appended after its own.
    /// Parts' `required` names apply to the combined suboptions.
    #[allow(clippy::too_many_arguments)]
    fn all_of(
        &mut self,
        option: &mut OptionNode,
        suboptions: &mut Option<OptionTree>,
        required_names: &mut Vec<String>,
        value: &SchemaNode,
        path: &str,
        key_path: &str,
        depth: usize,
    ) -> Result<(), NormalizeError> {
        let SchemaNode::List(parts) = value else {
            return Err(NormalizeError::Malformed {
                path: key_path.to_string(),
                expected: "array",
                actual: value.kind().to_string(),
            });
        };

        for (i, part) in parts.iter().enumerate() {
            let part_path = format!("{}/{}", key_path, i);
            let mark = self.active.len();
            let result = self.expand(part, path).and_then(|mut expanded| {
                if let Some(required) = expanded.fields.shift_remove("required") {
                    let required_path = format!("{}/required", part_path);
                    if let Some(flag) = required_list(&required, &required_path, required_names)? {
                        option.required |= flag;
                    }
                }
                self.build(expanded, path, depth)
            });
            self.active.truncate(mark);
            let part = result?;

            if option.option_type.is_none() {
                option.option_type = part.option_type;
            }
            if option.elements.is_none() {
                option.elements = part.elements;
            }
            if option.choices.is_none() {
                option.choices = part.choices;
            }
            if option.default.is_none() {
                option.default = part.default;
            }
            if option.unresolved.is_none() {
                option.unresolved = part.unresolved;
            }
            option.required |= part.required;
            option.description.extend(part.description);
            for (key, value) in part.extra {
                option.extra.entry(key).or_insert(value);
            }
            if let Some(tree) = part.suboptions {
                union(suboptions, tree);
            }
        }
        Ok(())
    }

    /// Union the properties of every `oneOf` alternative.
    ///
    /// Requiredness is never asserted across alternatives.
    fn one_of(
        &mut self,
        value: &SchemaNode,
        path: &str,
        key_path: &str,
        depth: usize,
    ) -> Result<OptionTree, NormalizeError> {
        let SchemaNode::List(alternatives) = value else {
            return Err(NormalizeError::Malformed {
                path: key_path.to_string(),
                expected: "array",
                actual: value.kind().to_string(),
            });
        };

        let mut tree = OptionTree::new();
        for alternative in alternatives {
            let mark = self.active.len();
            let result = self.expand(alternative, path).and_then(|expanded| {
                let entries = alternative_properties(&expanded.fields, self.options);
                self.properties(&entries, path, depth)
            });
            self.active.truncate(mark);

            for (name, option) in result? {
                tree.entry(name).or_insert(option);
            }
        }
        Ok(tree)
    }

    /// Deduplicate and sort an enumeration.
    fn choices(
        &mut self,
        value: &SchemaNode,
        path: &str,
        key_path: &str,
    ) -> Result<Vec<Value>, NormalizeError> {
        let SchemaNode::List(items) = value else {
            return Err(NormalizeError::Malformed {
                path: key_path.to_string(),
                expected: "array",
                actual: value.kind().to_string(),
            });
        };

        let mut choices: Vec<Value> = Vec::with_capacity(items.len());
        for item in items {
            let value = item.to_value();
            if !choices.contains(&value) {
                choices.push(value);
            }
        }

        if !sort_choices(&mut choices) {
            self.record(Defect::AmbiguousSort {
                path: path.to_string(),
            });
        }
        Ok(choices)
    }
}

/// Sort values that all share one comparable type. Returns false, leaving the
/// order untouched, for mixed or non-scalar values.
fn sort_choices(choices: &mut [Value]) -> bool {
    if choices.len() < 2 {
        return true;
    }
    if choices.iter().all(Value::is_string) {
        choices.sort_by(|a, b| a.as_str().cmp(&b.as_str()));
    } else if choices.iter().all(Value::is_number) {
        choices.sort_by(compare_numbers);
    } else if choices.iter().all(Value::is_boolean) {
        choices.sort_by_key(|v| v.as_bool());
    } else {
        return false;
    }
    true
}

/// Integers compare exactly; floats (or a float against an integer) go
/// through `f64`.
fn compare_numbers(a: &Value, b: &Value) -> Ordering {
    match (a.as_i64(), b.as_i64(), a.as_u64(), b.as_u64()) {
        (Some(a), Some(b), _, _) => a.cmp(&b),
        (_, _, Some(a), Some(b)) => a.cmp(&b),
        // One side is a u64 above i64::MAX
        (Some(_), None, _, Some(_)) => Ordering::Less,
        (None, Some(_), Some(_), _) => Ordering::Greater,
        _ => {
            let (a, b) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
    }
}

/// Merge a reference overlay over its target's keys.
///
/// Overlay keys win, except `description`: both are split into sentences and
/// the overlay's come first.
fn merge(
    overlay: IndexMap<String, SchemaNode>,
    target: &IndexMap<String, SchemaNode>,
    path: &str,
) -> Result<IndexMap<String, SchemaNode>, NormalizeError> {
    let mut merged = target.clone();
    for (key, value) in overlay {
        if key == "description" {
            if let Some(existing) = merged.get("description") {
                let description_path = format!("{}/description", path);
                let mut sentences = description_sentences(&value, &description_path)?;
                sentences.extend(description_sentences(existing, &description_path)?);
                let combined = sentences
                    .into_iter()
                    .map(|s| SchemaNode::Scalar(Value::String(s)))
                    .collect();
                merged.insert(key, SchemaNode::List(combined));
                continue;
            }
        }
        merged.insert(key, value);
    }
    Ok(merged)
}

fn union(target: &mut Option<OptionTree>, tree: OptionTree) {
    match target {
        Some(existing) => {
            for (name, option) in tree {
                existing.entry(name).or_insert(option);
            }
        }
        None => *target = Some(tree),
    }
}

/// Properties declared by a `oneOf` alternative: its `properties` object, or
/// the alternative itself read as a bare property map.
fn alternative_properties(
    fields: &IndexMap<String, SchemaNode>,
    options: &NormalizeOptions,
) -> IndexMap<String, SchemaNode> {
    if let Some(SchemaNode::Object(properties)) = fields.get("properties") {
        return properties.clone();
    }
    fields
        .iter()
        .filter(|(key, _)| !ALTERNATIVE_KEYWORDS.contains(&key.as_str()) && !options.is_scrubbed(key))
        .filter(|(_, value)| matches!(value, SchemaNode::Object(_) | SchemaNode::Reference { .. }))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Collect the names of a `required` list. A boolean `required` is the
/// option's own flag and is returned instead.
fn required_list(
    value: &SchemaNode,
    path: &str,
    names: &mut Vec<String>,
) -> Result<Option<bool>, NormalizeError> {
    match value {
        SchemaNode::List(items) => {
            for (i, name) in items.iter().enumerate() {
                match name.as_str() {
                    Some(name) => names.push(name.to_string()),
                    None => {
                        return Err(NormalizeError::Malformed {
                            path: format!("{}/{}", path, i),
                            expected: "string",
                            actual: name.kind().to_string(),
                        })
                    }
                }
            }
            Ok(None)
        }
        SchemaNode::Scalar(Value::Bool(flag)) => Ok(Some(*flag)),
        other => Err(NormalizeError::Malformed {
            path: path.to_string(),
            expected: "array",
            actual: other.kind().to_string(),
        }),
    }
}

fn description_sentences(value: &SchemaNode, path: &str) -> Result<Vec<String>, NormalizeError> {
    match value {
        SchemaNode::Scalar(Value::String(text)) => Ok(split_sentences(text)),
        SchemaNode::Scalar(Value::Null) => Ok(Vec::new()),
        SchemaNode::List(parts) => {
            let mut sentences = Vec::new();
            for (i, part) in parts.iter().enumerate() {
                match part.as_str() {
                    Some(text) => sentences.extend(split_sentences(text)),
                    None => {
                        return Err(NormalizeError::Malformed {
                            path: format!("{}/{}", path, i),
                            expected: "string",
                            actual: part.kind().to_string(),
                        })
                    }
                }
            }
            Ok(sentences)
        }
        other => Err(NormalizeError::Malformed {
            path: path.to_string(),
            expected: "string",
            actual: other.kind().to_string(),
        }),
    }
}

/// Translate `type`, taking the first entry of a type list.
fn schema_type(value: &SchemaNode, path: &str) -> Result<OptionType, NormalizeError> {
    let name = match value {
        SchemaNode::List(types) => types.first().and_then(SchemaNode::as_str),
        other => other.as_str(),
    };
    name.map(OptionType::from_schema)
        .ok_or_else(|| NormalizeError::Malformed {
            path: path.to_string(),
            expected: "string",
            actual: value.kind().to_string(),
        })
}

fn expect_object<'n>(
    value: &'n SchemaNode,
    path: &str,
) -> Result<&'n IndexMap<String, SchemaNode>, NormalizeError> {
    match value {
        SchemaNode::Object(entries) => Ok(entries),
        other => Err(NormalizeError::Malformed {
            path: path.to_string(),
            expected: "object",
            actual: other.kind().to_string(),
        }),
    }
}

/// Case-convert every object key in a pass-through value.
fn snake_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, child)| (camel_to_snake(&key), snake_keys(child)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(snake_keys).collect()),
        other => other,
    }
}
