//! Module specification assembly.
//!
//! Runs the normalizer and the description rewriter over one resource schema,
//! then adds the standard options every generated module carries and derives
//! the argument specification, request parameters and `required_if` rules.

use std::collections::HashSet;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{DocumentationOverrides, ModuleConfig, ModuleConfigTable};
use crate::description::DescriptionRewriter;
use crate::document::ResourceSchema;
use crate::error::{Defect, NormalizeError};
use crate::naming::camel_to_snake;
use crate::option::{argument_spec, request_params, OptionNode, OptionTree};
use crate::resolver::normalize_schema;
use crate::types::{NormalizeOptions, OptionType, PLACEHOLDER_DESCRIPTION};

pub const DEFAULT_AUTHOR: &str = "Ansible Cloud Team (@ansible-collections)";
pub const DEFAULT_VERSION_ADDED: &str = "1.0.0";

/// Default wait timeout, in seconds.
pub const DEFAULT_WAIT_TIMEOUT: u64 = 320;

/// `state` choices, in documentation order.
pub const STATES: &[&str] = &["present", "absent", "list", "describe", "get"];

/// Options for generating module specifications.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub author: String,
    pub version_added: String,
    pub normalize: NormalizeOptions,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            author: DEFAULT_AUTHOR.to_string(),
            version_added: DEFAULT_VERSION_ADDED.to_string(),
            normalize: NormalizeOptions::default(),
        }
    }
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn version_added(mut self, version: impl Into<String>) -> Self {
        self.version_added = version.into();
        self
    }

    pub fn normalize(mut self, options: NormalizeOptions) -> Self {
        self.normalize = options;
        self
    }
}

/// Documentation block of a generated module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleDocumentation {
    pub module: String,
    pub author: String,
    pub short_description: String,
    pub description: Vec<String>,
    pub options: OptionTree,
    pub version_added: String,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl ModuleDocumentation {
    /// Replace documentation fields with configured values. Listed options
    /// replace the generated option of the same name, or are appended.
    pub fn apply_overrides(&mut self, overrides: &DocumentationOverrides) {
        if let Some(module) = &overrides.module {
            self.module = module.clone();
        }
        if let Some(author) = &overrides.author {
            self.author = author.clone();
        }
        if let Some(short_description) = &overrides.short_description {
            self.short_description = short_description.clone();
        }
        if !overrides.description.is_empty() {
            self.description = overrides.description.clone();
        }
        if let Some(version_added) = &overrides.version_added {
            self.version_added = version_added.clone();
        }
        for (name, option) in &overrides.options {
            self.options.insert(name.clone(), option.clone());
        }
        for (key, value) in &overrides.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

/// One `required_if` rule: when `option == value`, the listed options are
/// required (any one of them when the flag is true).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequiredIf(pub String, pub String, pub Vec<String>, pub bool);

impl RequiredIf {
    fn state(value: &str, options: Vec<String>) -> Self {
        RequiredIf("state".to_string(), value.to_string(), options, true)
    }
}

/// Everything a renderer needs to emit one module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleSpec {
    pub resource_type: String,
    pub documentation: ModuleDocumentation,
    pub argument_spec: OptionTree,
    pub request_params: Vec<String>,
    pub required_if: Vec<RequiredIf>,
    pub primary_identifier: Vec<String>,
    pub create_only_properties: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub defects: Vec<Defect>,
}

impl ModuleSpec {
    pub fn module_name(&self) -> &str {
        &self.documentation.module
    }
}

/// Generate the module specification for one resource schema.
///
/// # Errors
///
/// Returns `NormalizeError::Malformed` if the schema has malformed nodes.
pub fn generate_module(
    schema: &ResourceSchema,
    options: &GenerateOptions,
    config: Option<&ModuleConfig>,
) -> Result<ModuleSpec, NormalizeError> {
    let normalized = normalize_schema(schema, &options.normalize)?;
    let rewriter = DescriptionRewriter::for_schema(schema);

    let mut tree = rewriter.rewrite_tree(normalized.options);
    append_standard_options(&mut tree, schema);

    let mut description = schema
        .description
        .as_deref()
        .map(|text| rewriter.rewrite(text))
        .unwrap_or_default();
    if description.is_empty() {
        description.push(PLACEHOLDER_DESCRIPTION.to_string());
    }

    let mut documentation = ModuleDocumentation {
        module: schema.module_name(),
        author: options.author.clone(),
        short_description: format!("Create and manage {} resources", schema.type_name),
        description,
        options: tree,
        version_added: options.version_added.clone(),
        extra: IndexMap::new(),
    };
    if let Some(config) = config {
        documentation.apply_overrides(&config.documentation);
    }

    debug!(
        module = %documentation.module,
        options = documentation.options.len(),
        "generated module"
    );

    Ok(ModuleSpec {
        resource_type: schema.type_name.clone(),
        argument_spec: argument_spec(&documentation.options),
        request_params: request_params(&documentation.options),
        required_if: required_if(schema),
        primary_identifier: schema.identifier_options(),
        create_only_properties: schema.create_only_options(),
        defects: normalized.defects,
        documentation,
    })
}

/// Generate modules for many schemas in parallel, keeping input order.
///
/// With a config table, schemas whose module is not listed are skipped.
pub fn generate_batch(
    schemas: &[ResourceSchema],
    options: &GenerateOptions,
    table: Option<&ModuleConfigTable>,
) -> Vec<Result<ModuleSpec, NormalizeError>> {
    schemas
        .par_iter()
        .filter_map(|schema| {
            let module = schema.module_name();
            let config = match table {
                Some(table) if !table.is_trusted(&module) => {
                    info!(%module, "module not listed in config, skipping");
                    return None;
                }
                Some(table) => table.get(&module),
                None => None,
            };
            Some(generate_module(schema, options, config))
        })
        .collect()
}

/// Add the options every module carries.
fn append_standard_options(tree: &mut OptionTree, schema: &ResourceSchema) {
    tree.insert(
        "wait".to_string(),
        OptionNode::new(OptionType::Bool)
            .with_description("Wait for operation to complete before returning.")
            .with_default(false),
    );
    tree.insert(
        "wait_timeout".to_string(),
        OptionNode::new(OptionType::Int)
            .with_description("How many seconds to wait for an operation to complete before timing out.")
            .with_default(DEFAULT_WAIT_TIMEOUT),
    );

    if schema.has_lifecycle() {
        tree.insert(
            "state".to_string(),
            OptionNode::new(OptionType::Str)
                .with_description("Goal state for the resource.")
                .with_description("I(state=present) creates the resource if it does not exist, or updates it to the provided state if it exists.")
                .with_description("I(state=absent) ensures an existing resource is deleted.")
                .with_description("I(state=list) lists all the existing resources.")
                .with_description("I(state=describe) or I(state=get) retrieves information on an existing resource.")
                .with_choices(STATES.iter().copied())
                .with_default("present"),
        );
    }

    if schema.is_taggable() {
        let mut tags = OptionNode::new(OptionType::Dict)
            .with_description("A dict of tags to apply to the resource.")
            .with_description("To remove all tags set I(tags={}) and I(purge_tags=true).");
        tags.extra
            .insert("aliases".to_string(), Value::from(vec!["resource_tags"]));
        tree.insert("tags".to_string(), tags);
        tree.insert(
            "purge_tags".to_string(),
            OptionNode::new(OptionType::Bool)
                .with_description("Remove tags not listed in I(tags).")
                .with_default(true),
        );
    }

    if schema.primary_identifier.len() > 1 {
        tree.insert(
            "identifier".to_string(),
            OptionNode::new(OptionType::Str)
                .with_description("For compound primary identifiers, the identifier as one string.")
                .with_description(format!(
                    "Components are joined with C(|) in the order {}.",
                    schema
                        .identifier_options()
                        .iter()
                        .map(|name| format!("I({})", name))
                        .collect::<Vec<_>>()
                        .join(", ")
                )),
        );
    }
}

/// `required_if` rules derived from the primary identifier.
pub fn required_if(schema: &ResourceSchema) -> Vec<RequiredIf> {
    let identifiers = schema.identifier_options();
    let read_only: HashSet<String> = schema.read_only_options().into_iter().collect();
    let required: Vec<String> = schema.required.iter().map(|name| camel_to_snake(name)).collect();
    let compound = identifiers.len() > 1;

    let mut entries = Vec::new();
    for identifier in &identifiers {
        let mut lookup = vec![identifier.clone()];
        if compound {
            lookup.push("identifier".to_string());
        }

        if !read_only.contains(identifier) {
            let mut present = vec![identifier.clone()];
            for name in &required {
                if !present.contains(name) {
                    present.push(name.clone());
                }
            }
            entries.push(RequiredIf::state("present", present));
        }
        entries.push(RequiredIf::state("absent", lookup.clone()));
        entries.push(RequiredIf::state("get", lookup));
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn log_group() -> ResourceSchema {
        serde_json::from_value(json!({
            "typeName": "AWS::Logs::LogGroup",
            "description": "Resource schema for AWS::Logs::LogGroup",
            "properties": {
                "LogGroupName": { "type": "string", "description": "The name of the log group." },
                "RetentionInDays": { "type": "integer", "enum": [30, 1, 14] },
                "Arn": { "type": "string" },
                "Tags": { "type": "array", "items": { "$ref": "#/definitions/Tag" } }
            },
            "definitions": {
                "Tag": {
                    "type": "object",
                    "properties": { "Key": { "type": "string" }, "Value": { "type": "string" } },
                    "required": ["Key", "Value"]
                }
            },
            "primaryIdentifier": ["/properties/LogGroupName"],
            "readOnlyProperties": ["/properties/Arn"],
            "tagging": { "taggable": true }
        }))
        .unwrap()
    }

    #[test]
    fn documentation_defaults() {
        let spec = generate_module(&log_group(), &GenerateOptions::default(), None).unwrap();
        let docs = &spec.documentation;
        assert_eq!(docs.module, "logs_log_group");
        assert_eq!(docs.author, DEFAULT_AUTHOR);
        assert_eq!(docs.version_added, "1.0.0");
        assert_eq!(
            docs.short_description,
            "Create and manage AWS::Logs::LogGroup resources"
        );
        assert_eq!(docs.description, vec!["Resource schema for AWS::Logs::LogGroup."]);
    }

    #[test]
    fn standard_options_appended() {
        let spec = generate_module(&log_group(), &GenerateOptions::default(), None).unwrap();
        let options = &spec.documentation.options;
        assert_eq!(options["wait"].default, Some(json!(false)));
        assert_eq!(options["wait_timeout"].default, Some(json!(320)));
        assert_eq!(options["state"].default, Some(json!("present")));
        assert_eq!(options["tags"].option_type, Some(OptionType::Dict));
        assert_eq!(options["tags"].extra["aliases"], json!(["resource_tags"]));
        assert_eq!(options["purge_tags"].default, Some(json!(true)));
        assert!(!options.contains_key("identifier"));
        assert!(!options.contains_key("arn"));
    }

    #[test]
    fn every_option_documented() {
        let spec = generate_module(&log_group(), &GenerateOptions::default(), None).unwrap();
        crate::option::walk(&spec.documentation.options, &mut |path, node| {
            assert!(!node.description.is_empty(), "{} has no description", path);
        });
    }

    #[test]
    fn argument_spec_and_request_params() {
        let spec = generate_module(&log_group(), &GenerateOptions::default(), None).unwrap();
        assert!(spec.argument_spec["log_group_name"].description.is_empty());
        assert_eq!(
            spec.request_params,
            vec!["log_group_name", "retention_in_days", "tags"]
        );
    }

    #[test]
    fn required_if_for_simple_identifier() {
        let spec = generate_module(&log_group(), &GenerateOptions::default(), None).unwrap();
        let names = vec!["log_group_name".to_string()];
        assert_eq!(
            spec.required_if,
            vec![
                RequiredIf::state("present", names.clone()),
                RequiredIf::state("absent", names.clone()),
                RequiredIf::state("get", names),
            ]
        );
        assert_eq!(
            serde_json::to_value(&spec.required_if[0]).unwrap(),
            json!(["state", "present", ["log_group_name"], true])
        );
    }

    #[test]
    fn compound_identifier() {
        let schema: ResourceSchema = serde_json::from_value(json!({
            "typeName": "AWS::Demo::Attachment",
            "properties": {
                "GroupName": { "type": "string" },
                "PolicyArn": { "type": "string" },
                "AttachmentId": { "type": "string" }
            },
            "required": ["GroupName"],
            "primaryIdentifier": ["/properties/GroupName", "/properties/AttachmentId"],
            "readOnlyProperties": ["/properties/AttachmentId"]
        }))
        .unwrap();

        let spec = generate_module(&schema, &GenerateOptions::default(), None).unwrap();
        assert!(spec.documentation.options.contains_key("identifier"));
        assert!(spec.documentation.options.contains_key("attachment_id"));
        assert_eq!(
            spec.required_if,
            vec![
                RequiredIf::state("present", vec!["group_name".into()]),
                RequiredIf::state("absent", vec!["group_name".into(), "identifier".into()]),
                RequiredIf::state("get", vec!["group_name".into(), "identifier".into()]),
                RequiredIf::state("absent", vec!["attachment_id".into(), "identifier".into()]),
                RequiredIf::state("get", vec!["attachment_id".into(), "identifier".into()]),
            ]
        );
    }

    #[test]
    fn state_omitted_without_lifecycle_handlers() {
        let mut schema = log_group();
        schema.handlers = Some(serde_json::Map::new());
        let spec = generate_module(&schema, &GenerateOptions::default(), None).unwrap();
        assert!(!spec.documentation.options.contains_key("state"));
    }

    #[test]
    fn config_overrides_apply_after_normalization() {
        let table: ModuleConfigTable = r#"
- logs_log_group:
    documentation:
      short_description: Manage log groups
      requirements: [boto3]
      options:
        wait_timeout:
          description: [Seconds to wait.]
          type: int
          default: 600
"#
        .parse()
        .unwrap();
        let spec = generate_module(
            &log_group(),
            &GenerateOptions::new().version_added("2.0.0"),
            table.get("logs_log_group"),
        )
        .unwrap();
        let docs = &spec.documentation;
        assert_eq!(docs.short_description, "Manage log groups");
        assert_eq!(docs.version_added, "2.0.0");
        assert_eq!(docs.extra["requirements"], json!(["boto3"]));
        assert_eq!(docs.options["wait_timeout"].default, Some(json!(600)));
        assert_eq!(spec.argument_spec["wait_timeout"].default, Some(json!(600)));
    }

    #[test]
    fn batch_keeps_order_and_skips_untrusted() {
        let mut bucket = log_group();
        bucket.type_name = "AWS::S3::Bucket".to_string();
        let schemas = vec![log_group(), bucket];

        let all = generate_batch(&schemas, &GenerateOptions::default(), None);
        let names: Vec<String> = all
            .iter()
            .map(|r| r.as_ref().unwrap().module_name().to_string())
            .collect();
        assert_eq!(names, vec!["logs_log_group", "s3_bucket"]);

        let table: ModuleConfigTable = "- s3_bucket: {}\n".parse().unwrap();
        let trusted = generate_batch(&schemas, &GenerateOptions::default(), Some(&table));
        assert_eq!(trusted.len(), 1);
        assert_eq!(trusted[0].as_ref().unwrap().module_name(), "s3_bucket");
    }
}
