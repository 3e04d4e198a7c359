//! CloudFormation Module Generator
//!
//! Turns CloudFormation resource-provider schemas into module specifications:
//! a normalized, documented option tree plus the argument specification and
//! request parameters a module needs at runtime.
//!
//! The pipeline has two halves. The normalizer resolves `$ref`s, merges
//! referenced definitions, translates types, converts names to snake case and
//! collapses `oneOf` and `items` into canonical options. The description
//! rewriter splits documentation into sentences and rewrites option names,
//! enumeration values and links into documentation markup.
//!
//! # Example
//!
//! ```
//! use cfn_modgen::{normalize_schema, parse_resource_schema, NormalizeOptions, OptionType};
//! use serde_json::json;
//!
//! let schema = parse_resource_schema(json!({
//!     "typeName": "AWS::Logs::LogGroup",
//!     "properties": {
//!         "LogGroupName": { "type": "string", "description": "The name of the log group" },
//!         "RetentionInDays": { "$ref": "#/definitions/Retention" }
//!     },
//!     "definitions": {
//!         "Retention": { "type": "integer", "enum": [7, 1, 3] }
//!     }
//! }))
//! .unwrap();
//!
//! let normalized = normalize_schema(&schema, &NormalizeOptions::default()).unwrap();
//! let retention = &normalized.options["retention_in_days"];
//!
//! assert_eq!(retention.option_type, Some(OptionType::Int));
//! assert_eq!(retention.choices, Some(vec![json!(1), json!(3), json!(7)]));
//! assert!(normalized.defects.is_empty());
//! ```
//!
//! # Type Translation
//!
//! | Schema type | Option type |
//! |-------------|-------------|
//! | `string` | `str` |
//! | `integer`, `number` | `int` |
//! | `boolean` | `bool` |
//! | `array` | `list` |
//! | `object` | `dict` |
//!
//! # Description Markup
//!
//! ```
//! use cfn_modgen::rewrite;
//!
//! assert_eq!(
//!     rewrite("Set to TRUE to enable. See https://docs.aws.amazon.com."),
//!     vec!["Set to C(True) to enable.", "See U(https://docs.aws.amazon.com)."]
//! );
//! ```

mod cache;
mod config;
mod description;
mod document;
mod error;
mod linter;
mod loader;
mod module;
mod naming;
mod node;
mod option;
mod resolver;
mod types;
mod validator;

pub use cache::SchemaCache;
pub use config::{DocumentationOverrides, ModuleConfig, ModuleConfigTable};
pub use description::{
    clean_up, collect_vocabulary, rewrite, rewrite_booleans, rewrite_links, rewrite_names,
    rewrite_values, split_sentences, strip_brackets, terminate, DescriptionRewriter, KEEP_NAMES,
    KEEP_VALUES,
};
pub use document::{option_path, ResourceSchema, Tagging, LIFECYCLE_HANDLERS};
pub use error::{ConfigError, Defect, NormalizeError, SchemaError, ValidateError};
pub use linter::{
    defect_code, lint, lint_file, Diagnostic, FileResult, FileStatus, LintResult, Severity,
};
pub use loader::{load_resource_schema, load_schema, load_schema_str, parse_resource_schema};
pub use module::{
    generate_batch, generate_module, required_if, GenerateOptions, ModuleDocumentation,
    ModuleSpec, RequiredIf, DEFAULT_AUTHOR, DEFAULT_VERSION_ADDED, DEFAULT_WAIT_TIMEOUT, STATES,
};
pub use naming::{camel_to_snake, module_name, property_path};
pub use node::{definition_name, DefinitionTable, SchemaNode};
pub use option::{argument_spec, request_params, walk, OptionNode, OptionTree};
pub use resolver::{normalize, normalize_schema, normalize_with, Normalized};
pub use types::{
    json_type_name, NormalizeOptions, OptionType, DEFAULT_MAX_DEPTH, NON_REQUEST_PARAMS,
    PLACEHOLDER_DESCRIPTION, SCRUBBED_KEYS,
};
pub use validator::{meta_schema, validate_against_schema, validate_document};
