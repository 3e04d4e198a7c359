//! Per-module configuration table.
//!
//! A YAML file listing the modules to build, each with optional documentation
//! overrides:
//!
//! ```yaml
//! - logs_log_group:
//!     documentation:
//!       short_description: Create and manage log groups
//! - s3_bucket: {}
//! ```
//!
//! A plain mapping from module name to entry is accepted too.

use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ConfigError;
use crate::option::{sentences, OptionTree};

/// Configuration for one module.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ModuleConfig {
    #[serde(default)]
    pub documentation: DocumentationOverrides,
}

/// Top-level documentation fields replaced after normalization.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DocumentationOverrides {
    pub module: Option<String>,
    pub author: Option<String>,
    pub short_description: Option<String>,
    #[serde(default, deserialize_with = "sentences")]
    pub description: Vec<String>,
    pub version_added: Option<String>,
    /// Options replaced (or added) by name.
    #[serde(default)]
    pub options: OptionTree,
    /// Any other documentation key, copied as is.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTable {
    List(Vec<IndexMap<String, Option<ModuleConfig>>>),
    Map(IndexMap<String, Option<ModuleConfig>>),
}

/// Module name to configuration, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleConfigTable {
    modules: IndexMap<String, ModuleConfig>,
}

impl ModuleConfigTable {
    /// Load the table from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::FileNotFound`/`ReadError` for IO failures and
    /// `ConfigError::InvalidYaml`/`InvalidEntry` for bad content.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        content.parse()
    }

    pub fn get(&self, module: &str) -> Option<&ModuleConfig> {
        self.modules.get(module)
    }

    /// Whether `module` is listed and may be built.
    pub fn is_trusted(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl FromStr for ModuleConfigTable {
    type Err = ConfigError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let raw: RawTable =
            serde_yaml::from_str(content).map_err(|source| ConfigError::InvalidYaml { source })?;

        let mut modules = IndexMap::new();
        match raw {
            RawTable::Map(entries) => {
                for (name, config) in entries {
                    modules.insert(name, config.unwrap_or_default());
                }
            }
            RawTable::List(items) => {
                for (i, item) in items.into_iter().enumerate() {
                    if item.len() != 1 {
                        return Err(ConfigError::InvalidEntry {
                            message: format!(
                                "entry {} must name exactly one module, found {}",
                                i,
                                item.len()
                            ),
                        });
                    }
                    for (name, config) in item {
                        modules.insert(name, config.unwrap_or_default());
                    }
                }
            }
        }

        Ok(Self { modules })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn parses_list_form() {
        let table: ModuleConfigTable = r#"
- logs_log_group:
    documentation:
      short_description: Create and manage log groups
      description: Manages log groups. Use it well.
      requirements: [boto3]
- s3_bucket:
"#
        .parse()
        .unwrap();

        assert_eq!(table.len(), 2);
        assert!(table.is_trusted("s3_bucket"));
        assert!(!table.is_trusted("ec2_vpc"));

        let docs = &table.get("logs_log_group").unwrap().documentation;
        assert_eq!(
            docs.short_description.as_deref(),
            Some("Create and manage log groups")
        );
        assert_eq!(docs.description, vec!["Manages log groups. Use it well."]);
        assert_eq!(docs.extra["requirements"], serde_json::json!(["boto3"]));
        assert_eq!(
            table.get("s3_bucket").unwrap(),
            &ModuleConfig::default()
        );
    }

    #[test]
    fn parses_map_form() {
        let table: ModuleConfigTable = "rds_db_proxy:\n  documentation:\n    version_added: 2.1.0\n"
            .parse()
            .unwrap();
        let docs = &table.get("rds_db_proxy").unwrap().documentation;
        assert_eq!(docs.version_added.as_deref(), Some("2.1.0"));
    }

    #[test]
    fn option_overrides_are_typed() {
        let table: ModuleConfigTable = r#"
- logs_log_group:
    documentation:
      options:
        log_group_name:
          description: [The name.]
          type: str
          required: true
"#
        .parse()
        .unwrap();
        let docs = &table.get("logs_log_group").unwrap().documentation;
        assert!(docs.options["log_group_name"].required);
    }

    #[test]
    fn empty_content_is_empty_table() {
        let table: ModuleConfigTable = "".parse().unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn multi_key_entry_rejected() {
        let result = "- a: {}\n  b: {}\n".parse::<ModuleConfigTable>();
        assert!(matches!(result, Err(ConfigError::InvalidEntry { .. })));
    }

    #[test]
    fn invalid_yaml_rejected() {
        let result = "- [unclosed".parse::<ModuleConfigTable>();
        assert!(matches!(result, Err(ConfigError::InvalidYaml { .. })));
    }

    #[test]
    fn load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "- logs_log_group: {{}}").unwrap();
        let table = ModuleConfigTable::load(file.path()).unwrap();
        assert!(table.is_trusted("logs_log_group"));

        let missing = ModuleConfigTable::load(Path::new("/nonexistent/modules.yaml"));
        assert!(matches!(missing, Err(ConfigError::FileNotFound { .. })));
    }
}
