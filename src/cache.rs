//! Per-batch schema cache.
//!
//! Schemas are read from a directory of `<TypeName>.json` files the first time
//! a type is asked for and kept for the lifetime of the cache. Create one
//! cache per batch run and pass it where it is needed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::document::ResourceSchema;
use crate::error::NormalizeError;
use crate::loader::load_resource_schema;

#[derive(Debug)]
pub struct SchemaCache {
    dir: PathBuf,
    entries: HashMap<String, ResourceSchema>,
}

impl SchemaCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            entries: HashMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Schema for `type_name`, loaded on first use.
    ///
    /// Looks for `<dir>/AWS::Logs::LogGroup.json`, then
    /// `<dir>/aws-logs-loggroup.json`.
    ///
    /// # Errors
    ///
    /// Returns `NormalizeError::FileNotFound` naming the first candidate when
    /// neither file exists, or the loader's error for unreadable files.
    pub fn get(&mut self, type_name: &str) -> Result<&ResourceSchema, NormalizeError> {
        if !self.entries.contains_key(type_name) {
            let path = self.locate(type_name)?;
            debug!(%type_name, path = %path.display(), "loading schema");
            let schema = load_resource_schema(&path)?;
            self.entries.insert(type_name.to_string(), schema);
        }
        self.entries
            .get(type_name)
            .ok_or_else(|| NormalizeError::FileNotFound {
                path: self.dir.join(format!("{}.json", type_name)),
            })
    }

    fn locate(&self, type_name: &str) -> Result<PathBuf, NormalizeError> {
        let exact = self.dir.join(format!("{}.json", type_name));
        if exact.is_file() {
            return Ok(exact);
        }
        let fallback = self.dir.join(format!("{}.json", fallback_stem(type_name)));
        if fallback.is_file() {
            return Ok(fallback);
        }
        Err(NormalizeError::FileNotFound { path: exact })
    }

    /// Stems of the `.json` files in the cache directory, sorted.
    ///
    /// # Errors
    ///
    /// Returns `NormalizeError::ReadError` if the directory can't be listed.
    pub fn type_names(&self) -> Result<Vec<String>, NormalizeError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|source| NormalizeError::ReadError {
            path: self.dir.clone(),
            source,
        })?;

        let mut names: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().map(|e| e == "json").unwrap_or(false))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Number of schemas loaded so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn fallback_stem(type_name: &str) -> String {
    type_name.replace("::", "-").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const LOG_GROUP: &str = r#"{"typeName": "AWS::Logs::LogGroup", "properties": {}}"#;

    #[test]
    fn loads_once_and_memoizes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("aws-logs-loggroup.json");
        std::fs::write(&path, LOG_GROUP).unwrap();

        let mut cache = SchemaCache::new(dir.path());
        assert!(cache.is_empty());
        assert_eq!(cache.get("AWS::Logs::LogGroup").unwrap().type_name, "AWS::Logs::LogGroup");

        // Served from memory after the file is gone
        std::fs::remove_file(&path).unwrap();
        assert!(cache.get("AWS::Logs::LogGroup").is_ok());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn missing_type_names_first_candidate() {
        let dir = tempdir().unwrap();
        let mut cache = SchemaCache::new(dir.path());
        match cache.get("AWS::S3::Bucket") {
            Err(NormalizeError::FileNotFound { path }) => {
                assert!(path.ends_with("AWS::S3::Bucket.json"));
            }
            other => panic!("expected file not found, got {:?}", other),
        }
    }

    #[test]
    fn type_names_lists_json_stems() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("aws-s3-bucket.json"), "{}").unwrap();
        std::fs::write(dir.path().join("aws-logs-loggroup.json"), "{}").unwrap();
        std::fs::write(dir.path().join("README.md"), "").unwrap();

        let cache = SchemaCache::new(dir.path());
        assert_eq!(
            cache.type_names().unwrap(),
            vec!["aws-logs-loggroup", "aws-s3-bucket"]
        );
    }
}
