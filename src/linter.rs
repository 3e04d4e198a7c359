//! Schema linting - static analysis of resource schema files.
//!
//! Checks each schema file for:
//! - JSON syntax errors
//! - Meta-schema violations
//! - Problems a normalization pass would hit (broken or cyclic `$ref`s,
//!   malformed nodes, unknown `required` names, name collisions)

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Defect, NormalizeError, ValidateError};
use crate::loader::{load_schema, parse_resource_schema};
use crate::resolver::normalize_schema;
use crate::types::NormalizeOptions;
use crate::validator::validate_document;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: PathBuf,
    /// JSON path to the issue (e.g., "/properties/Tags") or option path
    /// (e.g., "/tags/key") for normalization findings.
    pub path: String,
    pub message: String,
}

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a directory or set of files.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// Returns true if all files passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Lint a file or directory.
///
/// If path is a directory, recursively finds all .json files.
/// If `strict` is true, warnings are treated as errors.
/// Returns aggregated results for all files.
pub fn lint(path: &Path, strict: bool) -> LintResult {
    let files = collect_schema_files(path);
    let mut results = Vec::new();
    let mut total_errors = 0;
    let mut total_warnings = 0;

    for file in &files {
        let file_result = lint_file(file, path);
        total_errors += count(&file_result, Severity::Error);
        total_warnings += count(&file_result, Severity::Warning);
        results.push(file_result);
    }

    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: files.len(),
        passed: files.len() - failed,
        failed,
        errors: total_errors,
        warnings: total_warnings,
        results,
    }
}

fn count(result: &FileResult, severity: Severity) -> usize {
    result
        .diagnostics
        .iter()
        .filter(|d| d.severity == severity)
        .count()
}

/// Lint a single schema file.
pub fn lint_file(file: &Path, base_path: &Path) -> FileResult {
    let mut diagnostics = Vec::new();
    let mut report = |severity: Severity, code: &str, path: &str, message: String| {
        diagnostics.push(Diagnostic {
            severity,
            code: code.to_string(),
            file: file.to_path_buf(),
            path: path.to_string(),
            message,
        });
    };

    let checked = match load_schema(file) {
        Ok(document) => {
            match validate_document(&document) {
                Ok(()) => {}
                Err(ValidateError::Invalid { errors }) => {
                    for error in errors {
                        let path = if error.path.is_empty() { "/" } else { error.path.as_str() };
                        report(Severity::Error, "E002", path, error.message);
                    }
                }
                Err(e) => report(Severity::Error, "E002", "/", e.to_string()),
            }

            if document.get("description").and_then(|d| d.as_str()).is_none() {
                report(
                    Severity::Warning,
                    "W002",
                    "/description",
                    "schema missing top-level description".to_string(),
                );
            }

            parse_resource_schema(document)
        }
        Err(e) => {
            report(Severity::Error, "E001", "/", format!("syntax error: {}", e));
            Err(e)
        }
    };

    // Shape errors were already reported as meta-schema violations
    if let Ok(schema) = checked {
        match normalize_schema(&schema, &NormalizeOptions::default()) {
            Ok(normalized) => {
                for defect in &normalized.defects {
                    let (severity, code) = defect_code(defect);
                    report(severity, code, defect.path(), defect.to_string());
                }
            }
            Err(NormalizeError::Malformed { path, expected, actual }) => report(
                Severity::Error,
                "E006",
                &path,
                format!("expected {}, got {}", expected, actual),
            ),
            Err(e) => report(Severity::Error, "E006", "/", e.to_string()),
        }
    }

    let has_errors = diagnostics.iter().any(|d| d.severity == Severity::Error);
    let has_warnings = diagnostics.iter().any(|d| d.severity == Severity::Warning);

    let status = if has_errors {
        FileStatus::Error
    } else if has_warnings {
        FileStatus::Warning
    } else {
        FileStatus::Ok
    };

    FileResult {
        file: file.strip_prefix(base_path).unwrap_or(file).to_path_buf(),
        status,
        diagnostics,
    }
}

/// Diagnostic code for a normalization defect.
pub fn defect_code(defect: &Defect) -> (Severity, &'static str) {
    match defect {
        Defect::UnresolvableRef { .. } => (Severity::Error, "E003"),
        Defect::RefCycle { .. } => (Severity::Error, "E004"),
        Defect::DepthExceeded { .. } => (Severity::Error, "E005"),
        Defect::UnknownRequired { .. } => (Severity::Warning, "W001"),
        Defect::NameCollision { .. } => (Severity::Warning, "W003"),
        Defect::AmbiguousSort { .. } => (Severity::Warning, "W004"),
    }
}

/// Collect schema files from a path (file or directory).
fn collect_schema_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            return vec![path.to_path_buf()];
        }
        return vec![];
    }

    let mut files = Vec::new();
    collect_files_recursive(path, &mut files);
    files.sort();
    files
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, files);
        } else if path.extension().map(|e| e == "json").unwrap_or(false) {
            files.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn lint_str(content: &str) -> FileResult {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        lint_file(file.path(), file.path().parent().unwrap())
    }

    fn codes(result: &FileResult) -> Vec<&str> {
        result.diagnostics.iter().map(|d| d.code.as_str()).collect()
    }

    #[test]
    fn lint_valid_schema() {
        let result = lint_str(
            r#"{
            "typeName": "AWS::Logs::LogGroup",
            "description": "Log groups.",
            "properties": {
                "LogGroupName": { "type": "string" }
            },
            "primaryIdentifier": ["/properties/LogGroupName"]
        }"#,
        );
        assert_eq!(result.status, FileStatus::Ok);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn lint_invalid_json_syntax() {
        let result = lint_str("{ not valid json }");
        assert_eq!(result.status, FileStatus::Error);
        assert_eq!(codes(&result), vec!["E001"]);
    }

    #[test]
    fn lint_meta_schema_violation() {
        let result = lint_str(
            r#"{ "typeName": "LogGroup", "description": "x", "properties": { "A": { "type": "string" } } }"#,
        );
        assert_eq!(result.status, FileStatus::Error);
        assert_eq!(codes(&result), vec!["E002"]);
        assert_eq!(result.diagnostics[0].path, "/typeName");
    }

    #[test]
    fn lint_unresolvable_ref() {
        let result = lint_str(
            r##"{
            "typeName": "AWS::Logs::LogGroup",
            "description": "x",
            "properties": { "Tags": { "$ref": "#/definitions/Tag" } }
        }"##,
        );
        assert_eq!(codes(&result), vec!["E003"]);
        assert_eq!(result.diagnostics[0].path, "/tags");
    }

    #[test]
    fn lint_ref_cycle() {
        let result = lint_str(
            r##"{
            "typeName": "AWS::Demo::Tree",
            "description": "x",
            "properties": { "Root": { "$ref": "#/definitions/Node" } },
            "definitions": {
                "Node": { "type": "object", "properties": { "Child": { "$ref": "#/definitions/Node" } } }
            }
        }"##,
        );
        assert_eq!(codes(&result), vec!["E004"]);
    }

    #[test]
    fn lint_malformed_node() {
        let result = lint_str(
            r#"{
            "typeName": "AWS::Demo::Thing",
            "description": "x",
            "properties": { "Mode": { "type": "string", "enum": "A" } }
        }"#,
        );
        assert_eq!(codes(&result), vec!["E006"]);
        assert_eq!(result.diagnostics[0].path, "/mode/enum");
    }

    #[test]
    fn lint_warnings() {
        let result = lint_str(
            r#"{
            "typeName": "AWS::Demo::Thing",
            "properties": {
                "Mode": { "enum": ["A", 1] },
                "Config": { "type": "object", "properties": {}, "required": ["Missing"] }
            }
        }"#,
        );
        assert_eq!(result.status, FileStatus::Warning);
        assert_eq!(codes(&result), vec!["W002", "W004", "W001"]);
    }

    #[test]
    fn lint_directory() {
        let dir = tempdir().unwrap();

        let valid_path = dir.path().join("valid.json");
        std::fs::write(
            &valid_path,
            r#"{"typeName": "AWS::S3::Bucket", "description": "x", "properties": {"BucketName": {"type": "string"}}}"#,
        )
        .unwrap();

        let invalid_path = dir.path().join("invalid.json");
        std::fs::write(&invalid_path, "{ not json }").unwrap();

        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let result = lint(dir.path(), false);
        assert_eq!(result.files_checked, 2);
        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 1);
        assert!(!result.is_ok());
    }

    #[test]
    fn lint_strict_mode() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.json");
        // Warning only (missing description)
        std::fs::write(
            &file_path,
            r#"{"typeName": "AWS::S3::Bucket", "properties": {"BucketName": {"type": "string"}}}"#,
        )
        .unwrap();

        let result = lint(&file_path, false);
        assert_eq!(result.files_checked, 1);
        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 0);

        let result = lint(&file_path, true);
        assert_eq!(result.passed, 0);
        assert_eq!(result.failed, 1);
    }
}
