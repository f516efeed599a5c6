//! Document linting - static analysis of Swagger documents.
//!
//! Checks documents for:
//! - JSON/YAML syntax errors
//! - Local $refs to definitions that don't exist
//! - Definitions that can't be resolved (circular references)
//! - Malformed $ref and allOf values
//! - Remote $refs, which resolution leaves in place

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::ResolveError;
use crate::loader::{escape_segment, is_document_path, load_document};
use crate::refs::{definition_name, is_remote};
use crate::resolver::resolve_definition;
use crate::tree::RootDocument;
use crate::types::{json_type_name, ResolveOptions, ALL_OF_KEY, DEFINITIONS_KEY, REF_KEY};

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
    /// JSON path to the issue (e.g., "/definitions/Pet/properties/tag/$ref")
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
/// If path is a directory, recursively finds all .json, .yaml and .yml files.
/// If `strict` is true, warnings count as failures.
pub fn lint(path: &Path, strict: bool) -> LintResult {
    let files = collect_document_files(path);
    let mut results = Vec::new();
    let mut total_errors = 0;
    let mut total_warnings = 0;

    for file in &files {
        let file_result = lint_file(file, path);
        total_errors += count(&file_result.diagnostics, Severity::Error);
        total_warnings += count(&file_result.diagnostics, Severity::Warning);
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

/// Lint a single Swagger document.
pub fn lint_file(file: &Path, base_path: &Path) -> FileResult {
    let display_file = file.strip_prefix(base_path).unwrap_or(file).to_path_buf();
    let mut diagnostics = Vec::new();

    let document = match load_document(file) {
        Ok(d) => d,
        Err(e) => {
            diagnostics.push(diagnostic(
                Severity::Error,
                "E001",
                file,
                "/",
                format!("syntax error: {}", e),
            ));
            return FileResult {
                file: display_file,
                status: FileStatus::Error,
                diagnostics,
            };
        }
    };

    let root = match RootDocument::new(document) {
        Ok(root) => Arc::new(root),
        Err(e) => {
            diagnostics.push(diagnostic(Severity::Error, "E001", file, "/", e.to_string()));
            return FileResult {
                file: display_file,
                status: FileStatus::Error,
                diagnostics,
            };
        }
    };

    check_refs(root.document(), &root, file, "", &mut diagnostics);
    check_cycles(&root, file, &mut diagnostics);

    if root.document().get("swagger").and_then(Value::as_str) != Some("2.0") {
        diagnostics.push(diagnostic(
            Severity::Warning,
            "W002",
            file,
            "/",
            "document missing swagger: \"2.0\" field".to_string(),
        ));
    }

    let status = if count(&diagnostics, Severity::Error) > 0 {
        FileStatus::Error
    } else if count(&diagnostics, Severity::Warning) > 0 {
        FileStatus::Warning
    } else {
        FileStatus::Ok
    };

    FileResult {
        file: display_file,
        status,
        diagnostics,
    }
}

/// Recursively check $ref and allOf values in a document.
fn check_refs(
    value: &Value,
    root: &RootDocument,
    file: &Path,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match value {
        Value::Object(map) => {
            if let Some(ref_val) = map.get(REF_KEY) {
                let ref_path = format!("{}/{}", path, REF_KEY);
                check_single_ref(ref_val, root, file, &ref_path, diagnostics);
            }

            if let Some(all_of) = map.get(ALL_OF_KEY) {
                let all_of_path = format!("{}/{}", path, ALL_OF_KEY);
                check_all_of(all_of, file, &all_of_path, diagnostics);
            }

            for (key, val) in map {
                let child_path = format!("{}/{}", path, escape_segment(key));
                check_refs(val, root, file, &child_path, diagnostics);
            }
        }
        Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                let child_path = format!("{}/{}", path, i);
                check_refs(item, root, file, &child_path, diagnostics);
            }
        }
        _ => {}
    }
}

/// Check a single $ref value.
fn check_single_ref(
    ref_val: &Value,
    root: &RootDocument,
    file: &Path,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Value::String(reference) = ref_val else {
        diagnostics.push(diagnostic(
            Severity::Error,
            "E004",
            file,
            path,
            format!("$ref must be a string, got {}", json_type_name(ref_val)),
        ));
        return;
    };

    if is_remote(reference) {
        diagnostics.push(diagnostic(
            Severity::Warning,
            "W001",
            file,
            path,
            format!("remote ref is not resolved: {}", reference),
        ));
        return;
    }

    let name = definition_name(reference);
    if root.definition(name).is_none() {
        diagnostics.push(diagnostic(
            Severity::Error,
            "E002",
            file,
            path,
            format!("definition not found: {}", reference),
        ));
    }
}

/// allOf must be an array of objects.
fn check_all_of(all_of: &Value, file: &Path, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let Value::Array(members) = all_of else {
        diagnostics.push(diagnostic(
            Severity::Error,
            "E005",
            file,
            path,
            format!("allOf must be an array, got {}", json_type_name(all_of)),
        ));
        return;
    };

    for (i, member) in members.iter().enumerate() {
        if !member.is_object() {
            diagnostics.push(diagnostic(
                Severity::Error,
                "E005",
                file,
                &format!("{}/{}", path, i),
                format!("allOf member must be an object, got {}", json_type_name(member)),
            ));
        }
    }
}

/// Try resolving every definition; report the ones stuck in a cycle.
///
/// Missing definitions and malformed values are already reported by
/// `check_refs`, so only cycle failures are surfaced here.
fn check_cycles(root: &Arc<RootDocument>, file: &Path, diagnostics: &mut Vec<Diagnostic>) {
    let options = ResolveOptions::default();
    for name in root.definitions().keys() {
        if let Err(ResolveError::UnresolvableReferenceCycle { refs, .. }) =
            resolve_definition(root, name, &options)
        {
            diagnostics.push(diagnostic(
                Severity::Error,
                "E003",
                file,
                &format!("/{}/{}", DEFINITIONS_KEY, escape_segment(name)),
                format!("circular reference: unresolved {}", refs.join(", ")),
            ));
        }
    }
}

fn diagnostic(
    severity: Severity,
    code: &str,
    file: &Path,
    path: &str,
    message: String,
) -> Diagnostic {
    Diagnostic {
        severity,
        code: code.to_string(),
        file: file.to_path_buf(),
        path: path.to_string(),
        message,
    }
}

fn count(diagnostics: &[Diagnostic], severity: Severity) -> usize {
    diagnostics.iter().filter(|d| d.severity == severity).count()
}

/// Collect all document files in a path (file or directory).
fn collect_document_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        if is_document_path(path) {
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
        } else if is_document_path(&path) {
            files.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, Builder, NamedTempFile};

    fn lint_str(content: &str) -> FileResult {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        lint_file(file.path(), file.path().parent().unwrap())
    }

    #[test]
    fn lint_valid_document() {
        let result = lint_str(
            r##"{
                "swagger": "2.0",
                "definitions": {
                    "Pet": { "type": "object", "properties": { "tag": { "$ref": "#/definitions/Tag" } } },
                    "Tag": { "type": "string" }
                }
            }"##,
        );
        assert_eq!(result.status, FileStatus::Ok);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn lint_invalid_json_syntax() {
        let result = lint_str("{ not valid json }");
        assert_eq!(result.status, FileStatus::Error);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, "E001");
    }

    #[test]
    fn lint_definitions_not_object() {
        let result = lint_str(r#"{ "swagger": "2.0", "definitions": [] }"#);
        assert_eq!(result.status, FileStatus::Error);
        assert_eq!(result.diagnostics[0].code, "E001");
    }

    #[test]
    fn lint_missing_definition() {
        let result = lint_str(
            r##"{
                "swagger": "2.0",
                "definitions": {
                    "Pet": { "properties": { "owner": { "$ref": "#/definitions/Owner" } } }
                }
            }"##,
        );
        assert_eq!(result.status, FileStatus::Error);
        let diag = result
            .diagnostics
            .iter()
            .find(|d| d.code == "E002")
            .unwrap();
        assert_eq!(diag.path, "/definitions/Pet/properties/owner/$ref");
        // Missing definitions are not reported again as cycles
        assert!(!result.diagnostics.iter().any(|d| d.code == "E003"));
    }

    #[test]
    fn lint_circular_definitions() {
        let result = lint_str(
            r##"{
                "swagger": "2.0",
                "definitions": {
                    "X": { "$ref": "#/definitions/Y" },
                    "Y": { "$ref": "#/definitions/X" }
                }
            }"##,
        );
        assert_eq!(result.status, FileStatus::Error);
        let cycles: Vec<_> = result
            .diagnostics
            .iter()
            .filter(|d| d.code == "E003")
            .map(|d| d.path.as_str())
            .collect();
        assert_eq!(cycles, vec!["/definitions/X", "/definitions/Y"]);
    }

    #[test]
    fn lint_non_string_ref() {
        let result = lint_str(r#"{ "swagger": "2.0", "definitions": { "A": { "$ref": 7 } } }"#);
        assert_eq!(result.status, FileStatus::Error);
        assert!(result.diagnostics.iter().any(|d| d.code == "E004"));
    }

    #[test]
    fn lint_malformed_all_of() {
        let result = lint_str(
            r#"{ "swagger": "2.0", "definitions": { "A": { "allOf": [{ "type": "object" }, 3] } } }"#,
        );
        assert_eq!(result.status, FileStatus::Error);
        let diag = result
            .diagnostics
            .iter()
            .find(|d| d.code == "E005")
            .unwrap();
        assert_eq!(diag.path, "/definitions/A/allOf/1");
    }

    #[test]
    fn lint_remote_ref_warning() {
        let result = lint_str(
            r#"{
                "swagger": "2.0",
                "definitions": { "A": { "$ref": "https://example.com/a.json" } }
            }"#,
        );
        assert_eq!(result.status, FileStatus::Warning);
        assert!(result.diagnostics.iter().any(|d| d.code == "W001"));
    }

    #[test]
    fn lint_missing_swagger_version_warning() {
        let result = lint_str(r#"{ "definitions": {} }"#);
        assert_eq!(result.status, FileStatus::Warning);
        assert!(result.diagnostics.iter().any(|d| d.code == "W002"));
    }

    #[test]
    fn lint_escapes_path_segments() {
        let result = lint_str(
            r##"{
                "swagger": "2.0",
                "paths": { "/pets": { "get": { "responses": { "200": { "schema": { "$ref": "#/definitions/Pet" } } } } } }
            }"##,
        );
        let diag = result
            .diagnostics
            .iter()
            .find(|d| d.code == "E002")
            .unwrap();
        assert_eq!(diag.path, "/paths/~1pets/get/responses/200/schema/$ref");
    }

    #[test]
    fn lint_yaml_document() {
        let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "swagger: \"2.0\"\ndefinitions:\n  Pet:\n    $ref: \"#/definitions/Missing\"\n"
        )
        .unwrap();

        let result = lint_file(file.path(), file.path().parent().unwrap());
        assert_eq!(result.status, FileStatus::Error);
        assert!(result.diagnostics.iter().any(|d| d.code == "E002"));
    }

    #[test]
    fn lint_directory() {
        let dir = tempdir().unwrap();

        std::fs::write(
            dir.path().join("valid.json"),
            r#"{"swagger": "2.0", "definitions": {"A": {"type": "string"}}}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("invalid.json"), "{ not json }").unwrap();
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
        let file_path = dir.path().join("swagger.json");
        // Warning only (missing swagger version)
        std::fs::write(&file_path, r#"{"definitions": {}}"#).unwrap();

        let result = lint(&file_path, false);
        assert_eq!(result.files_checked, 1);
        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 0);

        let result = lint(&file_path, true);
        assert_eq!(result.files_checked, 1);
        assert_eq!(result.passed, 0);
        assert_eq!(result.failed, 1);
    }
}
