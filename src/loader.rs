//! Document loading from various sources.
//!
//! Handles loading Swagger documents from files, strings, and HTTP URLs, in
//! JSON or YAML. Only the document itself is loaded; `$ref` targets are
//! never fetched.

use std::path::Path;

use serde_json::Value;

use crate::error::ResolveError;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// File extensions parsed as YAML. Everything else is parsed as JSON.
pub const YAML_EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Extensions picked up when scanning directories.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

/// Load a document from a file path.
///
/// `.yaml` and `.yml` files are parsed as YAML, anything else as JSON.
///
/// # Errors
///
/// Returns `ResolveError::FileNotFound` if the file doesn't exist,
/// `ResolveError::InvalidJson` / `ResolveError::InvalidYaml` if it can't be parsed.
pub fn load_document(path: &Path) -> Result<Value, ResolveError> {
    if !path.exists() {
        return Err(ResolveError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ResolveError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    if is_yaml_path(path) {
        parse_yaml(&content)
    } else {
        parse_json(&content)
    }
}

/// Load a document from a string.
///
/// Tries JSON first and falls back to YAML. When neither parses, the JSON
/// error is reported.
pub fn load_document_str(content: &str) -> Result<Value, ResolveError> {
    match parse_json(content) {
        Ok(value) => Ok(value),
        Err(json_err) => parse_yaml(content).map_err(|_| json_err),
    }
}

/// Load a document from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default). The body is parsed
/// like [`load_document_str`], so YAML documents work too.
///
/// # Errors
///
/// Returns `ResolveError::NetworkError` if the request fails,
/// or a parse error if the body isn't JSON or YAML.
#[cfg(feature = "remote")]
pub fn load_document_url(url: &str) -> Result<Value, ResolveError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|source| ResolveError::NetworkError {
            url: url.to_string(),
            source,
        })?;

    let response = client
        .get(url)
        .send()
        .map_err(|source| ResolveError::NetworkError {
            url: url.to_string(),
            source,
        })?;

    // Check for HTTP errors before parsing
    let response = response
        .error_for_status()
        .map_err(|source| ResolveError::NetworkError {
            url: url.to_string(),
            source,
        })?;

    let body = response
        .text()
        .map_err(|source| ResolveError::NetworkError {
            url: url.to_string(),
            source,
        })?;

    load_document_str(&body)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a document from a file path or URL.
///
/// Automatically detects whether the source is a URL or file path.
/// URL loading requires the `remote` feature.
pub fn load_document_auto(source: &str) -> Result<Value, ResolveError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_document_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(ResolveError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_document(Path::new(source))
    }
}

/// Navigate a JSON Pointer (e.g., "#/definitions/Pet" or "/paths/~1pets").
///
/// The leading `#` is optional. `~1` and `~0` are unescaped, and numeric
/// segments index into arrays. An empty pointer returns the whole document.
pub fn navigate_pointer<'a>(document: &'a Value, pointer: &str) -> Result<&'a Value, ResolveError> {
    let path = pointer.trim_start_matches('#').trim_start_matches('/');
    if path.is_empty() {
        return Ok(document);
    }

    let mut current = document;
    for part in path.split('/') {
        let key = part.replace("~1", "/").replace("~0", "~");
        let next = match current {
            Value::Object(map) => map.get(&key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        current = next.ok_or_else(|| ResolveError::PointerNotFound {
            pointer: pointer.to_string(),
        })?;
    }
    Ok(current)
}

/// Escape a single JSON Pointer segment (`~` becomes `~0`, `/` becomes `~1`).
pub fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// True if the path has a document extension this crate can load.
pub fn is_document_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| DOCUMENT_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

fn is_yaml_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| YAML_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

fn parse_json(content: &str) -> Result<Value, ResolveError> {
    serde_json::from_str(content).map_err(|source| ResolveError::InvalidJson { source })
}

fn parse_yaml(content: &str) -> Result<Value, ResolveError> {
    serde_yaml::from_str(content).map_err(|source| ResolveError::InvalidYaml { source })
}
