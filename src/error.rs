//! Error types for Swagger schema loading and reference resolution.

use std::path::PathBuf;
use thiserror::Error;

/// Errors during document loading and schema resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML: {source}")]
    InvalidYaml {
        #[source]
        source: serde_yaml::Error,
    },

    // Schema errors (exit code 2)
    #[error("could not resolve local $refs within {passes} passes (circular references?): {list}", list = refs.join(", "))]
    UnresolvableReferenceCycle { passes: usize, refs: Vec<String> },

    #[error("definition \"{name}\" not found for $ref {reference}")]
    MissingDefinition { reference: String, name: String },

    #[error("cannot resolve $ref {reference}: schema is not attached to a document")]
    DetachedSchema { reference: String },

    #[error("invalid $ref at {path}: expected string, got {actual}")]
    InvalidReference { path: String, actual: String },

    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error("invalid document: {message}")]
    InvalidDocument { message: String },

    #[error("pointer not found: {pointer}")]
    PointerNotFound { pointer: String },
}

impl ResolveError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ResolveError::FileNotFound { .. } | ResolveError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            ResolveError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_error_exit_codes() {
        let err = ResolveError::FileNotFound {
            path: PathBuf::from("swagger.json"),
        };
        assert_eq!(err.exit_code(), 3);

        let err = ResolveError::MissingDefinition {
            reference: "#/definitions/Pet".into(),
            name: "Pet".into(),
        };
        assert_eq!(err.exit_code(), 2);

        let err = ResolveError::UnresolvableReferenceCycle {
            passes: 5,
            refs: vec!["#/definitions/X".into()],
        };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn cycle_error_lists_refs() {
        let err = ResolveError::UnresolvableReferenceCycle {
            passes: 5,
            refs: vec!["#/definitions/X".into(), "#/definitions/Y".into()],
        };
        assert_eq!(
            err.to_string(),
            "could not resolve local $refs within 5 passes (circular references?): #/definitions/X, #/definitions/Y"
        );
    }

    #[test]
    fn missing_definition_display() {
        let err = ResolveError::MissingDefinition {
            reference: "#/definitions/Ghost".into(),
            name: "Ghost".into(),
        };
        assert_eq!(
            err.to_string(),
            "definition \"Ghost\" not found for $ref #/definitions/Ghost"
        );
    }
}
