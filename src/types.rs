//! Core types and constants for Swagger schema resolution.

use serde_json::Value;

/// Key holding a schema reference.
pub const REF_KEY: &str = "$ref";

/// Composition keyword merged away during resolution.
pub const ALL_OF_KEY: &str = "allOf";

/// Key of the definitions table on a Swagger 2.0 document.
pub const DEFINITIONS_KEY: &str = "definitions";

/// Upper bound on resolution passes before giving up on a cycle.
pub const DEFAULT_MAX_PASSES: usize = 5;

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// What to do when a local `$ref` names a definition that doesn't exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MissingDefinitions {
    /// Fail with `ResolveError::MissingDefinition`.
    #[default]
    Error,
    /// Drop the `$ref` key and inline nothing.
    Drop,
}

/// Options for schema resolution.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Maximum number of resolution passes. Always at least 1.
    pub max_passes: usize,
    /// Behavior for refs to unknown definitions.
    pub missing_definitions: MissingDefinitions,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolveOptions {
    /// Create options with the default pass bound and strict missing-definition handling.
    pub fn new() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
            missing_definitions: MissingDefinitions::Error,
        }
    }

    /// Set the pass bound. Zero is treated as one.
    pub fn max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes.max(1);
        self
    }

    /// Set missing-definition handling.
    pub fn missing_definitions(mut self, policy: MissingDefinitions) -> Self {
        self.missing_definitions = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_options() {
        let opts = ResolveOptions::default();
        assert_eq!(opts.max_passes, 5);
        assert_eq!(opts.missing_definitions, MissingDefinitions::Error);
    }

    #[test]
    fn max_passes_clamped_to_one() {
        let opts = ResolveOptions::new().max_passes(0);
        assert_eq!(opts.max_passes, 1);

        let opts = ResolveOptions::new().max_passes(12);
        assert_eq!(opts.max_passes, 12);
    }

    #[test]
    fn json_type_names() {
        assert_eq!(json_type_name(&json!(null)), "null");
        assert_eq!(json_type_name(&json!(1)), "number");
        assert_eq!(json_type_name(&json!({})), "object");
        assert_eq!(json_type_name(&json!([])), "array");
    }
}
