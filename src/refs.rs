//! Reference classification and deep `$ref` search.
//!
//! Local refs (`#/definitions/Name`) are resolved against the document;
//! remote refs carry a URI scheme (`http://`, `file://`, ...) and are left
//! untouched. The resolver's loop stops once every `$ref` left in the tree is
//! remote.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::loader::escape_segment;
use crate::tree::{SchemaNode, SchemaValue};
use crate::types::{ALL_OF_KEY, REF_KEY};

static REMOTE_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+://").expect("remote ref pattern is valid"));

/// True if the ref points outside the document (has a URI scheme).
pub fn is_remote(reference: &str) -> bool {
    REMOTE_REF.is_match(reference)
}

/// True if the ref should be resolved against `definitions`.
pub fn is_local(reference: &str) -> bool {
    !is_remote(reference)
}

/// Definition name addressed by a local ref: its last `/` segment.
///
/// `#/definitions/Pet` gives `Pet`; a bare `Pet` is returned as-is.
pub fn definition_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

/// Every `$ref` value anywhere in the subtree, in document order.
pub fn find_refs(node: &SchemaNode) -> Vec<&SchemaValue> {
    let mut found = Vec::new();
    collect_node(node, &mut found);
    found
}

/// True if every `$ref` in the subtree is a remote string.
pub fn all_refs_resolved(node: &SchemaNode) -> bool {
    find_refs(node)
        .into_iter()
        .all(|value| value.as_str().map(is_remote).unwrap_or(false))
}

/// True if an `allOf` is still waiting to be merged anywhere in the subtree.
///
/// Inlining a definition can bring in an `allOf` without any refs, so the
/// resolver checks this alongside [`all_refs_resolved`].
pub fn has_pending_all_of(node: &SchemaNode) -> bool {
    node.iter().any(|(key, value)| key == ALL_OF_KEY || value_has_all_of(value))
}

fn value_has_all_of(value: &SchemaValue) -> bool {
    match value {
        SchemaValue::Scalar(_) => false,
        SchemaValue::Sequence(items) => items.iter().any(value_has_all_of),
        SchemaValue::Node(node) => has_pending_all_of(node),
    }
}

/// The refs that still need resolving, rendered for error messages.
///
/// Non-string `$ref` values are included as their JSON text.
pub fn local_refs(node: &SchemaNode) -> Vec<String> {
    find_refs(node)
        .into_iter()
        .filter_map(|value| match value.as_str() {
            Some(s) if is_remote(s) => None,
            Some(s) => Some(s.to_string()),
            None => Some(value.to_value().to_string()),
        })
        .collect()
}

/// Local or remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    Local,
    Remote,
}

impl RefKind {
    /// Classify a ref string.
    pub fn classify(reference: &str) -> Self {
        if is_remote(reference) {
            RefKind::Remote
        } else {
            RefKind::Local
        }
    }

    /// Lowercase label, as printed by `refs`.
    pub fn as_str(&self) -> &'static str {
        match self {
            RefKind::Local => "local",
            RefKind::Remote => "remote",
        }
    }
}

/// A string `$ref` found in a raw document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefLocation {
    /// JSON Pointer to the `$ref` key.
    pub path: String,
    pub reference: String,
    pub kind: RefKind,
}

/// List every string `$ref` in a raw document with its JSON Pointer.
///
/// Non-string `$ref` values are skipped; the linter reports those.
pub fn ref_locations(document: &Value) -> Vec<RefLocation> {
    let mut found = Vec::new();
    collect_locations(document, "", &mut found);
    found
}

fn collect_locations(value: &Value, path: &str, found: &mut Vec<RefLocation>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = format!("{}/{}", path, escape_segment(key));
                if key == REF_KEY {
                    if let Value::String(reference) = child {
                        found.push(RefLocation {
                            path: child_path.clone(),
                            reference: reference.clone(),
                            kind: RefKind::classify(reference),
                        });
                    }
                }
                collect_locations(child, &child_path, found);
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                collect_locations(item, &format!("{}/{}", path, i), found);
            }
        }
        _ => {}
    }
}

fn collect_node<'a>(node: &'a SchemaNode, found: &mut Vec<&'a SchemaValue>) {
    for (key, value) in node.iter() {
        if key == REF_KEY {
            found.push(value);
        }
        collect_value(value, found);
    }
}

fn collect_value<'a>(value: &'a SchemaValue, found: &mut Vec<&'a SchemaValue>) {
    match value {
        SchemaValue::Scalar(_) => {}
        SchemaValue::Sequence(items) => {
            for item in items {
                collect_value(item, found);
            }
        }
        SchemaValue::Node(node) => collect_node(node, found),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(value: Value) -> SchemaNode {
        SchemaNode::from_value(&value, None).unwrap()
    }

    #[test]
    fn remote_refs() {
        assert!(is_remote("http://example.com/schema.json"));
        assert!(is_remote("https://example.com/schema.json#/definitions/Pet"));
        assert!(is_remote("file:///tmp/schema.json"));
        assert!(is_remote("custom_scheme://thing"));
    }

    #[test]
    fn local_refs_are_not_remote() {
        assert!(is_local("#/definitions/Pet"));
        assert!(is_local("Pet"));
        assert!(is_local("other.json#/definitions/Pet"));
        assert!(is_local("://missing-scheme"));
        assert!(is_local("mailto:someone@example.com"));
        assert!(is_local(" http://leading-space"));
    }

    #[test]
    fn definition_name_takes_last_segment() {
        assert_eq!(definition_name("#/definitions/Pet"), "Pet");
        assert_eq!(definition_name("Pet"), "Pet");
        assert_eq!(definition_name("#/definitions/"), "");
    }

    #[test]
    fn find_refs_searches_deeply() {
        let n = node(json!({
            "$ref": "#/definitions/A",
            "properties": {
                "b": { "$ref": "#/definitions/B" },
                "list": { "items": [{ "$ref": "http://example.com/c.json" }] }
            },
            "allOf": [{ "$ref": "#/definitions/D" }]
        }));
        let refs: Vec<_> = find_refs(&n).into_iter().filter_map(|v| v.as_str()).collect();
        assert_eq!(
            refs,
            vec![
                "#/definitions/A",
                "#/definitions/B",
                "http://example.com/c.json",
                "#/definitions/D"
            ]
        );
    }

    #[test]
    fn resolved_when_no_refs() {
        let n = node(json!({ "type": "object", "properties": { "a": { "type": "string" } } }));
        assert!(all_refs_resolved(&n));
    }

    #[test]
    fn resolved_when_only_remote_refs() {
        let n = node(json!({
            "properties": { "a": { "$ref": "https://example.com/a.json" } }
        }));
        assert!(all_refs_resolved(&n));
    }

    #[test]
    fn unresolved_with_local_ref() {
        let n = node(json!({
            "properties": {
                "a": { "$ref": "https://example.com/a.json" },
                "b": { "$ref": "#/definitions/B" }
            }
        }));
        assert!(!all_refs_resolved(&n));
        assert_eq!(local_refs(&n), vec!["#/definitions/B"]);
    }

    #[test]
    fn pending_all_of_found_deeply() {
        let n = node(json!({ "properties": { "a": { "items": [{ "allOf": [] }] } } }));
        assert!(has_pending_all_of(&n));

        let n = node(json!({ "properties": { "allOfThem": { "type": "string" } } }));
        assert!(!has_pending_all_of(&n));
    }

    #[test]
    fn non_string_ref_is_unresolved() {
        let n = node(json!({ "$ref": { "nested": true } }));
        assert!(!all_refs_resolved(&n));
        assert_eq!(local_refs(&n), vec![r#"{"nested":true}"#]);
    }

    #[test]
    fn ref_locations_with_paths() {
        let doc = json!({
            "paths": {
                "/pets": {
                    "get": {
                        "responses": {
                            "200": { "schema": { "$ref": "#/definitions/Pet" } },
                            "default": { "schema": { "$ref": "http://example.com/error.json" } }
                        }
                    }
                }
            },
            "definitions": {
                "Pet": { "allOf": [{ "$ref": "#/definitions/Base" }] },
                "Odd": { "$ref": 3 }
            }
        });
        let found = ref_locations(&doc);
        assert_eq!(
            found,
            vec![
                RefLocation {
                    path: "/paths/~1pets/get/responses/200/schema/$ref".into(),
                    reference: "#/definitions/Pet".into(),
                    kind: RefKind::Local,
                },
                RefLocation {
                    path: "/paths/~1pets/get/responses/default/schema/$ref".into(),
                    reference: "http://example.com/error.json".into(),
                    kind: RefKind::Remote,
                },
                RefLocation {
                    path: "/definitions/Pet/allOf/0/$ref".into(),
                    reference: "#/definitions/Base".into(),
                    kind: RefKind::Local,
                },
            ]
        );
    }
}
