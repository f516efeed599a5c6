//! Schema tree - typed schema nodes attached to a document root.
//!
//! A [`SchemaNode`] is an ordered mapping of keys to [`SchemaValue`]s. Every
//! node built from a document carries a shared, read-only handle to its
//! [`RootDocument`], which is how local `$ref`s find the `definitions` table.
//! Nested mappings (directly, or inside sequences) are converted and attached
//! eagerly at construction, so a freshly built tree is fully wired before any
//! resolution runs.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::ResolveError;
use crate::loader::navigate_pointer;
use crate::types::{json_type_name, DEFINITIONS_KEY};

/// A parsed Swagger document and its `definitions` table.
#[derive(Debug, Clone)]
pub struct RootDocument {
    document: Value,
    definitions: Map<String, Value>,
}

impl RootDocument {
    /// Wrap a parsed document.
    ///
    /// A document without `definitions` gets an empty table.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::InvalidDocument` if the document isn't an object
    /// or its `definitions` value isn't an object.
    pub fn new(document: Value) -> Result<Self, ResolveError> {
        let Some(map) = document.as_object() else {
            return Err(ResolveError::InvalidDocument {
                message: format!("expected object, got {}", json_type_name(&document)),
            });
        };

        let definitions = match map.get(DEFINITIONS_KEY) {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(defs)) => defs.clone(),
            Some(other) => {
                return Err(ResolveError::InvalidDocument {
                    message: format!(
                        "definitions must be an object, got {}",
                        json_type_name(other)
                    ),
                })
            }
        };

        Ok(Self {
            document,
            definitions,
        })
    }

    /// The document as it was parsed.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// The `definitions` table, empty if the document has none.
    pub fn definitions(&self) -> &Map<String, Value> {
        &self.definitions
    }

    /// Look up a definition by name.
    pub fn definition(&self, name: &str) -> Option<&Value> {
        self.definitions.get(name)
    }

    /// Build an attached node from the value at a JSON Pointer.
    ///
    /// Accepts `#/definitions/Pet` as well as `/definitions/Pet`.
    /// An empty pointer (or `#`) selects the whole document.
    pub fn node_at(self: &Arc<Self>, pointer: &str) -> Result<SchemaNode, ResolveError> {
        let value = navigate_pointer(&self.document, pointer)?;
        SchemaNode::from_value(value, Some(self))
    }

    /// Build an attached node for a named definition.
    pub fn definition_node(self: &Arc<Self>, name: &str) -> Result<SchemaNode, ResolveError> {
        let value = self
            .definition(name)
            .ok_or_else(|| ResolveError::MissingDefinition {
                reference: format!("#/{}/{}", DEFINITIONS_KEY, name),
                name: name.to_string(),
            })?;
        SchemaNode::from_value(value, Some(self))
    }
}

/// A value inside a schema tree.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaValue {
    /// String, number, boolean or null.
    Scalar(Value),
    Sequence(Vec<SchemaValue>),
    Node(SchemaNode),
}

impl SchemaValue {
    /// Convert a JSON value, attaching every nested mapping to `root`.
    pub fn new(value: &Value, root: Option<&Arc<RootDocument>>) -> Self {
        match value {
            Value::Object(map) => SchemaValue::Node(SchemaNode::new(map, root)),
            Value::Array(items) => SchemaValue::Sequence(
                items
                    .iter()
                    .map(|item| SchemaValue::new(item, root))
                    .collect(),
            ),
            other => SchemaValue::Scalar(other.clone()),
        }
    }

    /// The nested node, if this is a mapping.
    pub fn as_node(&self) -> Option<&SchemaNode> {
        match self {
            SchemaValue::Node(node) => Some(node),
            _ => None,
        }
    }

    /// The string, if this is a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SchemaValue::Scalar(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// JSON type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            SchemaValue::Scalar(value) => json_type_name(value),
            SchemaValue::Sequence(_) => "array",
            SchemaValue::Node(_) => "object",
        }
    }

    /// Flatten into a plain JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            SchemaValue::Scalar(value) => value.clone(),
            SchemaValue::Sequence(items) => {
                Value::Array(items.iter().map(SchemaValue::to_value).collect())
            }
            SchemaValue::Node(node) => node.to_value(),
        }
    }

    fn attach_root(&mut self, root: Option<&Arc<RootDocument>>) {
        match self {
            SchemaValue::Scalar(_) => {}
            SchemaValue::Sequence(items) => {
                for item in items {
                    item.attach_root(root);
                }
            }
            SchemaValue::Node(node) => {
                node.root = root.cloned();
                node.attach_children();
            }
        }
    }
}

/// One Schema Object (or any nested mapping within one).
///
/// Keys keep insertion order. Equality compares entries only, not the root
/// handle.
#[derive(Debug, Clone, Default)]
pub struct SchemaNode {
    entries: Vec<(String, SchemaValue)>,
    root: Option<Arc<RootDocument>>,
}

impl PartialEq for SchemaNode {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl SchemaNode {
    /// Build a node from a mapping, attaching it and all nested mappings to `root`.
    pub fn new(map: &Map<String, Value>, root: Option<&Arc<RootDocument>>) -> Self {
        let entries = map
            .iter()
            .map(|(key, value)| (key.clone(), SchemaValue::new(value, root)))
            .collect();
        Self {
            entries,
            root: root.cloned(),
        }
    }

    /// Build a node from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::InvalidSchema` if the value isn't an object.
    pub fn from_value(
        value: &Value,
        root: Option<&Arc<RootDocument>>,
    ) -> Result<Self, ResolveError> {
        match value {
            Value::Object(map) => Ok(Self::new(map, root)),
            other => Err(ResolveError::InvalidSchema {
                message: format!("expected object, got {}", json_type_name(other)),
            }),
        }
    }

    /// The document this node was attached to, if any.
    pub fn root(&self) -> Option<&Arc<RootDocument>> {
        self.root.as_ref()
    }

    /// Take the parent's document root.
    ///
    /// Only this node is rewired; call [`attach_children`](Self::attach_children)
    /// to propagate to nested nodes. A parent without a root leaves this node's
    /// root untouched.
    pub fn attach(&mut self, parent: &SchemaNode) {
        if let Some(root) = parent.root.as_ref() {
            self.root = Some(Arc::clone(root));
        }
    }

    /// Propagate this node's root to every nested node.
    pub fn attach_children(&mut self) {
        let root = self.root.clone();
        for (_, value) in &mut self.entries {
            value.attach_root(root.as_ref());
        }
    }

    /// Value for a key.
    pub fn get(&self, key: &str) -> Option<&SchemaValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    /// True if the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Insert a value, replacing (in place) any existing value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: SchemaValue) -> Option<SchemaValue> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Remove a key, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<SchemaValue> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the node has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut SchemaValue)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Merge `other` into this node; keys already present here win.
    pub fn merge_missing(&mut self, other: SchemaNode) {
        for (key, value) in other.entries {
            if !self.contains_key(&key) {
                self.entries.push((key, value));
            }
        }
    }

    /// Merge `other` into this node; `other`'s keys win.
    pub fn merge_overwrite(&mut self, other: SchemaNode) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }

    /// Flatten into a plain JSON object. Doesn't touch the node.
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|(key, value)| (key.clone(), value.to_value()))
            .collect();
        Value::Object(map)
    }
}
