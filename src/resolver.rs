//! Schema resolution - inlines local `$ref`s and merges `allOf` compositions.
//!
//! Resolution is a bounded fixed-point search. Each pass merges `allOf`
//! members, recurses into every child node and finally inlines the node's own
//! local `$ref`. Content inlined in one pass may itself carry refs (chains,
//! refs inside a definition's properties), which the next pass picks up. If
//! local refs survive `max_passes` passes the definitions are assumed to be
//! circular and resolution fails.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::ResolveError;
use crate::loader::escape_segment;
use crate::refs::{
    all_refs_resolved, definition_name, has_pending_all_of, is_remote, local_refs,
};
use crate::tree::{RootDocument, SchemaNode, SchemaValue};
use crate::types::{MissingDefinitions, ResolveOptions, ALL_OF_KEY, REF_KEY};

/// Resolve a schema node into a plain, self-contained JSON value.
///
/// The node is cloned first; the caller's tree is never modified. Remote refs
/// survive verbatim.
///
/// # Errors
///
/// Returns `ResolveError::UnresolvableReferenceCycle` if local refs remain
/// after `options.max_passes` passes, `ResolveError::MissingDefinition` for a
/// ref to an unknown definition (unless `MissingDefinitions::Drop`), and
/// `ResolveError::DetachedSchema` for a local ref on a node with no root.
pub fn resolve(node: &SchemaNode, options: &ResolveOptions) -> Result<Value, ResolveError> {
    let mut schema = node.clone();

    if let Some(reference) = take_local_ref(&mut schema, "")? {
        inline_definition(&mut schema, &reference, options)?;
    }

    let max_passes = options.max_passes.max(1);
    for pass in 1..=max_passes {
        resolve_node(&mut schema, options, "")?;

        if all_refs_resolved(&schema) {
            // An allOf inlined by this pass's refs is merged without spending a pass
            if has_pending_all_of(&schema) {
                resolve_node(&mut schema, options, "")?;
            }
            debug!(pass, "all local $refs resolved");
            return Ok(schema.to_value());
        }
        debug!(
            pass,
            remaining = local_refs(&schema).len(),
            "local $refs remain after pass"
        );
    }

    let mut refs = local_refs(&schema);
    refs.sort();
    refs.dedup();
    Err(ResolveError::UnresolvableReferenceCycle {
        passes: max_passes,
        refs,
    })
}

/// Resolve a named entry of the document's `definitions`.
pub fn resolve_definition(
    root: &Arc<RootDocument>,
    name: &str,
    options: &ResolveOptions,
) -> Result<Value, ResolveError> {
    let node = root.definition_node(name)?;
    resolve(&node, options)
}

/// Resolve every definition, keyed by name in document order.
///
/// Fails on the first definition that can't be resolved.
pub fn resolve_all_definitions(
    root: &Arc<RootDocument>,
    options: &ResolveOptions,
) -> Result<Map<String, Value>, ResolveError> {
    let mut resolved = Map::new();
    for name in root.definitions().keys() {
        resolved.insert(name.clone(), resolve_definition(root, name, options)?);
    }
    Ok(resolved)
}

/// Resolve the schema at a JSON Pointer within a raw document.
///
/// An empty pointer resolves the whole document.
pub fn resolve_document(
    document: &Value,
    pointer: &str,
    options: &ResolveOptions,
) -> Result<Value, ResolveError> {
    let root = Arc::new(RootDocument::new(document.clone())?);
    let node = root.node_at(pointer)?;
    resolve(&node, options)
}

// --- Internal implementation ---

/// One resolution pass over a node and its subtree.
fn resolve_node(
    node: &mut SchemaNode,
    options: &ResolveOptions,
    path: &str,
) -> Result<(), ResolveError> {
    if let Some(all_of) = node.remove(ALL_OF_KEY) {
        let all_of_path = format!("{}/{}", path, ALL_OF_KEY);
        let merged = merge_all_of(all_of, node, options, &all_of_path)?;
        node.merge_overwrite(merged);
    }

    for (key, child) in node.iter_mut() {
        let child_path = format!("{}/{}", path, escape_segment(key));
        resolve_value(child, options, &child_path)?;
    }

    if let Some(reference) = take_local_ref(node, path)? {
        inline_definition(node, &reference, options)?;
    }

    Ok(())
}

fn resolve_value(
    value: &mut SchemaValue,
    options: &ResolveOptions,
    path: &str,
) -> Result<(), ResolveError> {
    match value {
        SchemaValue::Node(node) => resolve_node(node, options, path),
        SchemaValue::Sequence(items) => {
            for (i, item) in items.iter_mut().enumerate() {
                let item_path = format!("{}/{}", path, i);
                resolve_value(item, options, &item_path)?;
            }
            Ok(())
        }
        // Scalars have nothing to resolve
        SchemaValue::Scalar(_) => Ok(()),
    }
}

/// Resolve each `allOf` member and fold them together, later members winning.
fn merge_all_of(
    all_of: SchemaValue,
    parent: &SchemaNode,
    options: &ResolveOptions,
    path: &str,
) -> Result<SchemaNode, ResolveError> {
    let members = match all_of {
        SchemaValue::Sequence(members) => members,
        other => {
            return Err(ResolveError::InvalidSchema {
                message: format!("{}: expected array, got {}", path, other.type_name()),
            })
        }
    };

    let mut merged = SchemaNode::default();
    for (i, member) in members.into_iter().enumerate() {
        let member_path = format!("{}/{}", path, i);
        let mut member = match member {
            SchemaValue::Node(member) => member,
            other => {
                return Err(ResolveError::InvalidSchema {
                    message: format!(
                        "{}: expected object, got {}",
                        member_path,
                        other.type_name()
                    ),
                })
            }
        };

        member.attach(parent);
        resolve_node(&mut member, options, &member_path)?;
        merged.merge_overwrite(member);
    }

    Ok(merged)
}

/// Remove and return the node's `$ref` if it is local. Remote refs stay put.
fn take_local_ref(node: &mut SchemaNode, path: &str) -> Result<Option<String>, ResolveError> {
    let Some(value) = node.get(REF_KEY) else {
        return Ok(None);
    };

    let Some(reference) = value.as_str() else {
        return Err(ResolveError::InvalidReference {
            path: format!("{}/{}", path, REF_KEY),
            actual: value.type_name().to_string(),
        });
    };

    if is_remote(reference) {
        return Ok(None);
    }

    let reference = reference.to_string();
    node.remove(REF_KEY);
    Ok(Some(reference))
}

/// Merge a fresh copy of the referenced definition into the node.
///
/// Keys already on the node win over the definition's.
fn inline_definition(
    node: &mut SchemaNode,
    reference: &str,
    options: &ResolveOptions,
) -> Result<(), ResolveError> {
    let root = node
        .root()
        .cloned()
        .ok_or_else(|| ResolveError::DetachedSchema {
            reference: reference.to_string(),
        })?;

    let name = definition_name(reference);
    match root.definition(name) {
        Some(definition) => {
            let definition = SchemaNode::from_value(definition, Some(&root))?;
            node.merge_missing(definition);
        }
        None => match options.missing_definitions {
            MissingDefinitions::Error => {
                return Err(ResolveError::MissingDefinition {
                    reference: reference.to_string(),
                    name: name.to_string(),
                });
            }
            MissingDefinitions::Drop => {
                warn!(reference, "dropping $ref to missing definition");
            }
        },
    }

    Ok(())
}
