//! Swagger Schema Resolver
//!
//! Inlines local `$ref` pointers and merges `allOf` compositions in Swagger /
//! OpenAPI 2.0 Schema Objects, producing self-contained schemas for
//! validation or code generation.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use swagger_schema::{resolve, ResolveOptions, RootDocument};
//!
//! let document = json!({
//!     "swagger": "2.0",
//!     "definitions": {
//!         "Pet": {
//!             "type": "object",
//!             "properties": {
//!                 "tag": { "$ref": "#/definitions/Tag" }
//!             }
//!         },
//!         "Tag": { "type": "string" }
//!     }
//! });
//!
//! let root = Arc::new(RootDocument::new(document).unwrap());
//! let pet = root.node_at("#/definitions/Pet").unwrap();
//! let resolved = resolve(&pet, &ResolveOptions::default()).unwrap();
//!
//! assert_eq!(resolved["properties"]["tag"], json!({ "type": "string" }));
//! ```
//!
//! # Resolution Rules
//!
//! | Construct | Effect |
//! |-----------|--------|
//! | `{"$ref": "#/definitions/X"}` | Replaced by a copy of `X`; keys already on the node win |
//! | `{"$ref": "http://..."}` | Left untouched (remote) |
//! | `{"allOf": [A, B]}` | `A` then `B` merged shallowly into the node; later keys overwrite earlier ones |
//! | Cycle among definitions | `UnresolvableReferenceCycle` after 5 passes |
//! | Unknown definition | `MissingDefinition` (or dropped with `MissingDefinitions::Drop`) |

mod error;
mod linter;
mod loader;
mod refs;
mod resolver;
mod tree;
mod types;

pub use error::ResolveError;
pub use linter::{lint, lint_file, Diagnostic, FileResult, FileStatus, LintResult, Severity};
pub use loader::{
    escape_segment, is_url, load_document, load_document_auto, load_document_str,
    navigate_pointer,
};
pub use refs::{
    all_refs_resolved, definition_name, find_refs, is_local, is_remote, local_refs,
    ref_locations, RefKind, RefLocation,
};
pub use resolver::{resolve, resolve_all_definitions, resolve_definition, resolve_document};
pub use tree::{RootDocument, SchemaNode, SchemaValue};
pub use types::{
    MissingDefinitions, ResolveOptions, ALL_OF_KEY, DEFAULT_MAX_PASSES, DEFINITIONS_KEY, REF_KEY,
};

#[cfg(feature = "remote")]
pub use loader::load_document_url;
