//! # jschema
//!
//! A JSON Schema compiler and validator supporting drafts 4, 6, 7 and
//! 2019-09. Schema documents are compiled once into a graph of nodes;
//! validation walks that graph against an instance and reports every
//! failing assertion as a navigable error tree.
//!
//! Supports:
//!   - Cross-document `$ref`, nested `$id`/`id` base-URI changes, anchors
//!     and recursive references;
//!   - Meta-schema validation of compiled documents;
//!   - Exact decimal arithmetic for numeric keywords;
//!   - Pluggable resource loading and `format` predicates.
//!
//! ## Example
//!
//! ```rust
//! use jschema::Compiler;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut compiler = Compiler::new();
//!     compiler.add_resource("schema.json", &br#"{"maxLength": 5}"#[..])?;
//!     let schema = compiler.compile("schema.json")?;
//!     assert!(schema.validate(&br#""foo""#[..]).is_ok());
//!     if let Err(error) = schema.validate(&br#""foo bar""#[..]) {
//!         eprintln!("{error}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! The regex dialect for `pattern` and `patternProperties` is the one of
//! the `fancy-regex` crate, not ECMA 262: `\c` control escapes are not
//! supported and the character classes are Unicode-aware. Schemas relying
//! on ECMA-specific behavior may validate differently.
#![warn(
    clippy::doc_markdown,
    clippy::redundant_closure,
    clippy::explicit_iter_loop,
    clippy::match_same_arms,
    clippy::needless_borrow,
    clippy::print_stdout,
    missing_docs,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications
)]
mod compiler;
mod content;
mod draft;
mod error;
mod formats;
mod loader;
mod numeric;
mod paths;
mod primitive_type;
mod resource;
mod schema;
mod uri;
mod validator;

pub use compiler::{Compiler, CompilerOptions};
pub use draft::Draft;
pub use error::{CompileError, ValidateError, ValidationError, ValidationErrorKind};
pub use formats::FormatCheck;
pub use loader::{DefaultLoader, LoadErrorSource, UrlLoader};
pub use paths::{JsonPointer, PathChunk};
pub use primitive_type::{PrimitiveType, TypeSet};
pub use schema::{Annotations, Schema};

use serde_json::Value;

/// A shortcut for validating `instance` against an inline `schema`. The
/// draft is detected from `$schema`, defaulting to 2019-09.
///
/// ```rust
/// use serde_json::json;
///
/// let schema = json!({"maxLength": 5});
/// let instance = json!("foo");
/// assert!(jschema::is_valid(&schema, &instance));
/// ```
///
/// This function panics if an invalid schema is passed.
#[must_use]
pub fn is_valid(schema: &Value, instance: &Value) -> bool {
    let bytes = serde_json::to_vec(schema).expect("Valid JSON");
    let mut compiler = Compiler::new();
    compiler
        .add_resource("schema.json", bytes.as_slice())
        .expect("Invalid schema");
    compiler.must_compile("schema.json").is_valid(instance)
}
