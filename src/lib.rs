//! Structural schema IR.
//!
//! Schemas are immutable trees of [`Schema`] handles built with the [`z`]
//! constructors and the builder methods on [`Schema`]. Around the tree:
//!
//! - [`is_equal`] / [`clone`]: structural equality and deep copy;
//! - [`get_references`] / [`dereference`] / [`ReferenceRegistry`]: named
//!   `ref` placeholders and their resolution;
//! - [`import_schema`] / [`import_document`]: JSON-Schema-style documents in;
//! - [`emit_declaration`] / [`parse_declaration`]: constructor source text out
//!   and back;
//! - [`emit_type_declaration`]: TypeScript type text out;
//! - [`export_document`]: JSON Schema out.
//!
//! ```
//! use schema_ir::{z, is_equal, clone};
//!
//! let user = z::object([("name", z::string().min(1)), ("age", z::number().int().optional())]);
//! let copy = clone(&user);
//! assert!(is_equal(&user, &copy));
//! assert!(!schema_ir::Schema::ptr_eq(&user, &copy));
//! ```
pub mod build;
pub mod checks;
pub mod clone;
pub mod deref;
pub mod emit;
pub mod equal;
pub mod error;
pub mod export;
pub mod hooks;
pub mod import;
pub mod ir;
pub mod parse;
pub mod traverse;
pub mod z;

pub use clone::clone;
pub use deref::{ReferenceRegistry, ReferenceSource, dereference, get_references};
pub use emit::{DeclarationForm, TypeDeclarationOptions, emit_declaration, emit_type_declaration};
pub use equal::is_equal;
pub use error::{Error, InvalidSchemaError, NotSerializableError, ParseError, ReferenceResolutionError};
pub use export::export_document;
pub use hooks::{ExactlyOne, Issue, KeyPattern, KeyPatterns};
pub use import::{ImportOptions, Importer, UnknownFormatPolicy, import_document, import_schema};
pub use ir::{Effect, Kind, Meta, Schema, TypeName};
pub use parse::parse_declaration;
