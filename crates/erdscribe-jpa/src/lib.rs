//! JPA annotation parsing
//!
//! This crate handles:
//! - Parsing Java sources into declaration trees
//! - Recognizing persistence annotations
//! - Mapping entities, columns, keys and join tables into a schema

pub mod syntax;
pub mod annotation;
pub mod types;
pub mod extractor;

pub use syntax::{parse_compilation_unit, CompilationUnit, SyntaxError, TypeDecl, TypeKind};
pub use annotation::{Marker, Markers};
pub use types::camel_to_snake;
pub use extractor::{ExtractStats, JpaExtractor};
