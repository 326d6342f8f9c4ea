//! erdscribe core
//!
//! Relational schema model shared by every extraction front-end, the
//! normalization pass, and the DBML / Markdown / DDL renderers.

pub mod schema;
pub mod source;
pub mod normalize;
pub mod dbml;
pub mod summary;
pub mod ddl;
pub mod config;

pub use schema::{Column, EnumType, Fragment, Ref, RelationKind, Schema, Table};
pub use source::SourceFile;
pub use normalize::{normalize, NormalizeReport};
pub use dbml::to_dbml;
pub use summary::to_summary_markdown;
pub use ddl::to_ddl;
pub use config::{
    ChunkingConfig, Config, ConfigError, DialectConfig, ExtractionMode, OracleConfig,
    OutputConfig, ScanConfig,
};
