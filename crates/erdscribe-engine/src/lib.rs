//! erdscribe engine
//!
//! This crate turns candidate source files into a normalized schema:
//! - Size-bounded chunk partitioning
//! - Concurrent oracle extraction with per-chunk timeouts
//! - Order-independent fragment merging
//! - The extractor pipeline selected by configuration
//! - An optional oracle refinement pass before normalization

pub mod error;
pub mod chunk;
pub mod merge;
pub mod pipeline;
pub mod refine;

pub use error::EngineError;
pub use chunk::{partition, Chunk};
pub use merge::merge_fragments;
pub use pipeline::{Extractor, OracleExtractor};
pub use refine::{apply_refinement, Refiner};
