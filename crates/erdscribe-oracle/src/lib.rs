//! Extraction oracles
//!
//! An oracle turns a rendered batch of source files into a schema fragment.
//! This crate provides the trait, the strict reply format, the instruction
//! payloads for extraction and refinement, an Azure OpenAI client and an
//! in-memory mock.
//!
//! ## Example
//!
//! ```rust,ignore
//! use erdscribe_oracle::{AzureOpenAiOracle, ExtractionOracle, render_batch};
//!
//! let oracle = AzureOpenAiOracle::from_config(&config.oracle)?;
//! let fragment = oracle.extract(&render_batch(&files)).await?;
//! ```

pub mod adapter;
pub mod fragment;
pub mod prompt;
pub mod azure;
pub mod mock;

pub use adapter::{ExtractionOracle, OracleError};
pub use fragment::{parse_fragment, WireFragment};
pub use prompt::{refine_prompt, render_batch, user_prompt, REFINE_SYSTEM_PROMPT, SYSTEM_PROMPT};
pub use azure::AzureOpenAiOracle;
pub use mock::{MockOracle, MockOracleBuilder};
