//! Extraction oracle trait

use erdscribe_core::Fragment;

/// Errors that can occur when asking an oracle for a fragment
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("Oracle configuration error: {0}")]
    Configuration(String),

    #[error("Oracle request failed: {0}")]
    Request(String),

    #[error("Oracle returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed fragment: {0}")]
    MalformedFragment(String),
}

/// A text-to-schema extraction capability
///
/// Implementations analyze one rendered batch of source files and return the
/// schema fragment it describes. Results are treated as non-deterministic;
/// the caller merges fragments from many batches.
#[async_trait::async_trait]
pub trait ExtractionOracle: Send + Sync {
    /// Oracle name for logs (e.g., "AzureOpenAI", "Mock")
    fn name(&self) -> &'static str;

    /// Extract a schema fragment from one rendered batch
    async fn extract(&self, batch_text: &str) -> Result<Fragment, OracleError>;

    /// Return a corrected copy of an already extracted schema
    ///
    /// `hints` is free text passed along with the schema.
    async fn refine(&self, schema: &Fragment, hints: &str) -> Result<Fragment, OracleError>;
}
