//! Engine errors

use erdscribe_oracle::OracleError;
use std::time::Duration;

/// Errors that abort an extraction run
///
/// Chunk indices are zero-based positions in partition order; messages show
/// them one-based.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Chunk budget must be a positive number of characters")]
    InvalidBudget,

    #[error("Oracle call timeout must be longer than zero")]
    InvalidTimeout,

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("Chunk {} of {total} failed: {source}", .index + 1)]
    Chunk {
        index: usize,
        total: usize,
        #[source]
        source: OracleError,
    },

    #[error("Chunk {} of {total} timed out after {timeout:?}", .index + 1)]
    ChunkTimedOut {
        index: usize,
        total: usize,
        timeout: Duration,
    },

    #[error("Schema refinement failed: {0}")]
    Refine(#[source] OracleError),

    #[error("Schema refinement timed out after {0:?}")]
    RefineTimedOut(Duration),

    #[error("Extraction task failed: {0}")]
    Task(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_one_based() {
        let err = EngineError::Chunk {
            index: 1,
            total: 3,
            source: OracleError::Request("connection reset".into()),
        };
        assert_eq!(
            err.to_string(),
            "Chunk 2 of 3 failed: Oracle request failed: connection reset"
        );

        let err = EngineError::ChunkTimedOut {
            index: 0,
            total: 1,
            timeout: Duration::from_secs(5),
        };
        assert_eq!(err.to_string(), "Chunk 1 of 1 timed out after 5s");
    }
}
