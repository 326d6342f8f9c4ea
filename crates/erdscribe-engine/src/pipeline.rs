//! Extraction pipeline
//!
//! Candidate files go through one of two extractors, then the normalizer:
//!
//! - [`Extractor::Static`] parses annotated sources directly
//! - [`Extractor::Oracle`] partitions the files into chunks, sends each chunk to
//!   an [`ExtractionOracle`] concurrently and merges the returned fragments
//!
//! A run either returns a complete schema or an error; partial results are
//! never returned. An optional [`Refiner`] pass sits between extraction and
//! normalization.

use crate::chunk::partition;
use crate::error::EngineError;
use crate::merge::merge_fragments;
use crate::refine::Refiner;
use erdscribe_core::{normalize, Config, ExtractionMode, Fragment, NormalizeReport, Schema, SourceFile};
use erdscribe_jpa::JpaExtractor;
use erdscribe_oracle::{AzureOpenAiOracle, ExtractionOracle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Chunked, concurrent extraction through an oracle
#[derive(Clone)]
pub struct OracleExtractor {
    oracle: Arc<dyn ExtractionOracle>,
    max_chars: usize,
    max_concurrency: usize,
    timeout: Duration,
}

impl OracleExtractor {
    /// Defaults: one call at a time, 120 second timeout
    pub fn new(oracle: Arc<dyn ExtractionOracle>, max_chars: usize) -> Self {
        Self {
            oracle,
            max_chars,
            max_concurrency: 1,
            timeout: Duration::from_secs(120),
        }
    }

    /// Budget, concurrency and timeout from configuration
    pub fn from_config(oracle: Arc<dyn ExtractionOracle>, config: &Config) -> Self {
        Self::new(oracle, config.chunking.max_chars)
            .with_max_concurrency(config.oracle.max_concurrency)
            .with_timeout(Duration::from_secs(config.oracle.timeout_secs))
    }

    /// Upper bound on in-flight oracle calls (at least one)
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Per-call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn extract(&self, files: &[SourceFile]) -> Result<Schema, EngineError> {
        if self.timeout.is_zero() {
            return Err(EngineError::InvalidTimeout);
        }
        let chunks = partition(files, self.max_chars)?;
        let total = chunks.len();

        info!(
            files = files.len(),
            chunks = total,
            oracle = self.oracle.name(),
            max_concurrency = self.max_concurrency,
            "Starting chunked extraction"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();

        for chunk in &chunks {
            let batch = chunk.render();
            let index = chunk.index;
            let chars = chunk.chars;
            let timeout = self.timeout;
            let oracle = Arc::clone(&self.oracle);
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| EngineError::Task(e.to_string()))?;

                debug!(chunk = index + 1, total, chars, "Dispatching chunk");

                match tokio::time::timeout(timeout, oracle.extract(&batch)).await {
                    Ok(Ok(fragment)) => Ok((index, fragment)),
                    Ok(Err(source)) => Err(EngineError::Chunk { index, total, source }),
                    Err(_) => Err(EngineError::ChunkTimedOut { index, total, timeout }),
                }
            });
        }

        // Dropping the set on an early return aborts the remaining calls
        let mut fragments: Vec<Option<Fragment>> = (0..total).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let (index, fragment) = joined.map_err(|e| EngineError::Task(e.to_string()))??;
            debug!(
                chunk = index + 1,
                total,
                tables = fragment.table_count(),
                refs = fragment.ref_count(),
                "Chunk extracted"
            );
            fragments[index] = Some(fragment);
        }

        let schema = merge_fragments(fragments.into_iter().flatten());
        info!(
            tables = schema.table_count(),
            refs = schema.ref_count(),
            enums = schema.enum_count(),
            "Merged chunk fragments"
        );

        Ok(schema)
    }
}

/// The closed set of extraction strategies
#[derive(Clone)]
pub enum Extractor {
    Static(JpaExtractor),
    Oracle(OracleExtractor),
}

impl Extractor {
    /// Select the extractor named by `config.mode`
    ///
    /// Oracle mode fails here, before any batch is sent, when the oracle is
    /// not configured.
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        match config.mode {
            ExtractionMode::Static => Ok(Self::Static(JpaExtractor::new())),
            ExtractionMode::Oracle => {
                let oracle = AzureOpenAiOracle::from_config(&config.oracle)?;
                Ok(Self::Oracle(OracleExtractor::from_config(Arc::new(oracle), config)))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Static(_) => "static",
            Self::Oracle(_) => "oracle",
        }
    }

    /// Extract a schema without normalizing it
    pub async fn extract(&self, files: &[SourceFile]) -> Result<Schema, EngineError> {
        match self {
            Self::Static(extractor) => Ok(extractor.extract(files)),
            Self::Oracle(extractor) => extractor.extract(files).await,
        }
    }

    /// Extract and normalize
    pub async fn run(&self, files: &[SourceFile]) -> Result<(Schema, NormalizeReport), EngineError> {
        let schema = self.extract(files).await?;
        Ok(self.finish(schema))
    }

    /// Extract, refine, then normalize
    ///
    /// Refinement is best effort: when it fails the extracted schema is kept.
    pub async fn run_refined(
        &self,
        files: &[SourceFile],
        refiner: &Refiner,
    ) -> Result<(Schema, NormalizeReport), EngineError> {
        let extracted = self.extract(files).await?;
        let schema = match refiner.refine(&extracted).await {
            Ok(refined) => refined,
            Err(e) => {
                warn!(refiner = refiner.name(), error = %e, "Keeping unrefined schema");
                extracted
            }
        };
        Ok(self.finish(schema))
    }

    fn finish(&self, mut schema: Schema) -> (Schema, NormalizeReport) {
        let report = normalize(&mut schema);

        info!(
            extractor = self.name(),
            tables = schema.table_count(),
            refs = schema.ref_count(),
            created_tables = report.created_tables.len(),
            injected_keys = report.injected_keys.len(),
            "Extraction run complete"
        );

        (schema, report)
    }
}
