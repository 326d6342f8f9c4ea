//! Post-extraction schema refinement
//!
//! A refiner sends an extracted schema back to an oracle and takes the
//! corrected tables and relationships from the reply. Enums survive from the
//! original; values the oracle adds are appended.

use crate::error::EngineError;
use erdscribe_core::{Config, Fragment, Schema};
use erdscribe_oracle::{AzureOpenAiOracle, ExtractionOracle, OracleError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Oracle-backed correction pass over a whole schema
#[derive(Clone)]
pub struct Refiner {
    oracle: Arc<dyn ExtractionOracle>,
    timeout: Duration,
    hints: String,
}

impl Refiner {
    /// Defaults: 120 second timeout, no hints
    pub fn new(oracle: Arc<dyn ExtractionOracle>) -> Self {
        Self {
            oracle,
            timeout: Duration::from_secs(120),
            hints: String::new(),
        }
    }

    /// Azure OpenAI refiner; fails when the oracle is not configured
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        let oracle = AzureOpenAiOracle::from_config(&config.oracle)?;
        Ok(Self::new(Arc::new(oracle)).with_timeout(Duration::from_secs(config.oracle.timeout_secs)))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Free-text hints sent along with the schema
    pub fn with_hints(mut self, hints: impl Into<String>) -> Self {
        self.hints = hints.into();
        self
    }

    pub fn name(&self) -> &'static str {
        self.oracle.name()
    }

    /// Ask the oracle for a corrected copy of `schema`
    ///
    /// A reply without tables for a schema that has some is rejected rather
    /// than allowed to erase the extraction.
    pub async fn refine(&self, schema: &Schema) -> Result<Schema, EngineError> {
        if self.timeout.is_zero() {
            return Err(EngineError::InvalidTimeout);
        }

        debug!(oracle = self.oracle.name(), tables = schema.table_count(), "Refining schema");

        let refined = match tokio::time::timeout(self.timeout, self.oracle.refine(schema, &self.hints)).await {
            Ok(Ok(refined)) => refined,
            Ok(Err(source)) => return Err(EngineError::Refine(source)),
            Err(_) => return Err(EngineError::RefineTimedOut(self.timeout)),
        };

        if refined.table_count() == 0 && schema.table_count() > 0 {
            return Err(EngineError::Refine(OracleError::MalformedFragment(
                "refined schema has no tables".to_string(),
            )));
        }

        let merged = apply_refinement(schema, refined);
        info!(
            tables = merged.table_count(),
            refs = merged.ref_count(),
            enums = merged.enum_count(),
            "Schema refined"
        );

        Ok(merged)
    }
}

/// Tables and refs from `refined`; enums from `original` extended by `refined`
pub fn apply_refinement(original: &Schema, refined: Fragment) -> Schema {
    let mut schema = Schema::new();

    for e in original.enums().chain(refined.enums()) {
        let target = schema.ensure_enum(e.name());
        for value in e.values() {
            target.add_value(value.as_str());
        }
        if target.note.is_none() {
            target.note = e.note.clone();
        }
    }

    for t in refined.tables() {
        let target = schema.ensure_table(t.name());
        for column in t.columns() {
            target.upsert_column(column.clone());
        }
        target.note = t.note.clone();
    }

    for r in refined.refs() {
        schema.add_ref(r.clone());
    }

    schema
}
