//! Mock extraction oracle for testing
//!
//! Replies are scripted by matching a key (typically a file path) against the
//! batch text, or against the rendered request for a refinement. Nothing
//! leaves the process. It's useful for:
//! - Unit testing the chunked pipeline and the merger
//! - Simulating slow or failing batches
//! - Checking how many calls run at once
//!
//! ## Usage
//!
//! ```rust,ignore
//! use erdscribe_oracle::{MockOracle, ExtractionOracle};
//!
//! let oracle = MockOracle::builder()
//!     .with_reply("User.java", users_fragment)
//!     .with_error("Broken.java", OracleError::Request("connection reset".into()))
//!     .with_latency(50)
//!     .build();
//! ```

use crate::adapter::{ExtractionOracle, OracleError};
use crate::prompt::refine_prompt;
use erdscribe_core::Fragment;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory oracle with scripted replies
///
/// Every reply whose key occurs in the batch text contributes to the returned
/// fragment. A matching error key wins over replies. Batches matching nothing
/// yield an empty fragment.
#[derive(Clone)]
pub struct MockOracle {
    replies: Arc<Vec<(String, Fragment)>>,
    errors: Arc<Vec<(String, OracleError)>>,
    latency_ms: u64,
    calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl MockOracle {
    /// A mock that answers every batch with an empty fragment
    pub fn new() -> Self {
        MockOracleBuilder::new().build()
    }

    pub fn builder() -> MockOracleBuilder {
        MockOracleBuilder::new()
    }

    /// Number of `extract` calls so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed running at the same time
    pub fn peak_concurrency(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn respond(&self, batch_text: &str) -> Result<Fragment, OracleError> {
        if let Some((_, error)) = self.errors.iter().find(|(key, _)| batch_text.contains(key.as_str())) {
            return Err(error.clone());
        }

        let mut fragment = Fragment::new();
        for (_, reply) in self.replies.iter().filter(|(key, _)| batch_text.contains(key.as_str())) {
            absorb(&mut fragment, reply);
        }
        Ok(fragment)
    }
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy every table, column, ref and enum of `from` into `into`
fn absorb(into: &mut Fragment, from: &Fragment) {
    for e in from.enums() {
        let target = into.ensure_enum(e.name());
        for value in e.values() {
            target.add_value(value.as_str());
        }
        if target.note.is_none() {
            target.note = e.note.clone();
        }
    }
    for t in from.tables() {
        let target = into.ensure_table(t.name());
        for column in t.columns() {
            target.upsert_column(column.clone());
        }
        if target.note.is_none() {
            target.note = t.note.clone();
        }
    }
    for r in from.refs() {
        into.add_ref(r.clone());
    }
}

/// Decrements the in-flight counter when a call finishes or is cancelled
struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ExtractionOracle for MockOracle {
    fn name(&self) -> &'static str {
        "Mock"
    }

    async fn extract(&self, batch_text: &str) -> Result<Fragment, OracleError> {
        self.call(batch_text).await
    }

    /// Replies are matched against the rendered refinement request
    async fn refine(&self, schema: &Fragment, hints: &str) -> Result<Fragment, OracleError> {
        let request = refine_prompt(schema, hints)?;
        self.call(&request).await
    }
}

impl MockOracle {
    async fn call(&self, text: &str) -> Result<Fragment, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(Arc::clone(&self.in_flight));

        if self.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;
        }

        self.respond(text)
    }
}

/// Builder for [`MockOracle`]
#[derive(Default)]
pub struct MockOracleBuilder {
    replies: Vec<(String, Fragment)>,
    errors: Vec<(String, OracleError)>,
    latency_ms: u64,
}

impl MockOracleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contribute `fragment` to every batch containing `key`
    pub fn with_reply(mut self, key: impl Into<String>, fragment: Fragment) -> Self {
        self.replies.push((key.into(), fragment));
        self
    }

    /// Fail every batch containing `key`
    pub fn with_error(mut self, key: impl Into<String>, error: OracleError) -> Self {
        self.errors.push((key.into(), error));
        self
    }

    /// Delay every call by `latency_ms` milliseconds
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn build(self) -> MockOracle {
        MockOracle {
            replies: Arc::new(self.replies),
            errors: Arc::new(self.errors),
            latency_ms: self.latency_ms,
            calls: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }
}
