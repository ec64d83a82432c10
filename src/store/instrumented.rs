use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::observability::metrics::Metrics;
use crate::store::{Read, Row, SqlArg, Store, StoreError};

/// Wraps a store with call counters, latency histograms and debug logs.
pub struct Instrumented {
    inner: Arc<dyn Store>,
    metrics: Metrics,
}

impl Instrumented {
    pub fn new(inner: Arc<dyn Store>, metrics: Metrics) -> Self {
        Self { inner, metrics }
    }

    fn observe<T>(&self, kind: &str, start: Instant, result: &Result<T, StoreError>) {
        self.metrics
            .store_call_latency_seconds
            .with_label_values(&[kind])
            .observe(start.elapsed().as_secs_f64());
        self.metrics
            .store_calls_total
            .with_label_values(&[kind, outcome(result)])
            .inc();
    }
}

fn outcome<T>(result: &Result<T, StoreError>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(StoreError::Rejected { .. }) => "rejected",
        Err(StoreError::Unavailable(_)) => "unavailable",
        Err(_) => "error",
    }
}

#[async_trait]
impl Store for Instrumented {
    async fn query(&self, read: &Read) -> Result<Vec<Row>, StoreError> {
        let start = Instant::now();
        let result = self.inner.query(read).await;
        self.observe("query", start, &result);

        debug!(
            read = read.name(),
            rows = result.as_ref().map(Vec::len).unwrap_or(0),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "read finished"
        );
        result
    }

    async fn call_procedure(&self, name: &str, args: &[SqlArg]) -> Result<(), StoreError> {
        let start = Instant::now();
        let result = self.inner.call_procedure(name, args).await;
        self.observe("procedure", start, &result);
        self.metrics
            .workflow_transitions_total
            .with_label_values(&[name, outcome(&result)])
            .inc();

        debug!(
            procedure = %name,
            outcome = outcome(&result),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "procedure finished"
        );
        result
    }

    async fn call_function(&self, name: &str, args: &[SqlArg]) -> Result<Option<Value>, StoreError> {
        let start = Instant::now();
        let result = self.inner.call_function(name, args).await;
        self.observe("function", start, &result);

        debug!(function = %name, outcome = outcome(&result), "function finished");
        result
    }
}
