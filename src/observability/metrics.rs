use prometheus::{Encoder, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub store_calls_total: IntCounterVec,
    pub store_call_latency_seconds: HistogramVec,
    pub workflow_transitions_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let store_calls_total = IntCounterVec::new(
            Opts::new("store_calls_total", "Store calls by kind and outcome"),
            &["kind", "outcome"],
        )
        .expect("valid store_calls_total metric");

        let store_call_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "store_call_latency_seconds",
                "Latency of store calls in seconds",
            ),
            &["kind"],
        )
        .expect("valid store_call_latency_seconds metric");

        let workflow_transitions_total = IntCounterVec::new(
            Opts::new(
                "workflow_transitions_total",
                "Workflow procedure invocations by outcome",
            ),
            &["procedure", "outcome"],
        )
        .expect("valid workflow_transitions_total metric");

        registry
            .register(Box::new(store_calls_total.clone()))
            .expect("register store_calls_total");
        registry
            .register(Box::new(store_call_latency_seconds.clone()))
            .expect("register store_call_latency_seconds");
        registry
            .register(Box::new(workflow_transitions_total.clone()))
            .expect("register workflow_transitions_total");

        Self {
            registry,
            store_calls_total,
            store_call_latency_seconds,
            workflow_transitions_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
