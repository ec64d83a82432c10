use std::sync::Arc;

use crate::observability::metrics::Metrics;
use crate::store::{Instrumented, Store};

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub metrics: Metrics,
    pub static_dir: String,
}

impl AppState {
    /// Wraps `store` so every call is counted and timed.
    pub fn new(store: Arc<dyn Store>) -> Self {
        let metrics = Metrics::new();
        let store: Arc<dyn Store> = Arc::new(Instrumented::new(store, metrics.clone()));

        Self {
            store,
            metrics,
            static_dir: "frontend/static".to_string(),
        }
    }

    pub fn with_static_dir(mut self, static_dir: impl Into<String>) -> Self {
        self.static_dir = static_dir.into();
        self
    }
}
