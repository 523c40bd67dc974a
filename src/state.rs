// =============================================================================
// MonitorState — shared application state
// =============================================================================
//
// Ties the metric store, alert engine, and live configuration together
// behind one `Arc` so the API handlers and the collector tasks all share the
// same instances, following the shape of the engine's former central
// application state (config under `RwLock`, subsystems under their own
// `Arc`).
// =============================================================================

use std::sync::Arc;

use parking_lot::RwLock;

use crate::alert_engine::AlertEngine;
use crate::config::MonitorConfig;
use crate::metric_store::MetricStore;

/// Shared state handed to every API handler and background task.
pub struct MonitorState {
    pub config: RwLock<MonitorConfig>,
    pub metric_store: Arc<MetricStore>,
    pub alert_engine: Arc<AlertEngine>,
    pub start_time: std::time::Instant,
}

impl MonitorState {
    /// Build shared state from `config` and an already-constructed alert
    /// engine (the caller also holds the engine's event receiver, handed
    /// separately to [`crate::alert_engine::run_dispatcher`]).
    pub fn new(config: MonitorConfig, alert_engine: Arc<AlertEngine>) -> Arc<Self> {
        let metric_store = Arc::new(MetricStore::new(config.collector.memory_max_size));
        Arc::new(Self {
            config: RwLock::new(config),
            metric_store,
            alert_engine,
            start_time: std::time::Instant::now(),
        })
    }

    /// Seconds since this state (and therefore the process) started.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
