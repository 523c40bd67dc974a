// =============================================================================
// Collector — periodic metric producer contract
// =============================================================================
//
// A small async trait rather than an inheritance hierarchy (§9): concrete
// collectors share only a name and a `run` entry point. Grounded on the
// exit monitor's ticker-loop shape (`exit::monitor::run_exit_monitor`),
// generalized with a `CancellationToken` suspension point per §5.
// =============================================================================

pub mod account;
pub mod network;

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::alert_engine::AlertEngine;
use crate::metric_store::MetricStore;

/// Default collector tick period (§4.3), overridable via `COLLECTOR_INTERVAL`.
pub const DEFAULT_INTERVAL_SECS: u64 = 30;

/// A named long-running metric producer.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Human-readable name, used in logs.
    fn name(&self) -> &str;

    /// Run until `ctx` is cancelled or an unrecoverable error occurs.
    /// Ticks never overlap within one collector.
    async fn run(
        &self,
        ctx: CancellationToken,
        store: Arc<MetricStore>,
        engine: Arc<AlertEngine>,
    ) -> anyhow::Result<()>;
}

/// Store then alert-check one metric, logging either failure without
/// aborting the caller's cycle (§4.3.1 step 4, §4.3.2 step 3).
///
/// Neither operation in this crate actually returns an error today, but the
/// call sites are written against this helper so a future fallible store
/// backend doesn't change every collector.
pub(crate) fn store_and_check(store: &MetricStore, engine: &AlertEngine, metric: crate::types::Metric) {
    store.store(metric.clone());
    engine.check(&metric);
}
