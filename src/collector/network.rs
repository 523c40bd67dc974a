// =============================================================================
// NetworkCollector — consensus node address book metrics
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::{interval, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::alert_engine::AlertEngine;
use crate::gateway::LedgerGateway;
use crate::metric_store::MetricStore;
use crate::types::Metric;

use super::{store_and_check, Collector};

/// Samples the consensus node address book (§4.3.2).
pub struct NetworkCollector {
    network_name: String,
    gateway: Arc<dyn LedgerGateway>,
    interval_secs: u64,
}

impl NetworkCollector {
    pub fn new(network_name: String, gateway: Arc<dyn LedgerGateway>, interval_secs: u64) -> Self {
        Self {
            network_name,
            gateway,
            interval_secs,
        }
    }

    async fn tick(&self, store: &MetricStore, engine: &AlertEngine) {
        let mut network_labels = HashMap::new();
        network_labels.insert("network".to_string(), self.network_name.clone());

        match self.gateway.get_node_address_book().await {
            Ok(book) => {
                store_and_check(
                    store,
                    engine,
                    Metric::new("network_nodes_available", book.nodes.len() as f64, network_labels.clone()),
                );

                for node in &book.nodes {
                    let mut node_labels = network_labels.clone();
                    node_labels.insert("node_id".to_string(), node.node_id.clone());
                    node_labels.insert("node_account_id".to_string(), node.account_id.clone());

                    store_and_check(store, engine, Metric::new("network_node_available", 1.0, node_labels.clone()));
                    store_and_check(
                        store,
                        engine,
                        Metric::new("network_node_endpoints", node.addresses.len() as f64, node_labels),
                    );
                }

                store_and_check(store, engine, Metric::new("network_consensus_active", 1.0, network_labels));
            }
            Err(e) => {
                warn!(error = %e, "node address book query failed");
                store_and_check(store, engine, Metric::new("network_consensus_active", 0.0, network_labels));
            }
        }
    }
}

#[async_trait]
impl Collector for NetworkCollector {
    fn name(&self) -> &str {
        "network"
    }

    async fn run(
        &self,
        ctx: CancellationToken,
        store: Arc<MetricStore>,
        engine: Arc<AlertEngine>,
    ) -> anyhow::Result<()> {
        info!(interval_secs = self.interval_secs, network = %self.network_name, "network collector starting");
        let mut ticker = interval(Duration::from_secs(self.interval_secs.max(1)));

        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    info!("network collector shutting down");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    self.tick(&store, &engine).await;
                }
            }
        }
    }
}
