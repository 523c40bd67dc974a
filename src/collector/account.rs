// =============================================================================
// AccountCollector — per-account balance, record, and volume metrics
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::{interval, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::alert_engine::AlertEngine;
use crate::config::AccountConfig;
use crate::gateway::LedgerGateway;
use crate::metric_store::MetricStore;
use crate::types::Metric;

use super::{store_and_check, Collector};

/// Number of recent transaction records fetched per account per tick (§4.3.1).
const RECORDS_PER_TICK: usize = 50;

/// Samples account balances, transaction counts, and volume (§4.3.1).
pub struct AccountCollector {
    accounts: Vec<AccountConfig>,
    gateway: Arc<dyn LedgerGateway>,
    interval_secs: u64,
}

impl AccountCollector {
    pub fn new(accounts: Vec<AccountConfig>, gateway: Arc<dyn LedgerGateway>, interval_secs: u64) -> Self {
        Self {
            accounts,
            gateway,
            interval_secs,
        }
    }

    async fn tick(&self, store: &MetricStore, engine: &AlertEngine) -> anyhow::Result<()> {
        for account in &self.accounts {
            let label = account.label.clone().unwrap_or_default();

            // Balance errors abort the whole cycle — fundamental connectivity
            // issues are treated as fatal rather than skipped (§4.3.1 step 1,
            // §9 open question: this asymmetry with the records policy below
            // is intentional per the source).
            let balance = self.gateway.get_account_balance(&account.account_id).await?;

            let mut labels = HashMap::new();
            labels.insert("account_id".to_string(), account.account_id.clone());
            labels.insert("label".to_string(), label.clone());

            store_and_check(store, engine, Metric::new("account_balance", balance, labels.clone()));

            match self.gateway.get_account_records(&account.account_id, RECORDS_PER_TICK).await {
                Ok(records) => {
                    store_and_check(
                        store,
                        engine,
                        Metric::new("account_transaction_count", records.len() as f64, labels.clone()),
                    );

                    let mut type_counts: HashMap<String, u64> = HashMap::new();
                    let mut total_volume = 0.0;
                    for record in &records {
                        *type_counts.entry(record.kind.to_string()).or_insert(0) += 1;
                        total_volume += record.amount_tinybar;
                    }

                    for (transaction_type, count) in type_counts {
                        let mut type_labels = labels.clone();
                        type_labels.insert("transaction_type".to_string(), transaction_type);
                        store_and_check(
                            store,
                            engine,
                            Metric::new("account_transaction_type_count", count as f64, type_labels),
                        );
                    }

                    store_and_check(
                        store,
                        engine,
                        Metric::new("account_total_volume", total_volume, labels),
                    );
                }
                Err(e) => {
                    // Records errors are degraded, not fatal — log and move on
                    // to the next account (§4.3.1 step 2).
                    warn!(account_id = %account.account_id, error = %e, "account records query failed");
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Collector for AccountCollector {
    fn name(&self) -> &str {
        "account"
    }

    async fn run(
        &self,
        ctx: CancellationToken,
        store: Arc<MetricStore>,
        engine: Arc<AlertEngine>,
    ) -> anyhow::Result<()> {
        info!(interval_secs = self.interval_secs, accounts = self.accounts.len(), "account collector starting");
        let mut ticker = interval(Duration::from_secs(self.interval_secs.max(1)));

        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    info!("account collector shutting down");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.tick(&store, &engine).await {
                        error!(error = %e, "account collector cycle aborted");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{NodeAddressBook, TransactionRecord, TransactionType};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeGateway {
        balance: f64,
        records: Vec<TransactionRecord>,
        record_calls: AtomicUsize,
        fail_records: bool,
    }

    #[async_trait]
    impl LedgerGateway for FakeGateway {
        async fn get_account_balance(&self, _account_id: &str) -> anyhow::Result<f64> {
            Ok(self.balance)
        }

        async fn get_account_records(&self, _account_id: &str, _limit: usize) -> anyhow::Result<Vec<TransactionRecord>> {
            self.record_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_records {
                anyhow::bail!("records unavailable")
            }
            Ok(self.records.clone())
        }

        async fn get_node_address_book(&self) -> anyhow::Result<NodeAddressBook> {
            Ok(NodeAddressBook { nodes: Vec::new() })
        }

        async fn close(&self) {}
    }

    fn sample_record(kind: TransactionType, amount: f64) -> TransactionRecord {
        TransactionRecord {
            transaction_id: "0.0.1@123.0".to_string(),
            timestamp_sec: 123,
            amount_tinybar: amount,
            kind,
            status: "SUCCESS".to_string(),
        }
    }

    #[tokio::test]
    async fn tick_emits_balance_count_type_and_volume_metrics() {
        let gateway = Arc::new(FakeGateway {
            balance: 500.0,
            records: vec![
                sample_record(TransactionType::CryptoTransfer, 100.0),
                sample_record(TransactionType::CryptoTransfer, 50.0),
                sample_record(TransactionType::TokenTransfer, 25.0),
            ],
            record_calls: AtomicUsize::new(0),
            fail_records: false,
        });

        let store = MetricStore::new(100);
        let (engine, _rx) = AlertEngine::new(300, 10);

        let collector = AccountCollector::new(
            vec![AccountConfig {
                account_id: "0.0.5000".to_string(),
                label: Some("treasury".to_string()),
            }],
            gateway,
            30,
        );

        collector.tick(&store, &engine).await.unwrap();

        let balances = store.get_by_name("account_balance", 0);
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].value, 500.0);

        let counts = store.get_by_name("account_transaction_count", 0);
        assert_eq!(counts[0].value, 3.0);

        let volumes = store.get_by_name("account_total_volume", 0);
        assert_eq!(volumes[0].value, 175.0);

        let type_counts = store.get_by_name("account_transaction_type_count", 0);
        assert_eq!(type_counts.len(), 2);
    }

    #[tokio::test]
    async fn records_error_is_logged_and_cycle_continues() {
        let gateway = Arc::new(FakeGateway {
            balance: 10.0,
            records: Vec::new(),
            record_calls: AtomicUsize::new(0),
            fail_records: true,
        });

        let store = MetricStore::new(100);
        let (engine, _rx) = AlertEngine::new(300, 10);

        let collector = AccountCollector::new(
            vec![AccountConfig {
                account_id: "0.0.5000".to_string(),
                label: None,
            }],
            gateway,
            30,
        );

        let result = collector.tick(&store, &engine).await;
        assert!(result.is_ok(), "records failure must not abort the cycle");
        assert_eq!(store.get_by_name("account_balance", 0).len(), 1);
        assert!(store.get_by_name("account_transaction_count", 0).is_empty());
    }

    #[tokio::test]
    async fn balance_error_aborts_the_cycle() {
        struct FailingBalanceGateway;

        #[async_trait]
        impl LedgerGateway for FailingBalanceGateway {
            async fn get_account_balance(&self, _account_id: &str) -> anyhow::Result<f64> {
                anyhow::bail!("connectivity lost")
            }
            async fn get_account_records(&self, _account_id: &str, _limit: usize) -> anyhow::Result<Vec<TransactionRecord>> {
                Ok(Vec::new())
            }
            async fn get_node_address_book(&self) -> anyhow::Result<NodeAddressBook> {
                Ok(NodeAddressBook { nodes: Vec::new() })
            }
            async fn close(&self) {}
        }

        let store = MetricStore::new(100);
        let (engine, _rx) = AlertEngine::new(300, 10);
        let collector = AccountCollector::new(
            vec![AccountConfig {
                account_id: "0.0.5000".to_string(),
                label: None,
            }],
            Arc::new(FailingBalanceGateway),
            30,
        );

        let result = collector.tick(&store, &engine).await;
        assert!(result.is_err());
        assert!(store.get_by_name("account_balance", 0).is_empty());
    }
}
