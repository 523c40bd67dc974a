// =============================================================================
// monitor — Hedera Network Monitor daemon entry point
// =============================================================================
//
// Wires the collectors, the alert engine's dispatcher, and the HTTP API
// together under one root cancellation token (§5). Grounded on the
// teacher's startup sequence (load config, build shared state, spawn tasks,
// wait on `ctrl_c`, shut down) with the engine's specific subsystems
// replaced by the monitor's own.
// =============================================================================

use std::sync::Arc;

use hedera_network_monitor::alert_engine::{self, AlertEngine};
use hedera_network_monitor::collector::account::AccountCollector;
use hedera_network_monitor::collector::network::NetworkCollector;
use hedera_network_monitor::collector::Collector;
use hedera_network_monitor::config::MonitorConfig;
use hedera_network_monitor::gateway::{LedgerGateway, UnimplementedGateway};
use hedera_network_monitor::state::MonitorState;
use hedera_network_monitor::webhook::{WebhookConfig, WebhookSender};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const CONFIG_PATH: &str = "monitor_config.json";
const SHUTDOWN_DEADLINE: std::time::Duration = std::time::Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();

    let config = MonitorConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "failed to load monitor config, using defaults");
        MonitorConfig::default()
    });

    init_logging(&config.logging);

    info!(network = %config.network.name, accounts = config.accounts.len(), "hedera network monitor starting");

    let ctx = CancellationToken::new();

    let (alert_engine, event_receiver) = AlertEngine::new(config.alerting.cooldown_seconds, config.alerting.queue_buffer_size);
    for rule in config.alerting.rules.clone() {
        alert_engine.add_rule(rule);
    }

    let collector_interval = config.collector.interval_secs;
    let accounts = config.accounts.clone();
    let network_name = config.network.name.clone();
    let bind_addr = format!("{}:{}", config.api.host, config.api.port);
    let webhooks = config.alerting.webhooks.clone();
    let alerting_enabled = config.alerting.enabled;

    let state = MonitorState::new(config, alert_engine.clone());

    // Swap in a real SDK client here; the contract is `LedgerGateway` (§4.2).
    let gateway: Arc<dyn LedgerGateway> = Arc::new(UnimplementedGateway);

    let mut tasks = Vec::new();

    if !accounts.is_empty() {
        let collector = AccountCollector::new(accounts, gateway.clone(), collector_interval);
        let ctx = ctx.clone();
        let store = state.metric_store.clone();
        let engine = alert_engine.clone();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = collector.run(ctx, store, engine).await {
                error!(collector = "account", error = %e, "collector exited with error");
            }
        }));
    }

    {
        let collector = NetworkCollector::new(network_name, gateway.clone(), collector_interval);
        let ctx = ctx.clone();
        let store = state.metric_store.clone();
        let engine = alert_engine.clone();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = collector.run(ctx, store, engine).await {
                error!(collector = "network", error = %e, "collector exited with error");
            }
        }));
    }

    if alerting_enabled {
        let ctx = ctx.clone();
        tasks.push(tokio::spawn(alert_engine::run_dispatcher(
            event_receiver,
            ctx,
            webhooks,
            WebhookSender::new(),
            WebhookConfig::default(),
        )));
    }

    let api_state = state.clone();
    let api_ctx = ctx.clone();
    let api_task = tokio::spawn(async move {
        let app = hedera_network_monitor::api::rest::router(api_state);
        let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!(addr = %bind_addr, error = %e, "failed to bind API server");
                return;
            }
        };
        info!(addr = %bind_addr, "API server listening");
        let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
            api_ctx.cancelled().await;
        });
        if let Err(e) = serve.await {
            error!(error = %e, "API server failed");
        }
    });

    tokio::signal::ctrl_c().await?;
    warn!("shutdown signal received — stopping gracefully");
    ctx.cancel();

    let _ = tokio::time::timeout(SHUTDOWN_DEADLINE, api_task).await;
    for task in tasks {
        let _ = tokio::time::timeout(SHUTDOWN_DEADLINE, task).await;
    }

    gateway.close().await;
    info!("shutdown complete");
    Ok(())
}

fn init_logging(logging: &hedera_network_monitor::config::LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(logging.level.clone()));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
