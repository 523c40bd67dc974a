// =============================================================================
// MonitorConfig — on-disk configuration with env-var overrides
// =============================================================================
//
// Follows the load/save shape of the engine's former runtime config: every
// field carries `#[serde(default)]` so a config file from an older version
// still loads, and `save` writes through a `.tmp` sibling + rename so a crash
// mid-write never corrupts the file on disk (§6.3, §6.4).
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::MonitorError;
use crate::types::AlertRule;

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_interval_secs() -> u64 {
    30
}

fn default_cooldown_secs() -> u64 {
    crate::alert_engine::DEFAULT_COOLDOWN_SECS
}

fn default_queue_buffer_size() -> usize {
    crate::alert_engine::DEFAULT_QUEUE_BUFFER_SIZE
}

fn default_max_size() -> usize {
    crate::metric_store::DEFAULT_MAX_SIZE
}

/// Ledger network connection parameters (§6.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    #[serde(default)]
    pub operator_id: String,
    #[serde(default)]
    pub operator_key: String,
}

/// One account to poll for balance and transaction metrics (§4.3.1, §6.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub account_id: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// Alert evaluation and dispatch settings (§4.4, §4.5, §6.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub webhooks: Vec<String>,
    #[serde(default)]
    pub rules: Vec<AlertRule>,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_seconds: u64,
    #[serde(default = "default_queue_buffer_size")]
    pub queue_buffer_size: usize,
}

fn default_true() -> bool {
    true
}

impl Default for AlertingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            webhooks: Vec::new(),
            rules: Vec::new(),
            cooldown_seconds: default_cooldown_secs(),
            queue_buffer_size: default_queue_buffer_size(),
        }
    }
}

/// HTTP API bind settings (§6.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Logging verbosity and output format (§A.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Collector poll cadence and retained-metric bound (§4.3, §6.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_max_size")]
    pub memory_max_size: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            memory_max_size: default_max_size(),
        }
    }
}

/// Top-level monitor configuration (§6.3). Every field has a serde default so
/// a partial or older config file still deserializes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub network: NetworkConfig,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
    #[serde(default)]
    pub alerting: AlertingConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig {
                name: "testnet".to_string(),
                operator_id: String::new(),
                operator_key: String::new(),
            },
            accounts: Vec::new(),
            alerting: AlertingConfig::default(),
            api: ApiConfig::default(),
            logging: LoggingConfig::default(),
            collector: CollectorConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from a JSON file at `path`, then apply environment
    /// variable overrides (§6.4).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read monitor config from {}", path.display()))?;

        let mut config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse monitor config from {}", path.display()))?;

        config.apply_env_overrides();
        config.validate()?;

        info!(
            path = %path.display(),
            network = %config.network.name,
            accounts = config.accounts.len(),
            "monitor config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` via a `.tmp` sibling +
    /// rename, so a crash mid-write never leaves a corrupt file (§6.3).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialize monitor config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "monitor config saved (atomic)");
        Ok(())
    }

    /// Reject a config that deserialized cleanly but is not actually usable
    /// (§6.3 schema constraints beyond what serde defaults can express).
    fn validate(&self) -> Result<(), MonitorError> {
        if self.network.name.trim().is_empty() {
            return Err(MonitorError::ConfigInvalid("network.name must not be empty".to_string()));
        }
        if self.api.port == 0 {
            return Err(MonitorError::ConfigInvalid("api.port must be between 1 and 65535".to_string()));
        }
        Ok(())
    }

    /// Apply the env-var overrides from §6.4. Each is optional; absent
    /// variables leave the loaded value untouched.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("OPERATOR_ID") {
            self.network.operator_id = v;
        }
        if let Ok(v) = std::env::var("OPERATOR_KEY") {
            self.network.operator_key = v;
        }
        if let Ok(v) = std::env::var("NETWORK_NAME") {
            self.network.name = v;
        }
        if let Ok(v) = std::env::var("COLLECTOR_INTERVAL") {
            if let Ok(parsed) = v.parse() {
                self.collector.interval_secs = parsed;
            }
        }
        if let Ok(v) = std::env::var("COLLECTOR_MEMORY_MAX_SIZE") {
            if let Ok(parsed) = v.parse() {
                self.collector.memory_max_size = parsed;
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Serialized: these tests mutate process-global env vars.
    static ENV_GUARD: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_are_sane() {
        let config = MonitorConfig::default();
        assert_eq!(config.api.port, 8080);
        assert_eq!(config.alerting.cooldown_seconds, 300);
        assert_eq!(config.collector.memory_max_size, 10_000);
        assert!(config.alerting.enabled);
    }

    #[test]
    fn load_save_roundtrip() {
        let _guard = ENV_GUARD.lock().unwrap();
        let dir = std::env::temp_dir().join(format!("monitor-config-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");

        let mut config = MonitorConfig::default();
        config.network.name = "mainnet".to_string();
        config.accounts.push(AccountConfig {
            account_id: "0.0.5000".to_string(),
            label: Some("treasury".to_string()),
        });

        config.save(&path).unwrap();
        let loaded = MonitorConfig::load(&path).unwrap();

        assert_eq!(loaded.network.name, "mainnet");
        assert_eq!(loaded.accounts.len(), 1);
        assert_eq!(loaded.accounts[0].account_id, "0.0.5000");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn env_overrides_apply_on_load() {
        let _guard = ENV_GUARD.lock().unwrap();
        let dir = std::env::temp_dir().join(format!("monitor-config-env-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        MonitorConfig::default().save(&path).unwrap();

        std::env::set_var("OPERATOR_ID", "0.0.1001");
        std::env::set_var("COLLECTOR_INTERVAL", "60");

        let loaded = MonitorConfig::load(&path).unwrap();
        assert_eq!(loaded.network.operator_id, "0.0.1001");
        assert_eq!(loaded.collector.interval_secs, 60);

        std::env::remove_var("OPERATOR_ID");
        std::env::remove_var("COLLECTOR_INTERVAL");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_rejects_empty_network_name() {
        let dir = std::env::temp_dir().join(format!("monitor-config-invalid-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");

        let mut config = MonitorConfig::default();
        config.network.name = String::new();
        std::fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();

        let err = MonitorConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("network.name"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
