// =============================================================================
// Shared data model — Hedera Network Monitor
// =============================================================================
//
// See spec §3 for the authoritative field-by-field description. Floating
// point comparisons in `Condition::Equal`/`NotEqual` are deliberately
// bitwise (IEEE-754) — no epsilon tolerance — per §9's explicit design note.
// =============================================================================

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// Metric
// =============================================================================

/// A single sampled point in a metric time series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub timestamp: i64,
    pub value: f64,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl Metric {
    /// Construct a metric, stamping the current UNIX time in seconds.
    pub fn new(name: impl Into<String>, value: f64, labels: HashMap<String, String>) -> Self {
        Self {
            name: name.into(),
            timestamp: crate::now_unix_secs(),
            value,
            labels,
        }
    }

    /// Compact identifier combining the metric name and, when present, the
    /// `account_id` label: `"<name>[<account_id>]"`, else `"<name>"`.
    pub fn metric_id(&self) -> String {
        match self.labels.get("account_id") {
            Some(account_id) => format!("{}[{}]", self.name, account_id),
            None => self.name.clone(),
        }
    }
}

// =============================================================================
// AlertRule
// =============================================================================

/// Severity associated with an alert rule and the events it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "critical" => Ok(Severity::Critical),
            _ => Err(()),
        }
    }
}

/// The condition a rule evaluates against each matching metric. The six
/// comparison variants use `threshold`; the three state variants ignore it
/// and instead compare against the rule's previous observed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    Changed,
    Increased,
    Decreased,
}

impl Condition {
    /// Parse the wire representation used by §3/§6.1 (`>`, `<`, ..., or the
    /// bare state-condition names).
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            ">" => Condition::GreaterThan,
            "<" => Condition::LessThan,
            ">=" => Condition::GreaterOrEqual,
            "<=" => Condition::LessOrEqual,
            "==" => Condition::Equal,
            "!=" => Condition::NotEqual,
            "changed" => Condition::Changed,
            "increased" => Condition::Increased,
            "decreased" => Condition::Decreased,
            _ => return None,
        })
    }

    /// `true` for the three conditions that depend on a previous observation
    /// rather than a static threshold.
    pub fn is_stateful(self) -> bool {
        matches!(
            self,
            Condition::Changed | Condition::Increased | Condition::Decreased
        )
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Condition::GreaterThan => ">",
            Condition::LessThan => "<",
            Condition::GreaterOrEqual => ">=",
            Condition::LessOrEqual => "<=",
            Condition::Equal => "==",
            Condition::NotEqual => "!=",
            Condition::Changed => "changed",
            Condition::Increased => "increased",
            Condition::Decreased => "decreased",
        };
        write!(f, "{s}")
    }
}

/// A declarative alert condition against a single metric name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub metric_name: String,
    pub condition: Condition,
    #[serde(default)]
    pub threshold: f64,
    pub severity: Severity,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// `0` means "inherit the engine default" (§3). Non-negative.
    #[serde(default)]
    pub cooldown_seconds: u64,
}

fn default_enabled() -> bool {
    true
}

// =============================================================================
// AlertEvent / WebhookPayload
// =============================================================================

/// What flows from the engine into the dispatch queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub rule_id: String,
    pub rule_name: String,
    pub severity: Severity,
    pub message: String,
    pub timestamp: i64,
    pub value: f64,
    pub metric_id: String,
}

impl AlertEvent {
    /// Wire form sent to webhooks (§3, §6.2) — identical field set today, but
    /// kept as a distinct type so the wire shape can diverge from the
    /// in-process event without touching dispatch logic.
    pub fn to_payload(&self) -> WebhookPayload {
        WebhookPayload {
            rule_id: self.rule_id.clone(),
            rule_name: self.rule_name.clone(),
            severity: self.severity,
            message: self.message.clone(),
            value: self.value,
            timestamp: self.timestamp,
            metric_id: self.metric_id.clone(),
        }
    }
}

/// JSON wire form of an [`AlertEvent`], POSTed to every configured webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub rule_id: String,
    pub rule_name: String,
    pub severity: Severity,
    pub message: String,
    pub value: f64,
    pub timestamp: i64,
    pub metric_id: String,
}

// =============================================================================
// Tests
// =============================================================================
