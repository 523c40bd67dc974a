// =============================================================================
// AlertEngine — rule set, stateful evaluation, cooldown, dispatch
// =============================================================================
//
// The rule list and the per-rule runtime state are guarded independently
// (§4.4, §5, §9): the rule-list guard is a `parking_lot::RwLock<Vec<_>>`
// exactly like `risk.rs`'s `RwLock<Inner>` snapshot-under-lock pattern; the
// per-rule state lives in a second `RwLock<HashMap<_,_>>` keyed by rule id so
// a metric Check never write-locks the whole rule list. When both are
// needed, the rule guard is acquired before the state guard, per §5.
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::MonitorError;
use crate::types::{AlertEvent, AlertRule, Condition, Metric};
use crate::webhook::{WebhookConfig, WebhookSender};

/// Default cooldown applied when a rule's `cooldown_seconds` is `0` (§3).
pub const DEFAULT_COOLDOWN_SECS: u64 = 300;

/// Default bound on the AlertEvent queue (§5).
pub const DEFAULT_QUEUE_BUFFER_SIZE: usize = 100;

/// Per-rule runtime state, keyed by rule id (§3).
#[derive(Debug, Clone, Copy, Default)]
struct RuleState {
    previous_value: f64,
    has_previous_value: bool,
    last_fired_at: Option<Instant>,
}

/// Holds the mutable rule set and drives stateful evaluation and dispatch.
pub struct AlertEngine {
    rules: RwLock<Vec<AlertRule>>,
    states: RwLock<HashMap<String, RuleState>>,
    default_cooldown: Duration,
    sender: mpsc::Sender<AlertEvent>,
}

impl AlertEngine {
    /// Construct an engine with an empty rule set and a bounded event queue
    /// of `queue_buffer_size` (§5). Returns the engine plus the receiving
    /// half of the queue, which the caller hands to [`run_dispatcher`].
    pub fn new(default_cooldown_secs: u64, queue_buffer_size: usize) -> (Arc<Self>, mpsc::Receiver<AlertEvent>) {
        let (sender, receiver) = mpsc::channel(queue_buffer_size.max(1));
        let engine = Arc::new(Self {
            rules: RwLock::new(Vec::new()),
            states: RwLock::new(HashMap::new()),
            default_cooldown: Duration::from_secs(default_cooldown_secs),
            sender,
        });
        (engine, receiver)
    }

    // -------------------------------------------------------------------
    // Rule set management
    // -------------------------------------------------------------------

    /// Append a rule, assigning a fresh id if none was provided. Returns the
    /// stored rule (with its final id).
    pub fn add_rule(&self, mut rule: AlertRule) -> AlertRule {
        if rule.id.is_empty() {
            rule.id = Uuid::new_v4().to_string();
        }
        let stored = rule.clone();
        self.rules.write().push(rule);
        info!(rule_id = %stored.id, name = %stored.name, "alert rule added");
        stored
    }

    /// Remove a rule by id. Fails with [`MonitorError::RuleNotFound`] if absent.
    pub fn remove_rule(&self, id: &str) -> Result<(), MonitorError> {
        let mut rules = self.rules.write();
        let before = rules.len();
        rules.retain(|r| r.id != id);
        if rules.len() == before {
            return Err(MonitorError::RuleNotFound(id.to_string()));
        }
        drop(rules);
        self.states.write().remove(id);
        info!(rule_id = %id, "alert rule removed");
        Ok(())
    }

    /// A defensive copy of the current rule list — mutating it does not
    /// affect engine state (§4.4, §8 property 5).
    pub fn get_rules(&self) -> Vec<AlertRule> {
        self.rules.read().clone()
    }

    // -------------------------------------------------------------------
    // Evaluation
    // -------------------------------------------------------------------

    /// Evaluate `metric` against every enabled rule whose `metric_name`
    /// matches. Never blocks the caller: enqueue attempts are non-blocking
    /// (`try_send`) and a full queue just drops the event with a log (§4.4,
    /// §5, §7 `QueueFull`).
    pub fn check(&self, metric: &Metric) {
        let rules = self.rules.read().clone();
        let now = Instant::now();

        for rule in rules.iter().filter(|r| r.enabled && r.metric_name == metric.name) {
            let should_fire = {
                let states = self.states.read();
                let state = states.get(&rule.id).copied().unwrap_or_default();
                Self::evaluate(rule.condition, metric.value, rule.threshold, &state)
            };

            if should_fire {
                let cooldown = if rule.cooldown_seconds != 0 {
                    Duration::from_secs(rule.cooldown_seconds)
                } else {
                    self.default_cooldown
                };

                let in_cooldown = {
                    let states = self.states.read();
                    states
                        .get(&rule.id)
                        .and_then(|s| s.last_fired_at)
                        .map(|last| now.duration_since(last) < cooldown)
                        .unwrap_or(false)
                };

                if in_cooldown {
                    debug!(rule_id = %rule.id, "alert suppressed by cooldown");
                } else {
                    let event = AlertEvent {
                        rule_id: rule.id.clone(),
                        rule_name: rule.name.clone(),
                        severity: rule.severity,
                        message: rule.description.clone(),
                        timestamp: crate::now_unix_secs(),
                        value: metric.value,
                        metric_id: metric.metric_id(),
                    };

                    match self.sender.try_send(event) {
                        Ok(()) => {
                            self.states.write().entry(rule.id.clone()).or_default().last_fired_at = Some(now);
                        }
                        Err(_) => {
                            warn!(rule_id = %rule.id, "alert queue full — event dropped");
                        }
                    }
                }
            }

            let mut states = self.states.write();
            let state = states.entry(rule.id.clone()).or_default();
            state.previous_value = metric.value;
            state.has_previous_value = true;
        }
    }

    /// Condition table from §4.4. State-dependent conditions never fire on
    /// the first observation (`has_previous_value == false`).
    fn evaluate(condition: Condition, v: f64, t: f64, state: &RuleState) -> bool {
        match condition {
            Condition::GreaterThan => v > t,
            Condition::LessThan => v < t,
            Condition::GreaterOrEqual => v >= t,
            Condition::LessOrEqual => v <= t,
            Condition::Equal => v == t,
            Condition::NotEqual => v != t,
            Condition::Changed => state.has_previous_value && v != state.previous_value,
            Condition::Increased => state.has_previous_value && v > state.previous_value,
            Condition::Decreased => state.has_previous_value && v < state.previous_value,
        }
    }
}

/// The dispatcher loop (§4.4): drains the bounded AlertEvent queue and, for
/// each event, fans a detached webhook-delivery task out per configured
/// URL. Detached tasks are fire-and-forget with their own timeout and
/// retry budget so a slow webhook can never stall the dispatcher (§5, §9).
pub async fn run_dispatcher(
    mut receiver: mpsc::Receiver<AlertEvent>,
    ctx: CancellationToken,
    webhook_urls: Vec<String>,
    sender: WebhookSender,
    config: WebhookConfig,
) {
    info!(webhooks = webhook_urls.len(), "alert dispatcher starting");

    loop {
        tokio::select! {
            _ = ctx.cancelled() => {
                info!("alert dispatcher shutting down");
                return;
            }
            maybe_event = receiver.recv() => {
                let Some(event) = maybe_event else {
                    warn!("alert event channel closed — dispatcher exiting");
                    return;
                };

                let payload = event.to_payload();
                for url in &webhook_urls {
                    let url = url.clone();
                    let payload = payload.clone();
                    let sender = sender.clone();
                    tokio::spawn(async move {
                        if let Err(e) = sender.send(&url, &payload, config).await {
                            warn!(url = %url, rule_id = %payload.rule_id, error = %e, "webhook delivery failed after retries");
                        }
                    });
                }
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
    use std::collections::HashMap as Map;

    fn metric(name: &str, value: f64) -> Metric {
        Metric {
            name: name.to_string(),
            timestamp: 0,
            value,
            labels: Map::new(),
        }
    }

    fn rule(condition: Condition, threshold: f64, cooldown_seconds: u64) -> AlertRule {
        AlertRule {
            id: String::new(),
            name: "test rule".to_string(),
            description: "fired".to_string(),
            metric_name: "m".to_string(),
            condition,
            threshold,
            severity: crate::types::Severity::Warning,
            enabled: true,
            cooldown_seconds,
        }
    }

    #[test]
    fn s1_single_fire_above_threshold() {
        let (engine, mut rx) = AlertEngine::new(300, 10);
        engine.add_rule(rule(Condition::GreaterThan, 100.0, 300));

        engine.check(&metric("m", 150.0));

        let event = rx.try_recv().expect("expected one event");
        assert_eq!(event.value, 150.0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn s2_cooldown_suppresses_second_fire() {
        let (engine, mut rx) = AlertEngine::new(300, 10);
        engine.add_rule(rule(Condition::GreaterThan, 100.0, 1));

        engine.check(&metric("m", 150.0));
        engine.check(&metric("m", 200.0));

        let first = rx.try_recv().expect("first event");
        assert_eq!(first.value, 150.0);
        assert!(rx.try_recv().is_err(), "second fire should be suppressed by cooldown");
    }

    #[test]
    fn s2_cooldown_elapses_and_fires_again() {
        let (engine, mut rx) = AlertEngine::new(300, 10);
        engine.add_rule(rule(Condition::GreaterThan, 100.0, 1));

        engine.check(&metric("m", 150.0));
        assert!(rx.try_recv().is_ok());

        std::thread::sleep(Duration::from_millis(1100));
        engine.check(&metric("m", 250.0));
        let second = rx.try_recv().expect("expected second event after cooldown elapsed");
        assert_eq!(second.value, 250.0);
    }

    #[test]
    fn s3_disabled_rule_never_fires() {
        let (engine, mut rx) = AlertEngine::new(300, 10);
        let mut r = rule(Condition::GreaterThan, 100.0, 300);
        r.enabled = false;
        engine.add_rule(r);

        engine.check(&metric("m", 999.0));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn s4_state_condition_suppresses_first_sample() {
        let (engine, mut rx) = AlertEngine::new(300, 10);
        engine.add_rule(rule(Condition::Changed, 0.0, 300));

        engine.check(&metric("m", 100.0));
        assert!(rx.try_recv().is_err(), "first sample must not fire");

        engine.check(&metric("m", 150.0));
        assert!(rx.try_recv().is_ok(), "change from 100 to 150 should fire");

        engine.check(&metric("m", 150.0));
        assert!(rx.try_recv().is_err(), "no change should not fire");

        engine.check(&metric("m", 200.0));
        assert!(rx.try_recv().is_ok(), "change from 150 to 200 should fire");
    }

    #[test]
    fn s6_queue_overflow_drops_without_blocking() {
        let (engine, rx) = AlertEngine::new(300, 1);
        engine.add_rule(rule(Condition::GreaterThan, 0.0, 0));

        // No one drains `rx` — every Check call after the first should find
        // the queue full and drop silently rather than block.
        for i in 0..10 {
            engine.check(&metric("m", 100.0 + i as f64));
        }

        // The collector call above must have returned for all 10 calls
        // (no blocking) — reaching this line proves it. At most 1 item sits
        // in the queue.
        drop(rx);
    }

    #[test]
    fn remove_unknown_rule_fails() {
        let (engine, _rx) = AlertEngine::new(300, 10);
        let err = engine.remove_rule("nonexistent").unwrap_err();
        assert!(matches!(err, MonitorError::RuleNotFound(_)));
    }

    #[test]
    fn get_rules_is_a_defensive_copy() {
        let (engine, _rx) = AlertEngine::new(300, 10);
        engine.add_rule(rule(Condition::GreaterThan, 0.0, 0));

        let mut copy = engine.get_rules();
        copy.clear();

        assert_eq!(engine.get_rules().len(), 1, "mutating the returned copy must not affect engine state");
    }

    #[test]
    fn bitwise_equal_condition() {
        let (engine, mut rx) = AlertEngine::new(300, 10);
        engine.add_rule(rule(Condition::Equal, 42.0, 0));
        engine.check(&metric("m", 42.0));
        assert!(rx.try_recv().is_ok());

        let (engine2, mut rx2) = AlertEngine::new(300, 10);
        engine2.add_rule(rule(Condition::Equal, 42.0, 0));
        engine2.check(&metric("m", 42.0000001));
        assert!(rx2.try_recv().is_err());
    }
}
