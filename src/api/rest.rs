// =============================================================================
// REST API — read-only metrics + alert-rule management boundary (§6.1)
// =============================================================================
//
// Thin handlers only: every operation reads `MetricStore` or mutates
// `AlertEngine` through their public methods (§4.6). No authentication layer
// is mounted — Non-goals (§1) explicitly exclude it. Grounded on the
// teacher's `api::rest::router` shape (CORS layer + `with_state`), with the
// Bearer-auth extractor dropped per that Non-goal.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::error::MonitorError;
use crate::state::MonitorState;
use crate::types::{AlertRule, Condition, Severity};

const DEFAULT_METRICS_LIMIT: usize = 100;
const MAX_METRICS_LIMIT: usize = 10_000;

/// Build the full REST API router, CORS-permissive, over shared `state`.
pub fn router(state: Arc<MonitorState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/v1/metrics", get(get_metrics))
        .route("/api/v1/metrics/account", get(get_metrics_by_label))
        .route("/api/v1/storage/stats", get(get_storage_stats))
        .route("/api/v1/alerts", get(get_alerts))
        .route("/api/v1/alerts", post(create_alert))
        .route("/api/v1/alerts", delete(delete_alert))
        .layer(cors)
        .with_state(state)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<serde_json::Value>) {
    (status, Json(serde_json::json!({ "error": message.into() })))
}

impl IntoResponse for MonitorError {
    fn into_response(self) -> axum::response::Response {
        error_response(self.status_code(), self.to_string()).into_response()
    }
}

// =============================================================================
// GET /health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// =============================================================================
// GET /api/v1/metrics
// =============================================================================

#[derive(Deserialize)]
struct MetricsQuery {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    limit: Option<String>,
}

#[derive(Serialize)]
struct MetricsResponse {
    metrics: Vec<crate::types::Metric>,
    count: usize,
}

/// `limit` clamped to `[0, 10000]`; invalid, missing, or negative uses the
/// default of 100 (§6.1).
fn parse_limit(raw: Option<&str>) -> usize {
    match raw.and_then(|s| s.parse::<i64>().ok()) {
        Some(n) if n >= 0 => (n as usize).min(MAX_METRICS_LIMIT),
        _ => DEFAULT_METRICS_LIMIT,
    }
}

async fn get_metrics(State(state): State<Arc<MonitorState>>, Query(query): Query<MetricsQuery>) -> impl IntoResponse {
    let limit = parse_limit(query.limit.as_deref());
    let name = query.name.unwrap_or_default();
    let metrics = state.metric_store.get_by_name(&name, limit);
    Json(MetricsResponse {
        count: metrics.len(),
        metrics,
    })
}

// =============================================================================
// GET /api/v1/metrics/account
// =============================================================================

#[derive(Deserialize)]
struct MetricsByLabelQuery {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    value: Option<String>,
}

async fn get_metrics_by_label(
    State(state): State<Arc<MonitorState>>,
    Query(query): Query<MetricsByLabelQuery>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let key = query.key.filter(|s| !s.is_empty());
    let value = query.value.filter(|s| !s.is_empty());

    let (key, value) = match (key, value) {
        (Some(k), Some(v)) => (k, v),
        _ => return Err(error_response(StatusCode::BAD_REQUEST, "both 'key' and 'value' are required")),
    };

    let metrics = state.metric_store.get_by_label(&key, &value);
    Ok(Json(MetricsResponse {
        count: metrics.len(),
        metrics,
    }))
}

// =============================================================================
// GET /api/v1/storage/stats
// =============================================================================

#[derive(Serialize)]
struct StorageStatsResponse {
    metric_count: usize,
    max_size: usize,
    utilization: String,
}

async fn get_storage_stats(State(state): State<Arc<MonitorState>>) -> impl IntoResponse {
    let stats = state.metric_store.stats();
    Json(StorageStatsResponse {
        metric_count: stats.count,
        max_size: stats.max_size,
        utilization: stats.utilization(),
    })
}

// =============================================================================
// GET /api/v1/alerts
// =============================================================================

#[derive(Serialize)]
struct AlertsResponse {
    alerts: Vec<AlertRule>,
    count: usize,
}

async fn get_alerts(State(state): State<Arc<MonitorState>>) -> impl IntoResponse {
    let alerts = state.alert_engine.get_rules();
    Json(AlertsResponse {
        count: alerts.len(),
        alerts,
    })
}

// =============================================================================
// POST /api/v1/alerts
// =============================================================================

#[derive(Deserialize)]
struct CreateAlertRequest {
    name: String,
    #[serde(default)]
    description: String,
    metric_name: String,
    condition: String,
    #[serde(default)]
    threshold: f64,
    severity: String,
    #[serde(default)]
    cooldown_seconds: u64,
}

async fn create_alert(
    State(state): State<Arc<MonitorState>>,
    Json(req): Json<CreateAlertRequest>,
) -> Result<impl IntoResponse, MonitorError> {
    if req.name.trim().is_empty() {
        return Err(MonitorError::RuleValidation("'name' must not be empty".to_string()));
    }
    if req.metric_name.trim().is_empty() {
        return Err(MonitorError::RuleValidation("'metric_name' must not be empty".to_string()));
    }
    let condition = Condition::parse(&req.condition)
        .ok_or_else(|| MonitorError::RuleValidation(format!("invalid condition: '{}'", req.condition)))?;
    let severity: Severity = req
        .severity
        .parse()
        .map_err(|_| MonitorError::RuleValidation(format!("invalid severity: '{}'", req.severity)))?;

    let rule = AlertRule {
        id: String::new(),
        name: req.name,
        description: req.description,
        metric_name: req.metric_name,
        condition,
        threshold: req.threshold,
        severity,
        enabled: true,
        cooldown_seconds: req.cooldown_seconds,
    };

    let stored = state.alert_engine.add_rule(rule);
    info!(rule_id = %stored.id, "alert rule created via API");
    Ok((StatusCode::CREATED, Json(stored)))
}

// =============================================================================
// DELETE /api/v1/alerts
// =============================================================================

#[derive(Deserialize)]
struct DeleteAlertQuery {
    #[serde(default)]
    id: Option<String>,
}

async fn delete_alert(
    State(state): State<Arc<MonitorState>>,
    Query(query): Query<DeleteAlertQuery>,
) -> Result<StatusCode, (StatusCode, Json<serde_json::Value>)> {
    let id = query.id.filter(|s| !s.is_empty());
    let Some(id) = id else {
        return Err(error_response(StatusCode::BAD_REQUEST, "'id' is required"));
    };

    match state.alert_engine.remove_rule(&id) {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e @ MonitorError::RuleNotFound(_)) => {
            warn!(id = %id, "delete requested for unknown alert rule");
            Err(error_response(e.status_code(), e.to_string()))
        }
        Err(e) => Err(error_response(e.status_code(), e.to_string())),
    }
}

// =============================================================================
// Tests
// =============================================================================
