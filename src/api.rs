//! HTTP API handlers for Seawatch.
//!
//! The console UI polls these endpoints; it never talks to the engine
//! directly.
//!
//! - **GET /situation**: report for the latest polled snapshot and an operator query.
//! - **GET /situation/alerts**: only the proximity alerts of that report.
//! - **POST /situation**: report for a snapshot supplied in the request body.
//! - **GET /health**: liveness.

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::config::EngineConfig;
use crate::error::MsaeError;
use crate::model::RawSnapshot;
use crate::poller::SnapshotStore;
use crate::risk::Alert;
use crate::situation::{SituationReport, compute_situation};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub snapshots: SnapshotStore,

    /// Engine options; request parameters may override the radii and cap.
    pub engine: EngineConfig,
}

/// Build the router with all endpoints.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/situation", get(get_situation).post(post_situation))
        .route("/situation/alerts", get(get_alerts))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Query parameters for the GET endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct SituationQuery {
    /// Operator search text (vessel name or MMSI digits).
    #[serde(default)]
    pub q: String,
    pub risk_radius_km: Option<f64>,
    pub alert_radius_km: Option<f64>,
    pub max_alerts: Option<usize>,
}

/// Request body for POST /situation.
#[derive(Debug, Deserialize)]
pub struct SituationRequest {
    /// Raw snapshot document with the five backend arrays.
    pub snapshot: Value,
    #[serde(default)]
    pub query: String,
    pub risk_radius_km: Option<f64>,
    pub alert_radius_km: Option<f64>,
    pub max_alerts: Option<usize>,
}

/// Response for GET /situation/alerts.
#[derive(Debug, Clone, Serialize)]
pub struct AlertsResponse {
    pub generated_at: DateTime<Utc>,
    pub alerts: Vec<Alert>,
}

/// Error body returned with 4xx/5xx responses.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn reject(status: StatusCode, message: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
}

/// Unwrap query parameters. Ill-typed values such as `max_alerts=-1` get the
/// same 422 as out-of-range overrides.
fn query_params(query: Result<Query<SituationQuery>, QueryRejection>) -> Result<SituationQuery, ApiError> {
    query.map(|Query(query)| query).map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Rejected query parameters");
        reject(StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text())
    })
}

/// Apply per-request overrides on top of the service defaults.
fn engine_for(
    base: &EngineConfig,
    risk_radius_km: Option<f64>,
    alert_radius_km: Option<f64>,
    max_alerts: Option<usize>,
) -> EngineConfig {
    let mut engine = base.clone();
    if let Some(km) = risk_radius_km {
        engine = engine.with_risk_radius_km(km);
    }
    if let Some(km) = alert_radius_km {
        engine = engine.with_alert_radius_km(km);
    }
    if let Some(max) = max_alerts {
        engine = engine.with_max_alerts(max);
    }
    engine
}

/// Map an engine error to a response. `malformed` is the status used for
/// a malformed snapshot, which depends on who supplied it.
fn engine_error(e: MsaeError, malformed: StatusCode) -> ApiError {
    let status = match e {
        MsaeError::SnapshotMalformed(_) => malformed,
        MsaeError::InvalidConfig(_) => StatusCode::UNPROCESSABLE_ENTITY,
        MsaeError::InvalidCoordinate { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    reject(status, e)
}

fn log_report(report: &SituationReport) {
    if !report.warnings.is_clean() {
        warn!(
            dropped_vessels = report.warnings.dropped_vessels,
            dropped_ports = report.warnings.dropped_ports,
            dropped_samples = report.warnings.dropped_samples,
            dropped_events = report.warnings.dropped_events,
            dropped_voyages = report.warnings.dropped_voyages,
            missing = ?report.warnings.missing_endpoints,
            "Snapshot contained unusable records"
        );
    }
    info!(
        active = report.active_vessels.len(),
        alerts = report.alerts.len(),
        at_risk = report.fleet.at_risk_count,
        "Situation served"
    );
}

/// Compute the report for the latest polled snapshot.
async fn latest_report(state: &AppState, query: &SituationQuery) -> Result<SituationReport, ApiError> {
    let stored = state.snapshots.latest().await.ok_or_else(|| {
        warn!("No snapshot fetched yet");
        reject(StatusCode::SERVICE_UNAVAILABLE, "no snapshot available yet")
    })?;

    let engine = engine_for(
        &state.engine,
        query.risk_radius_km,
        query.alert_radius_km,
        query.max_alerts,
    );

    let report = compute_situation(&stored.snapshot, &query.q, &engine).map_err(|e| {
        warn!(error = %e, "Failed to compute situation");
        engine_error(e, StatusCode::BAD_GATEWAY)
    })?;

    log_report(&report);
    Ok(report)
}

/// GET /situation - Situation report for the latest snapshot.
///
/// # Query Parameters
///
/// - `q` (optional): operator search; empty selects every vessel
/// - `risk_radius_km`, `alert_radius_km`, `max_alerts` (optional): overrides
///
/// # Response
///
/// The full [`SituationReport`]. Returns 503 until the first snapshot has
/// been fetched, and 422 for unparseable or out-of-range parameters.
#[instrument(skip(state))]
pub async fn get_situation(
    State(state): State<AppState>,
    query: Result<Query<SituationQuery>, QueryRejection>,
) -> Result<Json<SituationReport>, ApiError> {
    let query = query_params(query)?;
    latest_report(&state, &query).await.map(Json)
}

/// GET /situation/alerts - Only the proximity alerts.
///
/// ```json
/// {
///     "generated_at": "2024-01-15T10:30:00Z",
///     "alerts": [
///         {
///             "vessel_id": 4,
///             "vessel_name": "Harbor Pilot",
///             "port_id": 1,
///             "port_name": "Port of Mumbai",
///             "distance_km": 1.11,
///             "message": "⚠ Harbor Pilot within 2km of Port of Mumbai"
///         }
///     ]
/// }
/// ```
#[instrument(skip(state))]
pub async fn get_alerts(
    State(state): State<AppState>,
    query: Result<Query<SituationQuery>, QueryRejection>,
) -> Result<Json<AlertsResponse>, ApiError> {
    let query = query_params(query)?;
    let report = latest_report(&state, &query).await?;
    Ok(Json(AlertsResponse {
        generated_at: report.generated_at,
        alerts: report.alerts,
    }))
}

/// POST /situation - Situation report for a supplied snapshot.
///
/// # Request Body
///
/// ```json
/// {
///     "snapshot": { "vessels": [...], "ports": [...], "history": [...],
///                   "events": [...], "voyages": [...] },
///     "query": "ocean",
///     "alert_radius_km": 100
/// }
/// ```
///
/// A malformed snapshot or an out-of-range override yields 422 with an
/// error message.
#[instrument(skip(state, request), fields(query = %request.query))]
pub async fn post_situation(
    State(state): State<AppState>,
    Json(request): Json<SituationRequest>,
) -> Result<Json<SituationReport>, ApiError> {
    let raw = RawSnapshot::from_json(request.snapshot).map_err(|e| {
        warn!(error = %e, "Rejected snapshot");
        reject(StatusCode::UNPROCESSABLE_ENTITY, e)
    })?;

    let engine = engine_for(
        &state.engine,
        request.risk_radius_km,
        request.alert_radius_km,
        request.max_alerts,
    );

    let report = compute_situation(&raw, &request.query, &engine).map_err(|e| {
        warn!(error = %e, "Failed to compute situation");
        engine_error(e, StatusCode::UNPROCESSABLE_ENTITY)
    })?;

    log_report(&report);
    Ok(Json(report))
}

/// GET /health - Simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}
