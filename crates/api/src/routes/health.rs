use std::time::Duration;

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// How long the database round-trip may take before the service reports
/// itself degraded anyway. Monitors poll this endpoint; an unreachable
/// store must never make it hang for the full request timeout.
const DB_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `"ok"` when the store answered in time, `"degraded"` otherwise.
    pub status: &'static str,
    pub service: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether Postgres answered the round-trip within the check budget.
    pub db_healthy: bool,
}

/// GET /health -- liveness plus a bounded database check.
///
/// A degraded answer is still a 200: the API keeps serving clients that can
/// fall back to their local cache even while the store is down.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = tokio::time::timeout(
        DB_CHECK_TIMEOUT,
        repatlas_db::health_check(&state.pool),
    )
    .await
    .map(|result| result.is_ok())
    .unwrap_or(false);

    let status = if db_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
