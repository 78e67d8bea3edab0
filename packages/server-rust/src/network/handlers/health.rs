//! Health endpoint for orchestrators and operational monitoring.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

use super::AppState;

/// Returns health information as JSON: 200 while the persistence
/// backend answers, 503 otherwise.
pub async fn health_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<serde_json::Value>) {
    let uptime_secs = state.start_time.elapsed().as_secs();
    match state.store.check_health().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "state": "ready", "uptime_secs": uptime_secs })),
        ),
        Err(err) => {
            tracing::error!(error = %err, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "state": "unavailable", "uptime_secs": uptime_secs })),
            )
        }
    }
}
