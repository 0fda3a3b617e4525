use crate::api::HealthResponse;
use crate::state::AppState;
use axum::{extract::State, Json};
use chrono::Utc;

/// GET /health
///
/// Always 200: the cache is optional, so its state is reported but never
/// fails the check.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        cache: state.cache.state(),
        timestamp: Utc::now(),
    })
}
