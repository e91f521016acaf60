//! Health check endpoint.

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;
use tracing::debug;

use crate::state::AppState;
use crate::store::StoreTable;

/// `GET /health`
///
/// Always 200 while the service is up.
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    debug!("Processing health check request");

    Json(json!({
        "status": "healthy",
        "projects": state.store().count(StoreTable::HProject),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
