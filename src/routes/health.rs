use crate::{error::AppError, server::Server};
use axum::{Router, extract::State, response::Json, routing::get};
use serde_json::Value;

/// Create health check routes.
///
/// The health service aggregates checks from all registered components
/// (currently the cache backend).
pub fn create_health_routes() -> Router<Server> {
    Router::new().route("/", get(health_check))
}

async fn health_check(State(server): State<Server>) -> Result<Json<Value>, AppError> {
    let health_response = server.health.check_health().await;

    let response_json = serde_json::to_value(&health_response)
        .map_err(|e| AppError::Internal(format!("Failed to serialize health response: {}", e)))?;

    Ok(Json(response_json))
}
