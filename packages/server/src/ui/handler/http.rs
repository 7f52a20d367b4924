//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};

use crate::{
    infrastructure::dto::http::{ConnectionsDto, HealthDto},
    ui::state::AppState,
};

/// Health check endpoint
///
/// Never touches the counter store or the bus.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".to_string(),
        instance: state.instance.as_str().to_string(),
        port: state.port,
    })
}

/// Debug endpoint to inspect this instance's local connection registry
pub async fn debug_connections(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ConnectionsDto>, StatusCode> {
    match state.repository.get_room().await {
        Ok(room) => Ok(Json(ConnectionsDto::from_room(&room, &state.instance))),
        Err(e) => {
            tracing::warn!("Failed to read connection registry: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
