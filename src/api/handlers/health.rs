use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub workspace: String,
    pub converter: String,
    pub validator: String,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service status and configured tools", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        workspace: state.workspace.root().display().to_string(),
        converter: state.config.converter.to_string(),
        validator: state.config.validator.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
