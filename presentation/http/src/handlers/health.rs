//! Health check handler

use crate::{ApiResponse, AppState};
use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub status: String,
    pub service: String,
}

pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<HealthBody>>, (StatusCode, Json<ApiResponse<()>>)> {
    match state.services.store.health_check().await {
        Ok(()) => Ok(Json(ApiResponse::success(HealthBody {
            status: "healthy".to_string(),
            service: "chronofact".to_string(),
        }))),
        Err(e) => {
            let msg = format!("store unhealthy: {e}");
            Err((StatusCode::SERVICE_UNAVAILABLE, Json(ApiResponse::<()>::error(msg))))
        }
    }
}
