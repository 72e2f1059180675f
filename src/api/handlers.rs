// Request handlers for API endpoints

use axum::{
    extract::{Query, State},
    response::Json,
    Extension,
};
use std::collections::HashMap;
use tracing::{error, info, warn};

use crate::api::middleware::RequestId;
use crate::api::responses::{ApiError, HealthResponse, LikeResponse};
use crate::api::AppState;
use crate::core::models::{Region, TargetId};
use crate::engine::InvocationResult;

/// Main handler for the like endpoint
///
/// GET /api/like?uid=<digits>&server=<region>
///
/// Request flow:
/// 1. Validate `uid` (400 before anything else happens)
/// 2. Resolve `server`, defaulting to the configured region
/// 3. Run the deployed dispatch shape
/// 4. Map the result or error to JSON
pub async fn like_handler(
    State(app_state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<LikeResponse>, ApiError> {
    let target = TargetId::parse(params.get("uid").map(String::as_str).unwrap_or("")).map_err(|e| {
        warn!(request_id = %request_id.0, uid = ?params.get("uid"), "Rejected request with invalid uid");
        ApiError::from_bridge_error(e)
    })?;

    let region = params
        .get("server")
        .filter(|s| !s.trim().is_empty())
        .map(|s| Region::new(s))
        .unwrap_or_else(|| app_state.config.default_region.clone());

    let shape = app_state.config.dispatch_shape;

    info!(
        request_id = %request_id.0,
        uid = %target,
        server = %region,
        shape = %shape,
        "Received like request"
    );

    let result = app_state
        .coordinator
        .run(shape, target, &region)
        .await
        .map_err(|e| {
            error!(request_id = %request_id.0, error = %e, "Like request failed");
            ApiError::from_bridge_error(e)
        })?;

    Ok(Json(match result {
        InvocationResult::Broadcast(summary) => LikeResponse::Broadcast(summary.into()),
        InvocationResult::Single(report) => LikeResponse::Single(report.into()),
    }))
}

/// Health check handler
///
/// GET /health
pub async fn health_handler(State(app_state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        shape: app_state.config.dispatch_shape.to_string(),
        regions: app_state
            .regions
            .regions()
            .into_iter()
            .map(|r| r.to_string())
            .collect(),
    })
}
