// Response types for API endpoints

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::core::errors::BridgeError;
use crate::core::models::{BroadcastSummary, SingleAccountReport};

/// Success body of the broadcast shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BroadcastResponse {
    pub uid: u64,
    pub server: String,
    pub likes_sent: usize,
    pub total_tokens: usize,
}

impl From<BroadcastSummary> for BroadcastResponse {
    fn from(summary: BroadcastSummary) -> Self {
        Self {
            uid: summary.uid.get(),
            server: summary.server.to_string(),
            likes_sent: summary.likes_sent,
            total_tokens: summary.total_tokens,
        }
    }
}

/// Success body of the single-account shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SingleAccountResponse {
    pub success: bool,
    pub uid: String,
    pub server: String,
    pub timestamp: i64,
}

impl From<SingleAccountReport> for SingleAccountResponse {
    fn from(report: SingleAccountReport) -> Self {
        Self {
            success: true,
            uid: report.uid.to_string(),
            server: report.server.to_string(),
            timestamp: report.timestamp,
        }
    }
}

/// Success body of `/api/like`, whichever shape is deployed
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LikeResponse {
    Broadcast(BroadcastResponse),
    Single(SingleAccountResponse),
}

/// Error response structure
///
/// Client errors carry only `error`; server errors also carry `"success": false`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    pub error: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub shape: String,
    pub regions: Vec<String>,
}

/// API error type that converts domain errors to HTTP responses
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, message: String) -> Self {
        Self { status, message }
    }

    /// Create from BridgeError
    pub fn from_bridge_error(err: BridgeError) -> Self {
        let status = StatusCode::from_u16(err.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self {
            status,
            message: err.user_message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let success = if self.status.is_client_error() { None } else { Some(false) };
        let body = Json(ErrorResponse {
            success,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        ApiError::from_bridge_error(err)
    }
}
