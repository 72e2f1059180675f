// Axum web server layer

use axum::{error_handling::HandleErrorLayer, http::StatusCode, BoxError, Router};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;

pub mod handlers;
pub mod middleware;
pub mod responses;

use crate::api::responses::ApiError;
use crate::core::errors::CredentialSourceError;
use crate::core::models::{Credential, DispatchHeaders, DispatchOutcome, Region};
use crate::engine::FanOutCoordinator;
use crate::loader::region_table::RegionTable;

pub use crate::config::Config;

/// Application state containing all shared dependencies
///
/// Everything here is read-only after startup; per-request data (credentials,
/// envelopes, outcomes) never lands in the state.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<FanOutCoordinator>,
    pub regions: Arc<RegionTable>,
    pub config: Arc<Config>,
}

/// Source of per-region credentials
#[async_trait::async_trait]
pub trait CredentialSource: Send + Sync {
    /// Load the non-empty credential set for a region
    async fn load(&self, region: &Region) -> Result<Vec<Credential>, CredentialSourceError>;
}

/// Outbound call to the backend
///
/// Never fails: transport problems come back as `DispatchOutcome::Failed` so
/// the caller decides whether to absorb or escalate them.
#[async_trait::async_trait]
pub trait DispatchClient: Send + Sync {
    async fn send(
        &self,
        endpoint: &str,
        envelope: Vec<u8>,
        headers: &DispatchHeaders,
    ) -> DispatchOutcome;
}

/// Create the Axum router with all routes and middleware
///
/// Middleware stack (outermost to innermost):
/// - Request timeout (tower::timeout) with HandleErrorLayer, answered as a
///   JSON 500 like any other internal failure
/// - Tracing middleware (tower-http::trace)
/// - Request ID propagation
pub fn create_router(app_state: &AppState) -> Router<AppState> {
    let router = Router::new()
        .route("/api/like", axum::routing::get(handlers::like_handler))
        .route("/health", axum::routing::get(handlers::health_handler))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(middleware::tracing_layer());

    let timeout_secs = app_state.config.request_timeout_secs;

    let middleware_stack = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(move |e: BoxError| async move {
            let message = if e.is::<tower::timeout::error::Elapsed>() {
                format!("request timed out after {}s", timeout_secs)
            } else {
                format!("internal error: {}", e)
            };
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, message)
        }))
        .timeout(Duration::from_secs(timeout_secs))
        .into_inner();

    router.layer(middleware_stack)
}
