use crate::openapi::HEALTH_TAG;
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ghapp_broker::CacheBackend;
use log::warn;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// "ok" or "error"
    pub status: String,
    /// Cache health, "ok" or the failure reason
    pub cache: String,
    /// Whether the App configuration has been written
    pub configured: bool,
    #[serde(skip)]
    status_code: StatusCode,
}

impl IntoResponse for HealthResponse {
    fn into_response(self) -> Response {
        (self.status_code, Json(self)).into_response()
    }
}

/// Health check handler
#[utoipa::path(
    get,
    path = "/health",
    tag = HEALTH_TAG,
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is not healthy", body = HealthResponse)
    )
)]
pub(crate) async fn health_check(State(state): State<AppState>) -> HealthResponse {
    let cache = state.broker.cache().health_check().await;
    let configured = state.broker.config_exists().await;

    let healthy = cache.is_ok() && configured.is_ok();
    if !healthy {
        warn!(
            "Health check failed: cache={:?} storage={:?}",
            cache,
            configured.as_ref().err().map(ToString::to_string)
        );
    }

    HealthResponse {
        status: if healthy { "ok" } else { "error" }.to_string(),
        cache: cache.err().unwrap_or_else(|| "ok".to_string()),
        configured: configured.unwrap_or(false),
        status_code: if healthy {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        },
    }
}
