use crate::errors::{ApiError, ErrorResponse};
use crate::models::{ConfigRequest, ConfigResponse};
use crate::openapi::CONFIG_TAG;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Json, State},
    response::{IntoResponse, Response},
};
use http::StatusCode;
use log::error;

/// Read the App configuration
#[utoipa::path(
    get,
    path = "/config",
    tag = CONFIG_TAG,
    responses(
        (status = 200, description = "Current configuration, without the private key", body = ConfigResponse),
        (status = 204, description = "No configuration has been written yet"),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub(crate) async fn read_config(State(state): State<AppState>) -> Result<Response, ApiError> {
    let view = state.broker.read_config().await.map_err(|e| {
        error!("Failed to read configuration: {}", e);
        ApiError::from(e)
    })?;

    Ok(match view {
        Some(view) => (StatusCode::OK, Json(ConfigResponse::from(view))).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// Create or update the App configuration. Also served on PUT.
///
/// Omitted fields keep their stored value. Cached organizations and tokens
/// are left untouched and expire on their own.
#[utoipa::path(
    post,
    path = "/config",
    tag = CONFIG_TAG,
    request_body = ConfigRequest,
    responses(
        (status = 204, description = "Configuration written"),
        (status = 400, description = "Invalid request payload", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub(crate) async fn write_config(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let request: ConfigRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ConfigRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::bad_request(format!("invalid configuration payload: {e}")))?
    };

    state.broker.write_config(request.into()).await.map_err(|e| {
        error!("Failed to write configuration: {}", e);
        ApiError::from(e)
    })?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete the App configuration. Cached entries are left to expire.
#[utoipa::path(
    delete,
    path = "/config",
    tag = CONFIG_TAG,
    responses(
        (status = 204, description = "Configuration deleted, or there was none"),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub(crate) async fn delete_config(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.broker.delete_config().await.map_err(|e| {
        error!("Failed to delete configuration: {}", e);
        ApiError::from(e)
    })?;
    Ok(StatusCode::NO_CONTENT)
}
