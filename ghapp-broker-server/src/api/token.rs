use crate::errors::{ApiError, ErrorResponse};
use crate::models::{OrganizationsResponse, TokenResponse};
use crate::openapi::TOKEN_TAG;
use crate::state::AppState;
use axum::extract::{Json, Path, State};
use ghapp_broker::RequestContext;
use log::{debug, error};

/// Whether `name` is an acceptable organization login: word characters at
/// both ends, word characters, `-` or `.` in between.
pub(crate) fn is_valid_organization(name: &str) -> bool {
    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';

    let mut chars = name.chars();
    let (Some(first), last) = (chars.next(), chars.next_back()) else {
        return false;
    };

    is_word(first)
        && last.is_none_or(is_word)
        && chars.all(|c| is_word(c) || c == '-' || c == '.')
}

/// List the organizations the App is installed on
#[utoipa::path(
    get,
    path = "/token",
    tag = TOKEN_TAG,
    responses(
        (status = 200, description = "Organizations the App is installed on", body = OrganizationsResponse),
        (status = 400, description = "The App is not configured or its key is invalid", body = ErrorResponse),
        (status = 502, description = "GitHub could not be reached or refused the request", body = ErrorResponse),
        (status = 504, description = "GitHub did not answer in time", body = ErrorResponse)
    )
)]
pub(crate) async fn list_organizations(
    State(state): State<AppState>,
) -> Result<Json<OrganizationsResponse>, ApiError> {
    let ctx = RequestContext::with_timeout(state.settings.request_timeout());

    let result = state.broker.list_organizations(&ctx).await.map_err(|e| {
        error!("Failed to list organizations: {}", e);
        ApiError::from(e)
    })?;

    Ok(Json(result.into()))
}

/// Issue an installation access token for an organization. Also served on
/// POST and PUT.
///
/// When the App is not installed on the organization the token and its
/// expiry are empty strings.
#[utoipa::path(
    get,
    path = "/token/{organization}",
    tag = TOKEN_TAG,
    params(
        ("organization" = String, Path, description = "Login of the GitHub organization"),
    ),
    responses(
        (status = 200, description = "Access token for the organization", body = TokenResponse),
        (status = 400, description = "Invalid organization name, or the App is not configured", body = ErrorResponse),
        (status = 502, description = "GitHub could not be reached or refused the request", body = ErrorResponse),
        (status = 504, description = "GitHub did not answer in time", body = ErrorResponse)
    )
)]
pub(crate) async fn issue_token(
    State(state): State<AppState>,
    Path(organization): Path<String>,
) -> Result<Json<TokenResponse>, ApiError> {
    if !is_valid_organization(&organization) {
        debug!("Rejected organization name '{}'", organization);
        return Err(ApiError::bad_request(format!(
            "invalid organization name '{organization}'"
        )));
    }

    let ctx = RequestContext::with_timeout(state.settings.request_timeout());

    let issued = state
        .broker
        .issue_token(&organization, &ctx)
        .await
        .map_err(|e| {
            error!("Failed to issue token for '{}': {}", organization, e);
            ApiError::from(e)
        })?;

    Ok(Json(issued.into()))
}
