use crate::api;
use crate::errors::ErrorResponse;
use crate::models::{ConfigRequest, ConfigResponse, OrganizationsResponse, TokenResponse};
use utoipa::OpenApi;

pub(crate) const HEALTH_TAG: &str = "Health API";
pub(crate) const CONFIG_TAG: &str = "Configuration API";
pub(crate) const TOKEN_TAG: &str = "Token API";

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::config::read_config,
        api::config::write_config,
        api::config::delete_config,
        api::token::list_organizations,
        api::token::issue_token,
    ),
    components(schemas(
        ConfigRequest,
        ConfigResponse,
        OrganizationsResponse,
        TokenResponse,
        ErrorResponse,
        api::health::HealthResponse,
    )),
    tags(
        (name = HEALTH_TAG, description = "Health check endpoints"),
        (name = CONFIG_TAG, description = "Configure the GitHub App identifier and private key"),
        (name = TOKEN_TAG, description = "List installed organizations and issue installation access tokens"),
    ),
    info(
        title = "GitHub App Broker API",
        description = "Issues short-lived GitHub installation access tokens on behalf of a GitHub App",
        version = "0.1.0"
    )
)]
pub(crate) struct ApiDoc;
