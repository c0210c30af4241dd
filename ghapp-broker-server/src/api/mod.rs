pub(crate) mod config;
pub(crate) mod health;
pub(crate) mod token;

use crate::state::AppState;
use axum::{routing::get, Router};

/// Combines all API routes into a single router
pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/config",
            get(config::read_config)
                .post(config::write_config)
                .put(config::write_config)
                .delete(config::delete_config),
        )
        .route("/token", get(token::list_organizations))
        .route(
            "/token/{organization}",
            get(token::issue_token)
                .post(token::issue_token)
                .put(token::issue_token),
        )
}
