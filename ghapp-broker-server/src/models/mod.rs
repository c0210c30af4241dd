use ghapp_broker::{ConfigUpdate, ConfigView, IssuedToken, Organizations};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Configuration as returned to callers; the private key is never included
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct ConfigResponse {
    /// GitHub App identifier
    pub app_id: u64,
}

impl From<ConfigView> for ConfigResponse {
    fn from(view: ConfigView) -> Self {
        Self {
            app_id: view.app_id,
        }
    }
}

/// Create or update the App configuration. Omitted fields keep their
/// current value.
#[derive(Serialize, Deserialize, ToSchema, Clone, Default)]
pub struct ConfigRequest {
    /// PEM encoded PKCS#1 RSA private key of the App
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    /// GitHub App identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<u64>,
}

impl fmt::Debug for ConfigRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigRequest")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("app_id", &self.app_id)
            .finish()
    }
}

impl From<ConfigRequest> for ConfigUpdate {
    fn from(request: ConfigRequest) -> Self {
        Self {
            private_key: request.private_key,
            app_id: request.app_id,
        }
    }
}

/// Organizations the App is installed on
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct OrganizationsResponse {
    /// Organization logins in the order GitHub returns them
    pub organizations: Vec<String>,
}

impl From<Organizations> for OrganizationsResponse {
    fn from(result: Organizations) -> Self {
        Self {
            organizations: result.organizations,
        }
    }
}

/// Installation access token. `token` and `expires_at` are empty when the App
/// is not installed on the organization.
#[derive(Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct TokenResponse {
    /// Installation access token
    pub token: String,
    /// Expiry reported by GitHub (ISO-8601)
    pub expires_at: String,
    /// Always "token"
    pub token_type: String,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("token", &if self.token.is_empty() { "" } else { "<redacted>" })
            .field("expires_at", &self.expires_at)
            .field("token_type", &self.token_type)
            .finish()
    }
}

impl From<IssuedToken> for TokenResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            token: issued.token,
            expires_at: issued.expires_at,
            token_type: issued.token_type,
        }
    }
}
