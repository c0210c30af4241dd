//! GitHub App API client
//!
//! Lists the installations of the App and requests installation access tokens.

use crate::context::RequestContext;
use crate::error::BrokerError;
use crate::signer::SignedAssertion;
use async_trait::async_trait;
use log::{debug, error};
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Media type required by the installation endpoints
pub const MACHINE_MAN_PREVIEW: &str = "application/vnd.github.machine-man-preview+json";

const USER_AGENT_VALUE: &str = concat!("ghapp-broker/", env!("CARGO_PKG_VERSION"));

/// Binding between the App and one organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installation {
    pub id: u64,
    pub login: String,
}

#[derive(Deserialize)]
struct InstallationRecord {
    id: u64,
    account: Account,
}

#[derive(Deserialize)]
struct Account {
    login: String,
}

impl From<InstallationRecord> for Installation {
    fn from(record: InstallationRecord) -> Self {
        Self {
            id: record.id,
            login: record.account.login,
        }
    }
}

/// Installation access token as returned by GitHub.
///
/// An empty `token` means no token was issued.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    #[serde(default)]
    pub token: String,
    /// ISO-8601 expiry reported by GitHub, informational only
    #[serde(default)]
    pub expires_at: String,
}

impl AccessToken {
    pub fn is_empty(&self) -> bool {
        self.token.is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &if self.is_empty() { "" } else { "<redacted>" })
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// The two remote calls the broker relies on
#[async_trait]
pub trait InstallationsApi: Send + Sync {
    /// All installations reachable by the App
    async fn list_installations(
        &self,
        assertion: &SignedAssertion,
        ctx: &RequestContext,
    ) -> Result<Vec<Installation>, BrokerError>;

    /// Mint an access token scoped to one installation
    async fn mint_token(
        &self,
        installation_id: u64,
        assertion: &SignedAssertion,
        ctx: &RequestContext,
    ) -> Result<AccessToken, BrokerError>;
}

/// [`InstallationsApi`] over the GitHub REST API
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: String,
}

impl GitHubClient {
    /// Create a client against `base_url`, or api.github.com when `None`
    pub fn new(client: Client, base_url: Option<String>) -> Self {
        let base_url = base_url
            .unwrap_or_else(|| GITHUB_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(&self, request: RequestBuilder, assertion: &SignedAssertion) -> RequestBuilder {
        request
            .header(AUTHORIZATION, format!("Bearer {}", assertion.as_str()))
            .header(ACCEPT, MACHINE_MAN_PREVIEW)
            .header(USER_AGENT, USER_AGENT_VALUE)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        expected: StatusCode,
        ctx: &RequestContext,
    ) -> Result<T, BrokerError> {
        ctx.run(async move {
            let response = request.send().await.map_err(BrokerError::from_reqwest)?;

            let status = response.status();
            if status != expected {
                let body = response.text().await.unwrap_or_default();
                error!("GitHub API error {}: {}", status, body);
                return Err(BrokerError::RemoteStatus {
                    code: status.as_u16(),
                });
            }

            let body = response.bytes().await.map_err(BrokerError::from_reqwest)?;
            serde_json::from_slice(&body).map_err(|e| BrokerError::Decode(e.to_string()))
        })
        .await
    }
}

#[async_trait]
impl InstallationsApi for GitHubClient {
    async fn list_installations(
        &self,
        assertion: &SignedAssertion,
        ctx: &RequestContext,
    ) -> Result<Vec<Installation>, BrokerError> {
        let url = format!("{}/app/installations", self.base_url);
        debug!("Listing installations: {}", url);

        let request = self.authorized(self.client.get(&url), assertion);
        let records: Vec<InstallationRecord> = self.send(request, StatusCode::OK, ctx).await?;

        debug!("Found {} installations", records.len());
        Ok(records.into_iter().map(Installation::from).collect())
    }

    async fn mint_token(
        &self,
        installation_id: u64,
        assertion: &SignedAssertion,
        ctx: &RequestContext,
    ) -> Result<AccessToken, BrokerError> {
        let url = format!(
            "{}/app/installations/{}/access_tokens",
            self.base_url, installation_id
        );
        debug!("Requesting access token for installation {}", installation_id);

        let request = self.authorized(self.client.post(&url), assertion);
        self.send(request, StatusCode::CREATED, ctx).await
    }
}
