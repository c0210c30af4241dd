//! Organization listing and token issuance on behalf of the GitHub App.

use crate::cache::{Cache, CacheBackend};
use crate::config::{ConfigStore, ConfigUpdate, ConfigView};
use crate::context::RequestContext;
use crate::error::BrokerError;
use crate::github::{AccessToken, InstallationsApi};
use crate::signer::{AssertionSigner, SignedAssertion};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cache key of the organization list
pub const ORGS_CACHE_KEY: &str = "orgs";

/// Cache key of the most recently issued access token
pub const TOKEN_CACHE_KEY: &str = "access_token";

/// Literal `token_type` of every issued token
pub const TOKEN_TYPE: &str = "token";

/// How issued tokens are keyed in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenCacheScope {
    /// One cached token for all organizations. A request for organization B
    /// returns the token cached for organization A until it expires.
    #[default]
    Global,
    /// One cached token per organization
    PerOrganization,
}

impl TokenCacheScope {
    fn cache_key(&self, organization: &str) -> String {
        match self {
            Self::Global => TOKEN_CACHE_KEY.to_string(),
            Self::PerOrganization => format!("{TOKEN_CACHE_KEY}:{organization}"),
        }
    }
}

impl std::str::FromStr for TokenCacheScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(Self::Global),
            "per-organization" => Ok(Self::PerOrganization),
            other => Err(format!("unknown token cache scope '{other}'")),
        }
    }
}

/// Result of listing organizations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organizations {
    pub organizations: Vec<String>,
}

/// Result of issuing a token. Empty `token` and `expires_at` mean the App is
/// not installed on the requested organization.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: String,
    pub token_type: String,
}

impl IssuedToken {
    pub fn is_empty(&self) -> bool {
        self.token.is_empty()
    }
}

impl std::fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &if self.is_empty() { "" } else { "<redacted>" })
            .field("expires_at", &self.expires_at)
            .field("token_type", &self.token_type)
            .finish()
    }
}

impl From<AccessToken> for IssuedToken {
    fn from(token: AccessToken) -> Self {
        Self {
            token: token.token,
            expires_at: token.expires_at,
            token_type: TOKEN_TYPE.to_string(),
        }
    }
}

/// Composes configuration, signing, the GitHub client and the cache into the
/// user-facing operations.
pub struct Broker {
    store: ConfigStore,
    signer: AssertionSigner,
    github: Arc<dyn InstallationsApi>,
    cache: Cache,
    token_scope: TokenCacheScope,
}

impl Broker {
    pub fn new(
        store: ConfigStore,
        signer: AssertionSigner,
        github: Arc<dyn InstallationsApi>,
        cache: Cache,
    ) -> Self {
        Self {
            store,
            signer,
            github,
            cache,
            token_scope: TokenCacheScope::default(),
        }
    }

    pub fn with_token_scope(mut self, scope: TokenCacheScope) -> Self {
        self.token_scope = scope;
        self
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Configuration without the private key, `None` if not configured
    pub async fn read_config(&self) -> Result<Option<ConfigView>, BrokerError> {
        Ok(self.store.view().await?)
    }

    /// Create or update the configuration. Cached results are left as they are.
    pub async fn write_config(&self, update: ConfigUpdate) -> Result<(), BrokerError> {
        Ok(self.store.write(update).await?)
    }

    pub async fn delete_config(&self) -> Result<(), BrokerError> {
        Ok(self.store.delete().await?)
    }

    pub async fn config_exists(&self) -> Result<bool, BrokerError> {
        Ok(self.store.exists().await?)
    }

    /// Organizations the App is installed on, in the order GitHub returns them.
    ///
    /// Non-empty results are cached; an empty list is returned but not cached.
    pub async fn list_organizations(
        &self,
        ctx: &RequestContext,
    ) -> Result<Organizations, BrokerError> {
        if let Some(organizations) = self.cached::<Vec<String>>(ORGS_CACHE_KEY).await {
            debug!("Serving {} organizations from cache", organizations.len());
            return Ok(Organizations { organizations });
        }

        let assertion = self.assertion().await?;
        let installations = self.github.list_installations(&assertion, ctx).await?;

        let organizations: Vec<String> = installations.into_iter().map(|i| i.login).collect();

        if organizations.is_empty() {
            info!("App has no installations, not caching the empty list");
        } else {
            self.remember(ORGS_CACHE_KEY, &organizations).await;
        }

        Ok(Organizations { organizations })
    }

    /// Issue an installation access token for `organization`.
    ///
    /// When the App is not installed on the organization an empty token is
    /// returned rather than an error.
    pub async fn issue_token(
        &self,
        organization: &str,
        ctx: &RequestContext,
    ) -> Result<IssuedToken, BrokerError> {
        let cache_key = self.token_scope.cache_key(organization);

        if let Some(token) = self.cached::<AccessToken>(&cache_key).await {
            debug!("Serving access token from cache key '{}'", cache_key);
            return Ok(token.into());
        }

        let assertion = self.assertion().await?;
        let installations = self.github.list_installations(&assertion, ctx).await?;

        let token = match installations.iter().find(|i| i.login == organization) {
            Some(installation) => {
                self.github
                    .mint_token(installation.id, &assertion, ctx)
                    .await?
            }
            None => {
                info!("No installation found for organization '{}'", organization);
                AccessToken::default()
            }
        };

        if !token.is_empty() {
            info!("Issued access token for organization '{}'", organization);
            self.remember(&cache_key, &token).await;
        }

        Ok(token.into())
    }

    async fn assertion(&self) -> Result<SignedAssertion, BrokerError> {
        let config = self.store.read().await?;
        self.signer.sign(config.as_ref())
    }

    async fn cached<T: DeserializeOwned + Send + Sync>(&self, key: &str) -> Option<T> {
        match self.cache.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to read '{}' from cache, treating as miss: {}", key, e);
                None
            }
        }
    }

    async fn remember<T: Serialize + Send + Sync>(&self, key: &str, value: &T) {
        if let Err(e) = self.cache.set(key, value).await {
            warn!("Failed to cache '{}': {}", key, e);
        }
    }
}
