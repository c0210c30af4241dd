//! # ghapp-broker
//!
//! Issues short-lived GitHub installation access tokens on behalf of a
//! GitHub App whose private key is held by the broker.
//!
//! ## Components
//!
//! - **Config:** Persists the App identifier and private key.
//! - **Signer:** Produces the RS256 App assertion GitHub expects.
//! - **GitHub:** Lists installations and mints installation tokens.
//! - **Cache:** Keeps the organization list and the last token for a bounded time.
//! - **Broker:** Composes the above into `list_organizations` and `issue_token`.

pub mod broker;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod github;
pub mod signer;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_support;

pub use broker::{Broker, IssuedToken, Organizations, TokenCacheScope};
pub use cache::{create_cache, Cache, CacheBackend, CacheError, CacheOptions, CacheStore};
pub use config::{AppConfig, ConfigStore, ConfigUpdate, ConfigView};
pub use context::RequestContext;
pub use error::BrokerError;
pub use github::{AccessToken, GitHubClient, Installation, InstallationsApi};
pub use signer::{AssertionSigner, Clock, SignedAssertion, SystemClock};
pub use storage::{FileStorage, InMemoryStorage, Storage, StorageError};
