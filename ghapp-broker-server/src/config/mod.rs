pub(crate) use crate::config::cache::CacheConfig;
use confique::Config;
use std::path::PathBuf;
use std::time::Duration;

pub mod cache;

/// Main configuration structure for the broker server
#[derive(Debug, Config, Clone)]
pub struct Settings {
    /// The port the server will listen to (default: 8200)
    #[config(env = "BROKER_PORT", default = 8200)]
    pub port: u16,

    /// Base URL of the GitHub REST API (default: https://api.github.com)
    #[config(env = "BROKER_GITHUB_API_URL", default = "https://api.github.com")]
    pub github_api_url: String,

    /// Upper bound in seconds on each request to GitHub (default: 30)
    #[config(env = "BROKER_REQUEST_TIMEOUT", default = 30)]
    pub request_timeout: u64,

    /// Directory holding the persisted configuration. Kept in memory when unset.
    #[config(env = "BROKER_STORAGE_PATH")]
    pub storage_path: Option<PathBuf>,

    /// Cache configuration
    #[config(nested)]
    pub cache: CacheConfig,
}

impl Settings {
    /// Creates a new Settings instance from environment variables
    pub fn new() -> Result<Self, confique::Error> {
        Settings::builder().env().load()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    #[cfg(test)]
    pub fn for_test_with_mock(github_mock: &wiremock::MockServer) -> Self {
        Self {
            port: 0, // Let the OS choose a port
            github_api_url: github_mock.uri(),
            request_timeout: 5,
            storage_path: None,
            cache: CacheConfig {
                store: "in-memory".to_string(),
                ttl: 600,
                sweep_interval: 900,
                memory_capacity: 16,
                token_scope: "global".to_string(),
            },
        }
    }
}
