use crate::config::Settings;
use ghapp_broker::{
    create_cache, AssertionSigner, Broker, ConfigStore, FileStorage, GitHubClient,
    InMemoryStorage, Storage,
};
use log::{info, warn};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub broker: Arc<Broker>,
}

impl AppState {
    fn create_github_client(timeout: Duration) -> Result<Client, std::io::Error> {
        Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()
            .map_err(|e| std::io::Error::other(format!("Failed to create GitHub client: {}", e)))
    }

    /// Build the application state, opening file storage when a storage path
    /// is configured.
    pub async fn new(settings: Settings) -> Result<Self, std::io::Error> {
        let storage: Arc<dyn Storage> = match &settings.storage_path {
            Some(path) => {
                info!("Persisting configuration under {}", path.display());
                Arc::new(FileStorage::open(path).await.map_err(|e| {
                    std::io::Error::other(format!("Failed to open storage: {}", e))
                })?)
            }
            None => {
                warn!("No storage path configured, configuration will not survive restarts");
                Arc::new(InMemoryStorage::new())
            }
        };

        Self::with_storage(settings, storage)
    }

    /// Build the application state over an existing storage backend
    pub fn with_storage(
        settings: Settings,
        storage: Arc<dyn Storage>,
    ) -> Result<Self, std::io::Error> {
        let cache_options = settings.cache.options().map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
        })?;
        let token_scope = settings
            .cache
            .token_cache_scope()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        let cache = create_cache(&cache_options)
            .map_err(|e| std::io::Error::other(format!("Failed to create cache: {}", e)))?;

        let github = GitHubClient::new(
            Self::create_github_client(settings.request_timeout())?,
            Some(settings.github_api_url.clone()),
        );

        let broker = Broker::new(
            ConfigStore::new(storage),
            AssertionSigner::default(),
            Arc::new(github),
            cache,
        )
        .with_token_scope(token_scope);

        Ok(Self {
            settings: Arc::new(settings),
            broker: Arc::new(broker),
        })
    }
}
