use confique::Config;
use ghapp_broker::{CacheError, CacheOptions, CacheStore, TokenCacheScope};
use std::time::Duration;

/// Configuration for the caching subsystem
#[derive(Debug, Config, Clone)]
pub struct CacheConfig {
    /// Cache store type: "in-memory" or "none" (default: in-memory)
    #[config(env = "BROKER_CACHE_STORE", default = "in-memory")]
    pub store: String,

    /// Lifetime of cached entries in seconds (default: 600)
    #[config(env = "BROKER_CACHE_TTL", default = 600)]
    pub ttl: u64,

    /// Seconds between sweeps of expired entries, must exceed the ttl
    /// (default: 900)
    #[config(env = "BROKER_CACHE_SWEEP_INTERVAL", default = 900)]
    pub sweep_interval: u64,

    /// Maximum in-memory capacity in MiB (default: 16)
    #[config(env = "BROKER_CACHE_MEMORY_CAPACITY", default = 16)]
    pub memory_capacity: usize,

    /// How issued tokens are keyed: "global" or "per-organization"
    /// (default: global)
    #[config(env = "BROKER_CACHE_TOKEN_SCOPE", default = "global")]
    pub token_scope: String,
}

impl CacheConfig {
    /// Options for [`ghapp_broker::create_cache`]
    pub fn options(&self) -> Result<CacheOptions, CacheError> {
        Ok(CacheOptions {
            store: self.store.trim().parse::<CacheStore>()?,
            ttl: Duration::from_secs(self.ttl),
            sweep_interval: Duration::from_secs(self.sweep_interval),
            capacity_mib: self.memory_capacity,
        })
    }

    /// Parsed token cache scope
    pub fn token_cache_scope(&self) -> Result<TokenCacheScope, String> {
        self.token_scope.trim().parse()
    }
}
