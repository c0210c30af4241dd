use super::{CacheBackend, CacheError};
use async_trait::async_trait;
use log::{debug, info};
use moka::future::Cache as MokaCache;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct InMemoryCache {
    cache: MokaCache<String, String>,
    sweep_interval: Duration,
}

impl InMemoryCache {
    /// Initialize a new in-memory cache instance.
    ///
    /// `sweep_interval` must be longer than `ttl`; expired entries that have
    /// not been swept yet are still reported as missing.
    pub fn new(ttl: Duration, sweep_interval: Duration, capacity_mib: usize) -> Result<Self, CacheError> {
        if sweep_interval <= ttl {
            return Err(CacheError::Config(format!(
                "sweep interval ({}s) must be longer than ttl ({}s)",
                sweep_interval.as_secs(),
                ttl.as_secs()
            )));
        }

        // Convert MiB to bytes for max_capacity (1 MiB = 1024 * 1024 bytes)
        let max_capacity_bytes: u64 = capacity_mib
            .checked_mul(1024 * 1024)
            .and_then(|bytes| u64::try_from(bytes).ok())
            .ok_or_else(|| CacheError::Config("Capacity overflow".to_string()))?;

        let cache = MokaCache::builder()
            .time_to_live(ttl)
            .weigher(|_key, value: &String| -> u32 { value.len().try_into().unwrap_or(u32::MAX) })
            .max_capacity(max_capacity_bytes)
            .build();

        Ok(Self {
            cache,
            sweep_interval,
        })
    }

    /// Number of entries currently held, including expired ones not yet swept
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Reclaim expired entries now
    pub async fn sweep(&self) {
        self.cache.run_pending_tasks().await;
    }

    /// Spawn a task that sweeps expired entries every sweep interval until
    /// `token` is cancelled.
    pub fn spawn_sweeper(&self, token: CancellationToken) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(cache.sweep_interval);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        cache.sweep().await;
                        debug!("Cache sweep done, {} entries left", cache.entry_count());
                    }
                    _ = token.cancelled() => {
                        info!("Cache sweeper shutting down");
                        break;
                    }
                }
            }
        })
    }
}

#[async_trait]
impl CacheBackend for InMemoryCache {
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), CacheError> {
        let serialized = serde_json::to_string(value)?;
        self.cache.insert(key.to_string(), serialized).await;
        Ok(())
    }

    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        key: &str,
    ) -> Result<Option<T>, CacheError> {
        if let Some(value) = self.cache.get(key).await {
            serde_json::from_str(&value)
                .map_err(|e| CacheError::Deserialization(e.to_string()))
                .map(Some)
        } else {
            Ok(None)
        }
    }

    async fn health_check(&self) -> Result<(), String> {
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.cache.remove(key).await;
        Ok(())
    }
}
