//! GitHub App configuration record and its accessor.

use crate::storage::{Storage, StorageError};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Storage key of the configuration record
pub const CONFIG_KEY: &str = "config";

/// The single configuration record: the App identifier and its private key.
///
/// Records stored with the legacy `PrivateKey` and `AppID` field names still decode.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// PEM encoded PKCS#1 RSA private key
    #[serde(default, alias = "PrivateKey")]
    pub private_key: String,
    /// GitHub App identifier
    #[serde(default, alias = "AppID")]
    pub app_id: u64,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("private_key", &"<redacted>")
            .field("app_id", &self.app_id)
            .finish()
    }
}

/// Partial update applied by [`ConfigStore::write`]. `None` fields are left untouched.
#[derive(Clone, Default, Deserialize)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub private_key: Option<String>,
    #[serde(default)]
    pub app_id: Option<u64>,
}

impl fmt::Debug for ConfigUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigUpdate")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("app_id", &self.app_id)
            .finish()
    }
}

/// Read-only projection of the configuration; the private key is withheld.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigView {
    pub app_id: u64,
}

impl From<&AppConfig> for ConfigView {
    fn from(config: &AppConfig) -> Self {
        Self {
            app_id: config.app_id,
        }
    }
}

/// Reads and writes the configuration record in the backing [`Storage`].
#[derive(Clone)]
pub struct ConfigStore {
    storage: Arc<dyn Storage>,
    // Serializes read-merge-write cycles so concurrent updates are not lost
    write_lock: Arc<Mutex<()>>,
}

impl ConfigStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Load the configuration, `None` when nothing has been written yet
    pub async fn read(&self) -> Result<Option<AppConfig>, StorageError> {
        let Some(raw) = self.storage.get(CONFIG_KEY).await? else {
            return Ok(None);
        };

        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|source| StorageError::Corrupt {
                key: CONFIG_KEY.to_string(),
                source,
            })
    }

    /// Non-sensitive view of the configuration
    pub async fn view(&self) -> Result<Option<ConfigView>, StorageError> {
        Ok(self.read().await?.as_ref().map(ConfigView::from))
    }

    /// Merge `update` into the stored record, creating it if absent
    pub async fn write(&self, update: ConfigUpdate) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let existing = self.read().await?;
        let created = existing.is_none();
        let mut config = existing.unwrap_or_default();

        if let Some(private_key) = update.private_key {
            config.private_key = private_key;
        }
        if let Some(app_id) = update.app_id {
            config.app_id = app_id;
        }

        let raw = serde_json::to_vec(&config).map_err(|source| StorageError::Corrupt {
            key: CONFIG_KEY.to_string(),
            source,
        })?;
        self.storage.put(CONFIG_KEY, raw).await?;

        if created {
            info!("Created configuration for app {}", config.app_id);
        } else {
            debug!("Updated configuration for app {}", config.app_id);
        }
        Ok(())
    }

    /// Remove the configuration. Deleting a missing record succeeds.
    pub async fn delete(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        self.storage.delete(CONFIG_KEY).await?;
        info!("Deleted configuration");
        Ok(())
    }

    /// Whether a configuration record exists
    pub async fn exists(&self) -> Result<bool, StorageError> {
        Ok(self.read().await?.is_some())
    }
}
