//! Global settings store implementations
//!
//! `FileSettingsStore` keeps every record in one JSON document
//! (`{ key: { prop: value } }`). Writes go to a sibling temp file that is then
//! renamed over the original, so a crash mid-write leaves the previous
//! document intact.

use super::SettingsStore;
use crate::error::{Error, Result};
use crate::settings::types::Properties;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

type Records = HashMap<String, Properties>;

/// In-process settings store
#[derive(Default)]
pub struct MemorySettingsStore {
    records: RwLock<Records>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn read(&self, key: &str) -> Result<Option<Properties>> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: Properties) -> Result<()> {
        self.records.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// JSON-file backed settings store
pub struct FileSettingsStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl FileSettingsStore {
    /// Create a store at `path`, creating parent directories as needed
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tracing::debug!(path = %path.display(), "Opened settings store");
        Ok(Self {
            path,
            lock: RwLock::new(()),
        })
    }

    async fn load(&self) -> Result<Records> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Records::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                Error::Store(format!(
                    "Corrupt settings file {}: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Records::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn persist(&self, records: &Records) -> Result<()> {
        let json = serde_json::to_vec_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn read(&self, key: &str) -> Result<Option<Properties>> {
        let _guard = self.lock.read().await;
        let mut records = self.load().await?;
        Ok(records.remove(key))
    }

    async fn write(&self, key: &str, value: Properties) -> Result<()> {
        let _guard = self.lock.write().await;
        let mut records = self.load().await?;
        records.insert(key.to_string(), value);
        self.persist(&records).await
    }
}
