use std::sync::Arc;

use tracing::{debug, info};

use super::entry::RecordingEntry;
use super::storage::DocumentStorage;
use crate::error::RegistryError;

/// The recordings registry: an ordered list of entries in one JSON document
///
/// `append` is a plain read-modify-write of the whole document with no
/// lock around it. Concurrent appends may lose all but the last write.
#[derive(Clone)]
pub struct Registry {
    storage: Arc<dyn DocumentStorage>,
}

impl Registry {
    pub fn new(storage: Arc<dyn DocumentStorage>) -> Self {
        Self { storage }
    }

    /// Write an empty document if none exists yet
    ///
    /// Returns `true` when a document was created.
    pub async fn initialize(&self) -> Result<bool, RegistryError> {
        if self.storage.exists().await {
            return Ok(false);
        }

        info!("Creating empty registry at {}", self.storage.describe());
        self.write(&[]).await?;
        Ok(true)
    }

    /// All entries in insertion order
    pub async fn list(&self) -> Result<Vec<RecordingEntry>, RegistryError> {
        let bytes = self.storage.load().await?;
        let entries: Vec<RecordingEntry> = serde_json::from_slice(&bytes).map_err(|e| {
            RegistryError::Read(format!("{} is corrupt: {}", self.storage.describe(), e))
        })?;

        debug!("Read {} entries from {}", entries.len(), self.storage.describe());
        Ok(entries)
    }

    /// Append `{name}` to the registry
    pub async fn append(&self, name: &str) -> Result<(), RegistryError> {
        self.append_entry(RecordingEntry::named(name)).await
    }

    /// Append a full entry to the registry
    pub async fn append_entry(&self, entry: RecordingEntry) -> Result<(), RegistryError> {
        if entry.name.trim().is_empty() {
            return Err(RegistryError::name_required());
        }

        let mut entries = self.list().await?;
        info!("Adding recording \"{}\" ({} existing)", entry.name, entries.len());
        entries.push(entry);
        self.write(&entries).await
    }

    async fn write(&self, entries: &[RecordingEntry]) -> Result<(), RegistryError> {
        let document =
            serde_json::to_vec_pretty(entries).map_err(|e| RegistryError::Write(e.to_string()))?;
        self.storage.store(&document).await
    }
}
