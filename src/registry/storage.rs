//! Storage backends for the registry document
//!
//! A storage only moves the whole serialized document in and out. It knows
//! nothing about entries, and none of the backends lock: two writers racing
//! on the same document end with the last write winning.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::debug;

use crate::error::RegistryError;

#[async_trait::async_trait]
pub trait DocumentStorage: Send + Sync {
    /// Read the whole document
    async fn load(&self) -> Result<Vec<u8>, RegistryError>;

    /// Replace the whole document
    async fn store(&self, document: &[u8]) -> Result<(), RegistryError>;

    /// Whether a document exists at all
    async fn exists(&self) -> bool;

    /// Human-readable location for logs
    fn describe(&self) -> String;
}

/// One JSON file on disk
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl DocumentStorage for FileStorage {
    async fn load(&self) -> Result<Vec<u8>, RegistryError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| RegistryError::Read(format!("{}: {}", self.path.display(), e)))
    }

    async fn store(&self, document: &[u8]) -> Result<(), RegistryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RegistryError::Write(format!("{}: {}", parent.display(), e)))?;
        }

        tokio::fs::write(&self.path, document)
            .await
            .map_err(|e| RegistryError::Write(format!("{}: {}", self.path.display(), e)))?;

        debug!("Wrote {} bytes to {}", document.len(), self.path.display());
        Ok(())
    }

    async fn exists(&self) -> bool {
        tokio::fs::metadata(&self.path).await.is_ok()
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-process document
#[derive(Debug, Default)]
pub struct MemoryStorage {
    document: Mutex<Option<Vec<u8>>>,
}

impl MemoryStorage {
    /// Storage with no document yet (reads fail)
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage seeded with a document
    pub fn with_document(document: impl Into<Vec<u8>>) -> Self {
        Self {
            document: Mutex::new(Some(document.into())),
        }
    }

    /// Current raw document, if any
    pub async fn snapshot(&self) -> Option<Vec<u8>> {
        self.document.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl DocumentStorage for MemoryStorage {
    async fn load(&self) -> Result<Vec<u8>, RegistryError> {
        self.document
            .lock()
            .await
            .clone()
            .ok_or_else(|| RegistryError::Read("no document".to_string()))
    }

    async fn store(&self, document: &[u8]) -> Result<(), RegistryError> {
        *self.document.lock().await = Some(document.to_vec());
        Ok(())
    }

    async fn exists(&self) -> bool {
        self.document.lock().await.is_some()
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// A key inside a flat string-to-string JSON store
///
/// Mirrors browser local storage: values are strings, and a missing store or
/// key reads as an empty list.
#[derive(Debug, Clone)]
pub struct KeyValueStorage {
    path: PathBuf,
    key: String,
}

impl KeyValueStorage {
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
        }
    }

    async fn read_store(&self) -> Result<BTreeMap<String, String>, RegistryError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| RegistryError::Read(format!("{}: {}", self.path.display(), e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(RegistryError::Read(format!("{}: {}", self.path.display(), e))),
        }
    }
}

#[async_trait::async_trait]
impl DocumentStorage for KeyValueStorage {
    async fn load(&self) -> Result<Vec<u8>, RegistryError> {
        let store = self.read_store().await?;
        Ok(store
            .get(&self.key)
            .cloned()
            .unwrap_or_else(|| "[]".to_string())
            .into_bytes())
    }

    async fn store(&self, document: &[u8]) -> Result<(), RegistryError> {
        let value = String::from_utf8(document.to_vec())
            .map_err(|e| RegistryError::Write(e.to_string()))?;

        let mut store = self.read_store().await.map_err(|e| match e {
            RegistryError::Read(msg) => RegistryError::Write(msg),
            other => other,
        })?;
        store.insert(self.key.clone(), value);

        let bytes = serde_json::to_vec_pretty(&store)
            .map_err(|e| RegistryError::Write(e.to_string()))?;
        FileStorage::new(&self.path).store(&bytes).await
    }

    async fn exists(&self) -> bool {
        // An absent key still reads as an empty list
        true
    }

    fn describe(&self) -> String {
        format!("{}#{}", self.path.display(), self.key)
    }
}
