//! Recording registry
//!
//! An ordered list of saved recording names kept in a single JSON document:
//! - `Registry` reads and rewrites the document through a `DocumentStorage`
//! - `RegistryClient` talks to a registry served over HTTP
//!
//! Both implement `RecordingRegistry`, the handle the recorder and the
//! listing view are given.

mod client;
mod entry;
mod storage;
mod store;

pub use client::{RegistryClient, RECORDINGS_PATH};
pub use entry::RecordingEntry;
pub use storage::{DocumentStorage, FileStorage, KeyValueStorage, MemoryStorage};
pub use store::Registry;

use crate::error::RegistryError;

/// A place recordings can be listed from and saved to
#[async_trait::async_trait]
pub trait RecordingRegistry: Send + Sync {
    async fn list(&self) -> Result<Vec<RecordingEntry>, RegistryError>;

    async fn save(&self, entry: RecordingEntry) -> Result<(), RegistryError>;
}

#[async_trait::async_trait]
impl RecordingRegistry for Registry {
    async fn list(&self) -> Result<Vec<RecordingEntry>, RegistryError> {
        Registry::list(self).await
    }

    async fn save(&self, entry: RecordingEntry) -> Result<(), RegistryError> {
        self.append_entry(entry).await
    }
}

#[async_trait::async_trait]
impl RecordingRegistry for RegistryClient {
    async fn list(&self) -> Result<Vec<RecordingEntry>, RegistryError> {
        RegistryClient::list(self).await
    }

    async fn save(&self, entry: RecordingEntry) -> Result<(), RegistryError> {
        self.append(&entry.name).await
    }
}
