//! Saved-recordings listing
//!
//! Fetches the registry once when mounted. A failed fetch is logged and the
//! view simply shows nothing; no error reaches the user.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::{debug, error};

use crate::registry::{RecordingEntry, RecordingRegistry};

pub struct ListingView {
    source: Arc<dyn RecordingRegistry>,
    entries: Vec<RecordingEntry>,
    mounted: bool,
}

impl ListingView {
    pub fn new(source: Arc<dyn RecordingRegistry>) -> Self {
        Self {
            source,
            entries: Vec::new(),
            mounted: false,
        }
    }

    /// Fetch the list; only the first call does anything
    pub async fn mount(&mut self) {
        if self.mounted {
            return;
        }
        self.mounted = true;

        match self.source.list().await {
            Ok(entries) => {
                debug!("Fetched {} recordings", entries.len());
                self.entries = entries;
            }
            Err(e) => {
                error!("Failed to fetch recordings: {}", e);
                self.entries.clear();
            }
        }
    }

    pub fn entries(&self) -> &[RecordingEntry] {
        &self.entries
    }

    pub fn render(&self) -> String {
        let mut out = String::from("Saved Recordings\n");
        for entry in &self.entries {
            let _ = writeln!(out, "  {}", entry.name);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{MemoryStorage, Registry};

    #[tokio::test]
    async fn test_render_keeps_registry_order() -> anyhow::Result<()> {
        let registry = Registry::new(Arc::new(MemoryStorage::with_document("[]")));
        registry.append("first").await?;
        registry.append("second").await?;

        let mut view = ListingView::new(Arc::new(registry));
        view.mount().await;

        assert_eq!(view.render(), "Saved Recordings\n  first\n  second\n");
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_fetch_shows_empty_list() {
        // No document at all: list() fails
        let registry = Registry::new(Arc::new(MemoryStorage::new()));

        let mut view = ListingView::new(Arc::new(registry));
        view.mount().await;

        assert!(view.entries().is_empty());
        assert_eq!(view.render(), "Saved Recordings\n");
    }

    #[tokio::test]
    async fn test_mount_fetches_once() -> anyhow::Result<()> {
        let registry = Arc::new(Registry::new(Arc::new(MemoryStorage::with_document("[]"))));
        let mut view = ListingView::new(registry.clone());

        view.mount().await;
        registry.append("late").await?;
        view.mount().await;

        assert!(view.entries().is_empty());
        Ok(())
    }
}
