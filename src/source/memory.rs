//! In-memory document source for fixtures and offline replays.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::DocumentSource;
use crate::error::FetchError;

/// Address → bytes map. Unknown addresses answer 404.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    inner: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, address: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        let address = address.into();
        let bytes = bytes.into();
        tracing::debug!("MemorySource: stored '{}' ({} bytes)", address, bytes.len());
        // A poisoned lock only means another writer panicked mid-insert.
        let mut store = self.inner.write().unwrap_or_else(|e| e.into_inner());
        store.insert(address, bytes);
    }

    pub fn with(self, address: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(address, bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl DocumentSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch(&self, address: &str) -> Result<Vec<u8>, FetchError> {
        let store = self.inner.read().unwrap_or_else(|e| e.into_inner());
        store.get(address).cloned().ok_or_else(|| FetchError::Status {
            address: address.to_string(),
            status: 404,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_known_and_unknown() {
        let source = MemorySource::new().with("mem://a", b"hello".to_vec());
        assert_eq!(source.len(), 1);
        assert_eq!(source.fetch("mem://a").await.unwrap(), b"hello");

        let err = source.fetch("mem://b").await.unwrap_err();
        assert_eq!(
            err,
            FetchError::Status {
                address: "mem://b".to_string(),
                status: 404
            }
        );
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let source = MemorySource::new();
        let clone = source.clone();
        clone.insert("mem://x", "text");
        assert!(source.fetch("mem://x").await.is_ok());
    }
}
