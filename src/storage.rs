//! In-memory state shared by client operations.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

// ============================================================================
// Public Key Cache
// ============================================================================

/// Address to public key (hex) cache.
///
/// Entries are never evicted or invalidated: an address maps to exactly one
/// immutable key, so a concurrent duplicate fill just rewrites the same
/// value.
#[derive(Debug, Clone, Default)]
pub struct PublicKeyCache {
    cache: Arc<RwLock<HashMap<String, String>>>,
}

impl PublicKeyCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a public key for an address.
    pub async fn store(&self, address: &str, public_key: &str) {
        let mut cache = self.cache.write().await;
        cache.insert(address.to_string(), public_key.to_string());
    }

    /// Retrieve a public key for an address.
    pub async fn retrieve(&self, address: &str) -> Option<String> {
        let cache = self.cache.read().await;
        cache.get(address).cloned()
    }

    /// Number of cached addresses.
    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Returns true if nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }
}
