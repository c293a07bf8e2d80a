//! Map-backed scope cache.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use wardauth::AuthResult;
use wardauth::scope::ScopeCache;

/// In-memory scope cache for tests and local development.
#[derive(Default)]
pub struct MemoryScopeCache {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryScopeCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a scope string under a cache key.
    pub async fn set(&self, key: impl Into<String>, scope: impl Into<String>) {
        self.entries.write().await.insert(key.into(), scope.into());
    }
}

#[async_trait]
impl ScopeCache for MemoryScopeCache {
    async fn get(&self, key: &str) -> AuthResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }
}
