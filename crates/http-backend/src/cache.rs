use std::sync::{Arc, PoisonError, RwLock};

use ragchat_proto::BackendConfig;

/// A session-scoped cache for the backend configuration.
///
/// Clones share the same slot. The first stored value wins; later stores
/// return the value already cached. Nothing expires on its own, use
/// [`ConfigCache::invalidate`] to force a refetch.
#[derive(Clone, Debug, Default)]
pub struct ConfigCache {
    slot: Arc<RwLock<Option<Arc<BackendConfig>>>>,
}

impl ConfigCache {
    /// Creates an empty cache.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached configuration, if any.
    #[inline]
    pub fn get(&self) -> Option<Arc<BackendConfig>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stores `config` unless a value is already cached, and returns the
    /// cached value.
    pub fn store(&self, config: BackendConfig) -> Arc<BackendConfig> {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slot.get_or_insert_with(|| Arc::new(config)))
    }

    /// Drops the cached configuration.
    #[inline]
    pub fn invalidate(&self) {
        self.slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(top_k: u32) -> BackendConfig {
        BackendConfig {
            top_k,
            max_tokens: 512,
            temperature: 0.2,
            similarity_threshold: 0.5,
            llm_provider: "ollama".to_owned(),
            model: "llama3".to_owned(),
            embedding_model: "bge-small".to_owned(),
            collection_name: "docs".to_owned(),
        }
    }

    #[test]
    fn test_first_store_wins() {
        let cache = ConfigCache::new();
        assert!(cache.get().is_none());
        assert_eq!(cache.store(config(5)).top_k, 5);
        assert_eq!(cache.store(config(8)).top_k, 5);
        assert_eq!(cache.get().unwrap().top_k, 5);
    }

    #[test]
    fn test_clones_share_slot() {
        let cache = ConfigCache::new();
        let other = cache.clone();
        other.store(config(7));
        assert_eq!(cache.get().unwrap().top_k, 7);

        cache.invalidate();
        assert!(other.get().is_none());
        assert_eq!(other.store(config(9)).top_k, 9);
    }
}
