//! Client-side key-value storage.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::EngageError;

/// Storage key for the persisted session UUID.
pub const SESSION_ID_KEY: &str = "chatSessionId";

/// Storage key for the "has been greeted" flag (`"true"` or absent).
pub const GREETED_KEY: &str = "appointy_has_been_greeted";

/// Storage key for the JSON array of visited page URLs.
pub const VISITED_PAGES_KEY: &str = "appointy_visited_pages";

/// Storage key for the one-shot flag consumed on the next load.
pub const CLEAR_HISTORY_BEFORE_PROACTIVE_KEY: &str = "clearHistoryBeforeProactive";

/// String key-value storage shared across page loads.
///
/// This is the only state that survives a reload. It is read-modify-written
/// without locking, so concurrent clients sharing one store can race.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, EngageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), EngageError>;

    async fn remove(&self, key: &str) -> Result<(), EngageError>;
}

/// In-memory store.
///
/// Also models storage that is unavailable altogether (private browsing),
/// where every operation fails.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    unavailable: bool,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects every operation.
    pub fn unavailable() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            unavailable: true,
        }
    }

    /// Create a store pre-populated with entries.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            unavailable: false,
        }
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn check(&self) -> Result<(), EngageError> {
        if self.unavailable {
            Err(EngageError::Storage("storage unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, EngageError> {
        self.check()?;
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), EngageError> {
        self.check()?;
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), EngageError> {
        self.check()?;
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

        store.set("k", "w").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("w"));

        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_with_entries() {
        let store = MemoryStore::with_entries([(GREETED_KEY, "true")]);
        assert_eq!(store.get(GREETED_KEY).await.unwrap().as_deref(), Some("true"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_unavailable_store_errors() {
        let store = MemoryStore::unavailable();
        assert!(matches!(store.get("k").await, Err(EngageError::Storage(_))));
        assert!(matches!(store.set("k", "v").await, Err(EngageError::Storage(_))));
        assert!(matches!(store.remove("k").await, Err(EngageError::Storage(_))));
    }
}
