//! Session identity and visitor flags persisted in client storage.

use std::sync::Arc;

use engage_core::{
    KeyValueStore, CLEAR_HISTORY_BEFORE_PROACTIVE_KEY, GREETED_KEY, SESSION_ID_KEY,
    VISITED_PAGES_KEY,
};
use indexmap::IndexSet;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Resolves and persists the visitor's session.
///
/// Storage is best effort. When the store fails, the manager keeps working
/// with an ephemeral identity that lives as long as the manager does, and
/// treats unreadable visited pages as an empty list.
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    cached_id: Mutex<Option<String>>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            cached_id: Mutex::new(None),
        }
    }

    /// The session id, created and persisted on first use.
    pub async fn session_id(&self) -> String {
        let mut cached = self.cached_id.lock().await;
        if let Some(id) = cached.as_ref() {
            return id.clone();
        }

        let id = match self.store.get(SESSION_ID_KEY).await {
            Ok(Some(existing)) if !existing.trim().is_empty() => existing,
            Ok(_) => {
                let fresh = Uuid::new_v4().to_string();
                if let Err(e) = self.store.set(SESSION_ID_KEY, &fresh).await {
                    warn!(error = %e, "SESSION_PERSIST_FAILED");
                } else {
                    info!(session_id = %fresh, "SESSION_CREATED");
                }
                fresh
            }
            Err(e) => {
                warn!(error = %e, "SESSION_STORAGE_UNAVAILABLE");
                Uuid::new_v4().to_string()
            }
        };

        *cached = Some(id.clone());
        id
    }

    pub async fn has_been_greeted(&self) -> bool {
        match self.store.get(GREETED_KEY).await {
            Ok(value) => value.as_deref() == Some("true"),
            Err(e) => {
                warn!(error = %e, "GREETED_READ_FAILED");
                false
            }
        }
    }

    pub async fn mark_greeted(&self) {
        if let Err(e) = self.store.set(GREETED_KEY, "true").await {
            warn!(error = %e, "GREETED_WRITE_FAILED");
        }
    }

    /// Pages visited in this session, oldest first.
    pub async fn visited_pages(&self) -> Vec<String> {
        let raw = match self.store.get(VISITED_PAGES_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "VISITED_PAGES_READ_FAILED");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(pages) => pages.into_iter().collect::<IndexSet<_>>().into_iter().collect(),
            Err(e) => {
                debug!(error = %e, "Ignoring corrupt visited pages");
                Vec::new()
            }
        }
    }

    /// Record a page visit. Already-visited pages keep their position.
    pub async fn record_visit(&self, url: &str) -> Vec<String> {
        let mut pages: IndexSet<String> = self.visited_pages().await.into_iter().collect();
        if !pages.insert(url.to_string()) {
            return pages.into_iter().collect();
        }

        let pages: Vec<String> = pages.into_iter().collect();
        match serde_json::to_string(&pages) {
            Ok(encoded) => {
                if let Err(e) = self.store.set(VISITED_PAGES_KEY, &encoded).await {
                    warn!(error = %e, "VISITED_PAGES_WRITE_FAILED");
                }
            }
            Err(e) => warn!(error = %e, "VISITED_PAGES_ENCODE_FAILED"),
        }
        pages
    }

    /// Read and delete the clear-history-before-proactive flag.
    pub async fn take_clear_history_flag(&self) -> bool {
        let set = match self.store.get(CLEAR_HISTORY_BEFORE_PROACTIVE_KEY).await {
            Ok(value) => value.as_deref() == Some("true"),
            Err(e) => {
                warn!(error = %e, "CLEAR_FLAG_READ_FAILED");
                return false;
            }
        };

        if set {
            if let Err(e) = self.store.remove(CLEAR_HISTORY_BEFORE_PROACTIVE_KEY).await {
                warn!(error = %e, "CLEAR_FLAG_REMOVE_FAILED");
            }
        }
        set
    }

    /// Forget the session and leave a flag asking the next proactive
    /// request to clear server history first.
    pub async fn reset(&self) {
        for key in [SESSION_ID_KEY, GREETED_KEY, VISITED_PAGES_KEY] {
            if let Err(e) = self.store.remove(key).await {
                warn!(key, error = %e, "SESSION_RESET_REMOVE_FAILED");
            }
        }
        if let Err(e) = self
            .store
            .set(CLEAR_HISTORY_BEFORE_PROACTIVE_KEY, "true")
            .await
        {
            warn!(error = %e, "CLEAR_FLAG_WRITE_FAILED");
        }

        *self.cached_id.lock().await = None;
        info!("SESSION_RESET");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engage_core::MemoryStore;

    fn manager_with(store: MemoryStore) -> (Arc<MemoryStore>, SessionManager) {
        let store = Arc::new(store);
        (store.clone(), SessionManager::new(store))
    }

    #[tokio::test]
    async fn test_session_id_is_stable_and_persisted() {
        let (store, manager) = manager_with(MemoryStore::new());

        let first = manager.session_id().await;
        let second = manager.session_id().await;
        assert_eq!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
        assert_eq!(store.get(SESSION_ID_KEY).await.unwrap(), Some(first.clone()));

        // A second manager over the same store sees the same identity.
        let other = SessionManager::new(store);
        assert_eq!(other.session_id().await, first);
    }

    #[tokio::test]
    async fn test_existing_session_id_reused() {
        let (_, manager) = manager_with(MemoryStore::with_entries([(SESSION_ID_KEY, "abc-123")]));
        assert_eq!(manager.session_id().await, "abc-123");
    }

    #[tokio::test]
    async fn test_unavailable_storage_degrades() {
        let (_, manager) = manager_with(MemoryStore::unavailable());

        let id = manager.session_id().await;
        assert!(!id.is_empty());
        assert_eq!(manager.session_id().await, id);
        assert!(!manager.has_been_greeted().await);
        assert!(manager.visited_pages().await.is_empty());
        assert_eq!(manager.record_visit("/a").await, vec!["/a"]);
        assert!(!manager.take_clear_history_flag().await);
        manager.mark_greeted().await;
        manager.reset().await;
    }

    #[tokio::test]
    async fn test_greeted_flag() {
        let (store, manager) = manager_with(MemoryStore::new());
        assert!(!manager.has_been_greeted().await);

        manager.mark_greeted().await;
        assert!(manager.has_been_greeted().await);
        assert_eq!(store.get(GREETED_KEY).await.unwrap().as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn test_visited_pages_ordered_set() {
        let (_, manager) = manager_with(MemoryStore::new());

        manager.record_visit("/").await;
        manager.record_visit("/pricing").await;
        let pages = manager.record_visit("/").await;

        assert_eq!(pages, vec!["/", "/pricing"]);
        assert_eq!(manager.visited_pages().await, vec!["/", "/pricing"]);
    }

    #[tokio::test]
    async fn test_corrupt_visited_pages_ignored() {
        let (_, manager) =
            manager_with(MemoryStore::with_entries([(VISITED_PAGES_KEY, "not json")]));
        assert!(manager.visited_pages().await.is_empty());
    }

    #[tokio::test]
    async fn test_reset_clears_identity_and_sets_flag() {
        let (store, manager) = manager_with(MemoryStore::new());
        let before = manager.session_id().await;
        manager.mark_greeted().await;
        manager.record_visit("/").await;

        manager.reset().await;

        assert_eq!(store.get(GREETED_KEY).await.unwrap(), None);
        assert_eq!(store.get(VISITED_PAGES_KEY).await.unwrap(), None);
        assert_eq!(store.get(SESSION_ID_KEY).await.unwrap(), None);

        let after = manager.session_id().await;
        assert_ne!(before, after);

        assert!(manager.take_clear_history_flag().await);
        assert!(!manager.take_clear_history_flag().await);
    }
}
