//! Persistence gateway for per-identity sync state.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{Identity, SyncState};

/// Summary row for a stored identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredIdentity {
    pub identity: Identity,
    pub event_count: usize,
    pub last_sync_at: i64,
}

/// Trait for sync state storage operations (async)
#[allow(async_fn_in_trait)]
pub trait StateStore {
    /// Load the stored state, `None` if nothing has been persisted yet
    async fn load(&self, identity: &Identity) -> Result<Option<SyncState>>;

    /// Replace the stored state
    async fn save(&self, identity: &Identity, state: &SyncState) -> Result<()>;

    /// Remove the stored state; returns whether anything was removed
    async fn clear(&self, identity: &Identity) -> Result<bool>;

    /// All stored identities, ordered by identity
    async fn list_identities(&self) -> Result<Vec<StoredIdentity>>;
}

impl<S: StateStore> StateStore for &S {
    async fn load(&self, identity: &Identity) -> Result<Option<SyncState>> {
        (**self).load(identity).await
    }

    async fn save(&self, identity: &Identity, state: &SyncState) -> Result<()> {
        (**self).save(identity, state).await
    }

    async fn clear(&self, identity: &Identity) -> Result<bool> {
        (**self).clear(identity).await
    }

    async fn list_identities(&self) -> Result<Vec<StoredIdentity>> {
        (**self).list_identities().await
    }
}

/// In-memory store, for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    states: Mutex<HashMap<Identity, SyncState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Identity, SyncState>>> {
        self.states
            .lock()
            .map_err(|_| Error::Database("memory store lock poisoned".to_string()))
    }
}

impl StateStore for MemoryStateStore {
    async fn load(&self, identity: &Identity) -> Result<Option<SyncState>> {
        Ok(self.lock()?.get(identity).cloned())
    }

    async fn save(&self, identity: &Identity, state: &SyncState) -> Result<()> {
        self.lock()?.insert(identity.clone(), state.clone());
        Ok(())
    }

    async fn clear(&self, identity: &Identity) -> Result<bool> {
        Ok(self.lock()?.remove(identity).is_some())
    }

    async fn list_identities(&self) -> Result<Vec<StoredIdentity>> {
        let mut identities: Vec<_> = self
            .lock()?
            .iter()
            .map(|(identity, state)| StoredIdentity {
                identity: identity.clone(),
                event_count: state.len(),
                last_sync_at: state.last_sync_at,
            })
            .collect();
        identities.sort_by(|a, b| a.identity.cmp(&b.identity));
        Ok(identities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HistoryEvent, OutcomeItem};

    fn identity(value: &str) -> Identity {
        value.parse().unwrap()
    }

    #[tokio::test]
    async fn save_load_clear() {
        let store = MemoryStateStore::new();
        let id = identity("alice");
        assert_eq!(store.load(&id).await.unwrap(), None);

        let state = SyncState {
            events: vec![HistoryEvent::new("1", "Chroma Case", OutcomeItem::default())],
            cursor: None,
            last_sync_at: 42,
            pending_gap: None,
        };
        store.save(&id, &state).await.unwrap();
        assert_eq!(store.load(&id).await.unwrap(), Some(state));

        assert!(store.clear(&id).await.unwrap());
        assert!(!store.clear(&id).await.unwrap());
        assert_eq!(store.load(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn lists_identities_sorted() {
        let store = MemoryStateStore::new();
        store.save(&identity("zed"), &SyncState::default()).await.unwrap();
        store.save(&identity("amy"), &SyncState::default()).await.unwrap();

        let listed: Vec<_> = store
            .list_identities()
            .await
            .unwrap()
            .into_iter()
            .map(|row| row.identity.to_string())
            .collect();
        assert_eq!(listed, vec!["amy", "zed"]);
    }
}
