//! Sync state repository implementation

use crate::error::{Error, Result};
use crate::models::{Identity, SyncState};
use crate::store::{StateStore, StoredIdentity};
use libsql::{params, Connection};

/// libSQL implementation of `StateStore`
pub struct LibSqlStateStore<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlStateStore<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

fn count_from_db(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

impl StateStore for LibSqlStateStore<'_> {
    async fn load(&self, identity: &Identity) -> Result<Option<SyncState>> {
        let mut rows = self
            .conn
            .query(
                "SELECT payload FROM sync_state WHERE identity = ?",
                [identity.as_str()],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            let payload: String = row.get(0)?;
            Ok(Some(serde_json::from_str(&payload)?))
        } else {
            Ok(None)
        }
    }

    async fn save(&self, identity: &Identity, state: &SyncState) -> Result<()> {
        let payload = serde_json::to_string(state)?;
        let event_count = i64::try_from(state.len())
            .map_err(|_| Error::Database("event count out of range".to_string()))?;

        self.conn
            .execute(
                "INSERT INTO sync_state (identity, payload, event_count, last_sync_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(identity) DO UPDATE SET
                     payload = excluded.payload,
                     event_count = excluded.event_count,
                     last_sync_at = excluded.last_sync_at",
                params![
                    identity.as_str(),
                    payload,
                    event_count,
                    state.last_sync_at
                ],
            )
            .await?;
        tracing::debug!(%identity, events = state.len(), "saved sync state");
        Ok(())
    }

    async fn clear(&self, identity: &Identity) -> Result<bool> {
        let rows = self
            .conn
            .execute(
                "DELETE FROM sync_state WHERE identity = ?",
                [identity.as_str()],
            )
            .await?;
        Ok(rows > 0)
    }

    async fn list_identities(&self) -> Result<Vec<StoredIdentity>> {
        let mut rows = self
            .conn
            .query(
                "SELECT identity, event_count, last_sync_at FROM sync_state ORDER BY identity",
                (),
            )
            .await?;

        let mut identities = Vec::new();
        while let Some(row) = rows.next().await? {
            let identity: String = row.get(0)?;
            identities.push(StoredIdentity {
                identity: identity.parse()?,
                event_count: count_from_db(row.get::<i64>(1)?),
                last_sync_at: row.get(2)?,
            });
        }
        Ok(identities)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;
    use crate::db::Database;
    use crate::models::{Cursor, HistoryEvent, OutcomeItem};

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn state() -> SyncState {
        SyncState {
            events: vec![
                HistoryEvent::new("2", "Gamma Case", OutcomeItem::default()),
                HistoryEvent::new("1", "Gamma Case", OutcomeItem::default()),
            ],
            cursor: Some(Cursor::new(1_690_000_000, 0, "12")),
            last_sync_at: 1_700_000_000_000,
            pending_gap: None,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_load_missing_state() {
        let db = setup().await;
        let repo = LibSqlStateStore::new(db.connection());

        let identity: Identity = "nobody".parse().unwrap();
        assert_eq!(repo.load(&identity).await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_save_overwrite_and_clear() {
        let db = setup().await;
        let repo = LibSqlStateStore::new(db.connection());
        let identity: Identity = "alice".parse().unwrap();

        repo.save(&identity, &SyncState::default()).await.unwrap();
        repo.save(&identity, &state()).await.unwrap();
        assert_eq!(repo.load(&identity).await.unwrap(), Some(state()));

        let listed = repo.list_identities().await.unwrap();
        assert_eq!(
            listed,
            vec![StoredIdentity {
                identity: identity.clone(),
                event_count: 2,
                last_sync_at: 1_700_000_000_000,
            }]
        );

        assert!(repo.clear(&identity).await.unwrap());
        assert!(!repo.clear(&identity).await.unwrap());
        assert!(repo.list_identities().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_state_survives_reopen() {
        let tmp = tempdir().unwrap();
        let db_path = tmp.path().join("lootlog.db");
        let identity: Identity = "bob".parse().unwrap();

        {
            let db = Database::open(&db_path).await.unwrap();
            LibSqlStateStore::new(db.connection())
                .save(&identity, &state())
                .await
                .unwrap();
        }

        let db = Database::open(&db_path).await.unwrap();
        let loaded = LibSqlStateStore::new(db.connection())
            .load(&identity)
            .await
            .unwrap();
        assert_eq!(loaded, Some(state()));
    }
}
