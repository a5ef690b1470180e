use super::{IdentityStore, InsertOutcome, RegistrationRecord, StoreError};
use crate::types::ParticipantId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS participants (
    participant_id TEXT PRIMARY KEY,
    address TEXT NOT NULL,
    registered_at TEXT NOT NULL
)";

/// Sqlite-backed identity store.
///
/// The primary key makes the duplicate-id guarantee the store's own: a
/// conflicting insert surfaces as [`InsertOutcome::Duplicate`] no matter how
/// many processes write.
#[derive(Debug)]
pub struct SqliteIdentityStore {
    pool: SqlitePool,
}

impl SqliteIdentityStore {
    /// Open the database and ensure the schema exists. Failure here is the
    /// fatal startup path: callers abort, they do not retry.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        // Sqlite serializes writers anyway; a single connection also keeps
        // `sqlite::memory:` databases coherent.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .map_err(|e| StoreError::Unavailable {
                reason: format!("failed to open {url}"),
                source: Some(Box::new(e)),
            })?;
        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| StoreError::Unavailable {
                reason: "failed to create schema".into(),
                source: Some(Box::new(e)),
            })?;
        Ok(Self { pool })
    }
}

fn query_error(operation: &str, e: sqlx::Error) -> StoreError {
    StoreError::Query {
        reason: format!("{operation} failed"),
        source: Some(Box::new(e)),
    }
}

#[async_trait]
impl IdentityStore for SqliteIdentityStore {
    async fn exists(&self, id: &ParticipantId) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM participants WHERE participant_id = ?")
            .bind(id.as_ref())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_error("exists", e))?;
        Ok(row.is_some())
    }

    async fn get(&self, id: &ParticipantId) -> Result<Option<RegistrationRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT participant_id, address, registered_at FROM participants \
             WHERE participant_id = ?",
        )
        .bind(id.as_ref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_error("get", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let participant: String = row.get("participant_id");
        let address: String = row.get("address");
        let registered_at: String = row.get("registered_at");
        let registered_at = DateTime::parse_from_rfc3339(&registered_at)
            .map_err(|e| StoreError::Query {
                reason: format!("corrupt registered_at for {participant}"),
                source: Some(Box::new(e)),
            })?
            .with_timezone(&Utc);

        Ok(Some(RegistrationRecord {
            participant: ParticipantId::new(participant),
            address,
            registered_at,
        }))
    }

    async fn insert(
        &self,
        id: &ParticipantId,
        address: &str,
    ) -> Result<InsertOutcome, StoreError> {
        let result =
            sqlx::query("INSERT INTO participants (participant_id, address, registered_at) VALUES (?, ?, ?)")
                .bind(id.as_ref())
                .bind(address)
                .bind(Utc::now().to_rfc3339())
                .execute(&self.pool)
                .await;
        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Ok(InsertOutcome::Duplicate)
            }
            Err(e) => Err(query_error("insert", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> SqliteIdentityStore {
        SqliteIdentityStore::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn insert_then_exists_and_get() {
        let store = memory_store().await;
        let id = ParticipantId::new("alice");

        assert!(!store.exists(&id).await.unwrap());
        assert_eq!(
            store.insert(&id, "somewhere").await.unwrap(),
            InsertOutcome::Inserted
        );
        assert!(store.exists(&id).await.unwrap());

        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.participant, id);
        assert_eq!(record.address, "somewhere");
    }

    #[tokio::test]
    async fn duplicate_insert_is_a_distinct_outcome() {
        let store = memory_store().await;
        let id = ParticipantId::new("alice");

        store.insert(&id, "first").await.unwrap();
        assert_eq!(
            store.insert(&id, "second").await.unwrap(),
            InsertOutcome::Duplicate
        );
        assert_eq!(store.get(&id).await.unwrap().unwrap().address, "first");
    }

    #[tokio::test]
    async fn connect_failure_is_unavailable() {
        let err = SqliteIdentityStore::connect("sqlite:///no/such/dir/clicks.db")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { .. }));
    }
}
