use super::{IdentityStore, InsertOutcome, RegistrationRecord, StoreError};
use crate::types::ParticipantId;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// In-memory identity store.
///
/// Backs tests and the `memory:` store URL. Reads are concurrent; the
/// entry-based insert decides Inserted vs Duplicate atomically per key.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    records: DashMap<ParticipantId, RegistrationRecord>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn exists(&self, id: &ParticipantId) -> Result<bool, StoreError> {
        Ok(self.records.contains_key(id))
    }

    async fn get(&self, id: &ParticipantId) -> Result<Option<RegistrationRecord>, StoreError> {
        Ok(self.records.get(id).map(|record| record.clone()))
    }

    async fn insert(
        &self,
        id: &ParticipantId,
        address: &str,
    ) -> Result<InsertOutcome, StoreError> {
        match self.records.entry(id.clone()) {
            Entry::Occupied(_) => Ok(InsertOutcome::Duplicate),
            Entry::Vacant(vacant) => {
                vacant.insert(RegistrationRecord {
                    participant: id.clone(),
                    address: address.to_string(),
                    registered_at: Utc::now(),
                });
                Ok(InsertOutcome::Inserted)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_then_exists_and_get() {
        let store = MemoryIdentityStore::new();
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
        let store = MemoryIdentityStore::new();
        let id = ParticipantId::new("alice");

        store.insert(&id, "first").await.unwrap();
        assert_eq!(
            store.insert(&id, "second").await.unwrap(),
            InsertOutcome::Duplicate
        );
        // The original registration wins
        assert_eq!(store.get(&id).await.unwrap().unwrap().address, "first");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let store = MemoryIdentityStore::new();
        assert!(store
            .get(&ParticipantId::new("nobody"))
            .await
            .unwrap()
            .is_none());
    }
}
