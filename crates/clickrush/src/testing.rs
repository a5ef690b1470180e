//! In-memory engine harness for unit and integration testing.
//!
//! Wires a coordinator to a [`MemoryIdentityStore`] so tests can register
//! participants, submit clicks, and query winners without any external
//! dependencies.

use crate::config::EngineConfig;
use crate::coordinator::{Coordinator, CoordinatorHandle};
use crate::store::{IdentityStore, InsertOutcome, MemoryIdentityStore};
use crate::types::ParticipantId;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A single-process engine with an in-memory identity store.
pub struct TestEngine {
    handle: CoordinatorHandle,
    store: Arc<MemoryIdentityStore>,
    join: JoinHandle<()>,
}

impl TestEngine {
    /// Engine with default rules and a running session.
    pub async fn started() -> Self {
        Self::started_with_config(EngineConfig::default()).await
    }

    /// Engine with custom rules and a running session.
    pub async fn started_with_config(config: EngineConfig) -> Self {
        let engine = Self::pending_with_config(config).await;
        engine
            .handle
            .start_session()
            .await
            .expect("TestEngine session should start");
        engine
    }

    /// Engine whose session is still Pending.
    pub async fn pending() -> Self {
        Self::pending_with_config(EngineConfig::default()).await
    }

    /// Engine with custom rules whose session is still Pending.
    pub async fn pending_with_config(config: EngineConfig) -> Self {
        let store = Arc::new(MemoryIdentityStore::new());
        let (handle, join) =
            Coordinator::spawn(config, Arc::clone(&store) as Arc<dyn IdentityStore>)
                .expect("TestEngine config should be valid");
        Self {
            handle,
            store,
            join,
        }
    }

    /// Seed a registration so clicks from `id` pass the identity check.
    pub async fn register(&self, id: &str) -> ParticipantId {
        let id = ParticipantId::new(id);
        let outcome = self
            .store
            .insert(&id, "test-address")
            .await
            .expect("memory store insert cannot fail");
        assert_eq!(
            outcome,
            InsertOutcome::Inserted,
            "duplicate test registration for {id}"
        );
        id
    }

    pub fn handle(&self) -> &CoordinatorHandle {
        &self.handle
    }

    pub fn store(&self) -> &Arc<MemoryIdentityStore> {
        &self.store
    }

    /// Stop the coordinator and wait for its task to exit.
    pub async fn shutdown(self) {
        self.handle.shutdown();
        let _ = self.join.await;
    }
}
