//! Participant identity capability.
//!
//! The engine consumes registration data through the [`IdentityStore`] trait;
//! it never owns it. Reads may run concurrently. The insert path guarantees
//! no duplicate id on its own, surfaced as [`InsertOutcome::Duplicate`],
//! independent of coordinator serialization.

use crate::types::ParticipantId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod memory;
#[cfg(feature = "sql")]
mod sql;

pub use memory::MemoryIdentityStore;
#[cfg(feature = "sql")]
pub use sql::SqliteIdentityStore;

/// Errors from the identity store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached. Fatal on the startup path: callers
    /// abort, they do not retry.
    #[error("identity store unavailable: {reason}")]
    Unavailable {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A query failed against a store that was reachable at startup.
    #[error("identity store query failed: {reason}")]
    Query {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// One registered identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub participant: ParticipantId,
    pub address: String,
    pub registered_at: DateTime<Utc>,
}

/// Result of inserting a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The id is already taken. A distinct outcome, not a generic failure.
    Duplicate,
}

/// Registration capability consumed by the engine and the signup ingress.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn exists(&self, id: &ParticipantId) -> Result<bool, StoreError>;

    async fn get(&self, id: &ParticipantId) -> Result<Option<RegistrationRecord>, StoreError>;

    async fn insert(&self, id: &ParticipantId, address: &str)
        -> Result<InsertOutcome, StoreError>;
}
