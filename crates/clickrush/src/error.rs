use crate::store::StoreError;
use crate::types::RequestId;
use std::time::Duration;

/// Errors crossing the coordinator request/reply boundary.
///
/// Validation rejections are not errors. A click that fails anti-cheat or
/// falls outside the session window comes back as a structured
/// [`ClickOutcome::Rejected`](crate::validator::ClickOutcome) outcome.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("coordinator mailbox full ({capacity} requests queued)")]
    MailboxFull { capacity: usize },

    #[error("no reply for request {request_id} within {waited:?}")]
    ReplyTimeout {
        request_id: RequestId,
        waited: Duration,
    },

    #[error("reply correlation mismatch: sent {sent}, got {got}")]
    CorrelationMismatch { sent: RequestId, got: RequestId },

    #[error("reply for request {request_id} did not match its command")]
    UnexpectedReply { request_id: RequestId },

    #[error("request {request_id} failed: {reason}")]
    RequestFailed {
        request_id: RequestId,
        reason: String,
    },

    #[error("coordinator is shutting down")]
    ShuttingDown,

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}
