use crate::clock::StartOutcome;
use crate::types::{ParticipantId, RequestId};
use crate::validator::ClickOutcome;
use crate::winner::WinnerResolution;
use tokio::sync::oneshot;
use tokio::time::Instant;

/// Operations the coordinator accepts across its request boundary.
#[derive(Debug, Clone)]
pub enum Command {
    /// Move the session from Pending to Running.
    StartSession,
    /// Validate and record one click event. `arrived_at` is stamped by the
    /// ingress adapter the moment the raw request arrives.
    SubmitClick {
        participant: ParticipantId,
        arrived_at: Instant,
    },
    /// Resolve the winner against the current registry snapshot.
    QueryWinner,
}

/// A request envelope: correlation id plus the command to evaluate.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    pub request_id: RequestId,
    pub command: Command,
}

/// Typed payload of a successful reply. Each variant answers exactly one
/// command.
#[derive(Debug, Clone)]
pub enum Outcome {
    SessionStarted(StartOutcome),
    Click(ClickOutcome),
    Winner(WinnerResolution),
}

/// Result of processing a request.
#[derive(Debug, Clone)]
pub enum ExitResult {
    Success(Outcome),
    Failure(String),
}

/// Reply correlated back to its request by id.
#[derive(Debug, Clone)]
pub struct ReplyEnvelope {
    pub request_id: RequestId,
    pub exit: ExitResult,
}

/// Channel types for reply delivery.
pub type ReplySender = oneshot::Sender<ReplyEnvelope>;
pub type ReplyReceiver = oneshot::Receiver<ReplyEnvelope>;

/// Fire-and-forget notices. No reply channel, no correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Eager end-of-session notice from the scheduled timer. Advisory only;
    /// the clock's live predicate stays authoritative.
    SessionEnded,
}

/// Inbound message on the coordinator mailbox.
#[derive(Debug)]
pub enum InboundMessage {
    /// A request expecting a matched reply.
    Request {
        envelope: RequestEnvelope,
        reply_tx: ReplySender,
    },
    /// A notice with no reply channel.
    Notice(Notice),
}
