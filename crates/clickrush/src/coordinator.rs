use crate::clock::{SessionClock, SessionPhase, StartOutcome};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::message::{
    Command, ExitResult, InboundMessage, Notice, Outcome, ReplyEnvelope, RequestEnvelope,
};
use crate::registry::ParticipantRegistry;
use crate::store::IdentityStore;
use crate::types::{ParticipantId, RequestId, RequestIdGenerator};
use crate::validator::{self, ClickOutcome, RejectReason};
use crate::winner::{self, WinnerResolution};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Sole owner of the session clock and participant registry.
///
/// All mutation flows through one bounded mailbox drained strictly FIFO by a
/// single task, so exactly one request is evaluated against the registry at
/// any instant. Lazy participant initialization and click validation happen
/// inside one message, making them atomic from the caller's viewpoint. There
/// is no lock and no shared memory; the registry never leaves this task.
pub struct Coordinator {
    clock: SessionClock,
    registry: ParticipantRegistry,
    store: Arc<dyn IdentityStore>,
    config: EngineConfig,
    rx: mpsc::Receiver<InboundMessage>,
    /// Sender half kept for the end-notice task.
    tx: mpsc::Sender<InboundMessage>,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Spawn the coordinator task. Returns the cloneable client handle and
    /// the task's join handle.
    pub fn spawn(
        config: EngineConfig,
        store: Arc<dyn IdentityStore>,
    ) -> Result<(CoordinatorHandle, JoinHandle<()>), EngineError> {
        config.validate()?;
        let (tx, rx) = mpsc::channel(config.mailbox_capacity);
        let cancel = CancellationToken::new();
        let coordinator = Coordinator {
            clock: SessionClock::new(config.session_duration),
            registry: ParticipantRegistry::new(),
            store,
            rx,
            tx: tx.clone(),
            cancel: cancel.clone(),
            config: config.clone(),
        };
        let handle = CoordinatorHandle {
            tx,
            request_ids: Arc::new(RequestIdGenerator::new()),
            mailbox_capacity: config.mailbox_capacity,
            reply_timeout: config.reply_timeout,
            cancel,
        };
        let join = tokio::spawn(coordinator.run());
        Ok((handle, join))
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                msg = self.rx.recv() => match msg {
                    Some(InboundMessage::Request { envelope, reply_tx }) => {
                        let reply = self.process(envelope).await;
                        if reply_tx.send(reply).is_err() {
                            debug!("caller went away before its reply was delivered");
                        }
                    }
                    Some(InboundMessage::Notice(Notice::SessionEnded)) => {
                        info!(participants = self.registry.len(), "session ended");
                    }
                    None => break,
                },
            }
        }
        debug!("coordinator stopped");
    }

    async fn process(&mut self, envelope: RequestEnvelope) -> ReplyEnvelope {
        let now = Instant::now();
        let exit = match envelope.command {
            Command::StartSession => {
                ExitResult::Success(Outcome::SessionStarted(self.start_session(now)))
            }
            Command::SubmitClick {
                participant,
                arrived_at,
            } => match self.submit_click(&participant, now, arrived_at).await {
                Ok(outcome) => ExitResult::Success(Outcome::Click(outcome)),
                Err(e) => ExitResult::Failure(e.to_string()),
            },
            Command::QueryWinner => ExitResult::Success(Outcome::Winner(winner::resolve(
                &self.clock,
                &self.registry,
                now,
            ))),
        };
        ReplyEnvelope {
            request_id: envelope.request_id,
            exit,
        }
    }

    fn start_session(&mut self, now: Instant) -> StartOutcome {
        let outcome = self.clock.start(now);
        if outcome == StartOutcome::Started {
            info!(duration = ?self.clock.duration(), "session started");
            // One-shot end notice, independent of further input. The live
            // phase predicate is still checked on every message; this only
            // lets the coordinator log the transition promptly.
            let ends_at = now + self.clock.duration();
            let tx = self.tx.clone();
            let cancel = self.cancel.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = time::sleep_until(ends_at) => {
                        let _ = tx.send(InboundMessage::Notice(Notice::SessionEnded)).await;
                    }
                }
            });
        }
        outcome
    }

    /// Lazy initialization plus validation, one atomic unit per message.
    async fn submit_click(
        &mut self,
        id: &ParticipantId,
        now: Instant,
        arrived_at: Instant,
    ) -> Result<ClickOutcome, EngineError> {
        if !self.registry.contains(id) {
            // Do not grow the registry outside the click window
            if self.clock.phase(now) != SessionPhase::Running {
                return Ok(ClickOutcome::Rejected(RejectReason::SessionNotRunning));
            }
            if !self.store.exists(id).await? {
                return Ok(ClickOutcome::Rejected(RejectReason::UnknownParticipant));
            }
            self.registry.initialize(id, arrived_at);
            debug!(participant = %id, "participant initialized on first contact");
        }
        let Some(participant) = self.registry.get_mut(id) else {
            return Ok(ClickOutcome::Rejected(RejectReason::UnknownParticipant));
        };
        let outcome =
            validator::validate_click(participant, &self.clock, &self.config, now, arrived_at);
        if let ClickOutcome::Rejected(reason) = outcome {
            debug!(participant = %id, %reason, "click rejected");
        }
        Ok(outcome)
    }
}

/// Cloneable client half of the coordinator boundary.
///
/// Each call builds a fresh request envelope, enqueues it, and awaits the
/// reply matched by request id. Callers block only on their own pending
/// reply, never on each other. The mailbox is bounded and every wait carries
/// a timeout, so a disconnecting caller cannot leak a pending request.
#[derive(Clone, Debug)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<InboundMessage>,
    request_ids: Arc<RequestIdGenerator>,
    mailbox_capacity: usize,
    reply_timeout: Duration,
    cancel: CancellationToken,
}

impl CoordinatorHandle {
    /// Move the session from Pending to Running.
    pub async fn start_session(&self) -> Result<StartOutcome, EngineError> {
        match self.request(Command::StartSession).await? {
            (_, Outcome::SessionStarted(outcome)) => Ok(outcome),
            (request_id, _) => Err(EngineError::UnexpectedReply { request_id }),
        }
    }

    /// Submit one click for `participant`, stamped with the current instant.
    pub async fn submit_click(
        &self,
        participant: &ParticipantId,
    ) -> Result<ClickOutcome, EngineError> {
        self.submit_click_at(participant, Instant::now()).await
    }

    /// Submit a click with an explicit arrival stamp. Adapters stamp when the
    /// raw request arrives, before forwarding.
    pub async fn submit_click_at(
        &self,
        participant: &ParticipantId,
        arrived_at: Instant,
    ) -> Result<ClickOutcome, EngineError> {
        let command = Command::SubmitClick {
            participant: participant.clone(),
            arrived_at,
        };
        match self.request(command).await? {
            (_, Outcome::Click(outcome)) => Ok(outcome),
            (request_id, _) => Err(EngineError::UnexpectedReply { request_id }),
        }
    }

    /// Resolve the winner against the current registry.
    pub async fn query_winner(&self) -> Result<WinnerResolution, EngineError> {
        match self.request(Command::QueryWinner).await? {
            (_, Outcome::Winner(resolution)) => Ok(resolution),
            (request_id, _) => Err(EngineError::UnexpectedReply { request_id }),
        }
    }

    /// Ask the coordinator task to stop. Queued requests are dropped; their
    /// callers see `ShuttingDown`.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.cancel.is_cancelled()
    }

    async fn request(&self, command: Command) -> Result<(RequestId, Outcome), EngineError> {
        let request_id = self.request_ids.next_id();
        let envelope = RequestEnvelope {
            request_id,
            command,
        };
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .try_send(InboundMessage::Request { envelope, reply_tx })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => EngineError::MailboxFull {
                    capacity: self.mailbox_capacity,
                },
                mpsc::error::TrySendError::Closed(_) => EngineError::ShuttingDown,
            })?;

        let reply = match time::timeout(self.reply_timeout, reply_rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => return Err(EngineError::ShuttingDown),
            Err(_) => {
                return Err(EngineError::ReplyTimeout {
                    request_id,
                    waited: self.reply_timeout,
                })
            }
        };
        if reply.request_id != request_id {
            return Err(EngineError::CorrelationMismatch {
                sent: request_id,
                got: reply.request_id,
            });
        }
        match reply.exit {
            ExitResult::Success(outcome) => Ok((request_id, outcome)),
            ExitResult::Failure(reason) => Err(EngineError::RequestFailed { request_id, reason }),
        }
    }
}
