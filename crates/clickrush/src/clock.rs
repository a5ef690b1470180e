use std::time::Duration;
use tokio::time::Instant;

/// Lifecycle phase of the single contest session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Created but not started; no clicks are accepted yet.
    Pending,
    /// The click window is open.
    Running,
    /// The window has elapsed. Terminal: the session never leaves this phase.
    Ended,
}

/// Result of asking the clock to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// The session was already running or ended. Idempotent failure, not an
    /// error.
    AlreadyStarted,
}

/// Monotonic session clock: a start instant plus a fixed duration.
///
/// The phase is always computed from a caller-supplied `now`, so "Ended" is a
/// live predicate rather than the side effect of a timer callback. A
/// scheduled end notice racing a late request can never change an answer.
/// Monotonic instants make the clock immune to wall-clock adjustments.
#[derive(Debug, Clone)]
pub struct SessionClock {
    started_at: Option<Instant>,
    duration: Duration,
}

impl SessionClock {
    pub fn new(duration: Duration) -> Self {
        Self {
            started_at: None,
            duration,
        }
    }

    /// Record the start instant. Fires exactly once; later calls report
    /// `AlreadyStarted` without touching the recorded instant.
    pub fn start(&mut self, now: Instant) -> StartOutcome {
        if self.started_at.is_some() {
            return StartOutcome::AlreadyStarted;
        }
        self.started_at = Some(now);
        StartOutcome::Started
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Instant at which the session ends. The end boundary is exclusive: a
    /// click stamped exactly here is outside the window.
    pub fn ends_at(&self) -> Option<Instant> {
        self.started_at.map(|start| start + self.duration)
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn phase(&self, now: Instant) -> SessionPhase {
        match self.ends_at() {
            None => SessionPhase::Pending,
            Some(ends_at) if now >= ends_at => SessionPhase::Ended,
            Some(_) => SessionPhase::Running,
        }
    }

    pub fn is_ended(&self, now: Instant) -> bool {
        self.phase(now) == SessionPhase::Ended
    }

    /// Time left in the click window: the full duration while pending, zero
    /// once ended.
    pub fn time_remaining(&self, now: Instant) -> Duration {
        match self.ends_at() {
            None => self.duration,
            Some(ends_at) => ends_at.saturating_duration_since(now),
        }
    }
}
