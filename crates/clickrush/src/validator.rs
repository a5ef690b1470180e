use crate::clock::{SessionClock, SessionPhase};
use crate::config::EngineConfig;
use crate::registry::Participant;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Trailing window the rate rule inspects, anchored at each click's own
/// timestamp. Fixed by the contest rules, not configuration.
pub const RATE_WINDOW: Duration = Duration::from_secs(1);

/// Why a click was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The id is not in the identity store.
    UnknownParticipant,
    /// The participant was disqualified earlier. Terminal state.
    Disqualified,
    /// The session is not in its Running phase at processing time.
    SessionNotRunning,
    /// The event timestamp falls before the start or at/after the end of the
    /// click window.
    OutsideSessionWindow,
    /// The gap since the previous click (or since joining) reached the
    /// inactivity timeout. Disqualifies.
    InactivityTimeout,
    /// Too many clicks inside the trailing one-second window. Disqualifies;
    /// the crossing click stays recorded.
    RateLimitExceeded,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectReason::UnknownParticipant => "unknown_participant",
            RejectReason::Disqualified => "disqualified",
            RejectReason::SessionNotRunning => "session_not_running",
            RejectReason::OutsideSessionWindow => "outside_session_window",
            RejectReason::InactivityTimeout => "inactivity_timeout",
            RejectReason::RateLimitExceeded => "rate_limit_exceeded",
        };
        write!(f, "{s}")
    }
}

/// Outcome of evaluating one click event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClickOutcome {
    Accepted,
    Rejected(RejectReason),
}

impl ClickOutcome {
    pub fn accepted(&self) -> bool {
        matches!(self, ClickOutcome::Accepted)
    }
}

/// Evaluate one click event against one participant's history.
///
/// `now` is the coordinator's processing instant (drives the live phase
/// predicate); `event_at` is the arrival stamp the ingress adapter put on the
/// raw request. The rule order is load-bearing:
///
/// 1. Hard rejections leave no trace: disqualified, wrong phase, timestamp
///    outside the window.
/// 2. The inactivity check runs before the click is recorded, so a stale gap
///    disqualifies without spending a click slot.
/// 3. The rate check runs after the click is recorded, so the exact click
///    that crossed the threshold remains visible in the history.
pub fn validate_click(
    participant: &mut Participant,
    clock: &SessionClock,
    config: &EngineConfig,
    now: Instant,
    event_at: Instant,
) -> ClickOutcome {
    if participant.is_disqualified() {
        return ClickOutcome::Rejected(RejectReason::Disqualified);
    }
    if clock.phase(now) != SessionPhase::Running {
        return ClickOutcome::Rejected(RejectReason::SessionNotRunning);
    }
    let (Some(started_at), Some(ends_at)) = (clock.started_at(), clock.ends_at()) else {
        return ClickOutcome::Rejected(RejectReason::SessionNotRunning);
    };
    if event_at < started_at || event_at >= ends_at {
        return ClickOutcome::Rejected(RejectReason::OutsideSessionWindow);
    }

    let gap = event_at.saturating_duration_since(participant.last_click_at());
    if gap >= config.inactive_timeout {
        participant.disqualify();
        return ClickOutcome::Rejected(RejectReason::InactivityTimeout);
    }

    participant.record_click(event_at);

    let in_window = match event_at.checked_sub(RATE_WINDOW) {
        Some(cutoff) => participant.clicks_since(cutoff),
        None => participant.click_count(),
    };
    if in_window > config.max_clicks_per_second as usize {
        participant.disqualify();
        return ClickOutcome::Rejected(RejectReason::RateLimitExceeded);
    }

    ClickOutcome::Accepted
}
