use crate::types::ParticipantId;
use std::collections::HashMap;
use tokio::time::Instant;

/// One tracked participant.
///
/// The click history is append-only with non-decreasing timestamps, and the
/// disqualified flag only ever moves from false to true. Both invariants are
/// enforced here: mutation goes through [`record_click`](Self::record_click)
/// and [`disqualify`](Self::disqualify), never field access.
#[derive(Debug, Clone)]
pub struct Participant {
    clicks: Vec<Instant>,
    disqualified: bool,
    joined_at: Instant,
    last_click_at: Instant,
}

impl Participant {
    fn new(now: Instant) -> Self {
        Self {
            clicks: Vec::new(),
            disqualified: false,
            joined_at: now,
            last_click_at: now,
        }
    }

    pub fn click_count(&self) -> usize {
        self.clicks.len()
    }

    pub fn clicks(&self) -> &[Instant] {
        &self.clicks
    }

    pub fn is_disqualified(&self) -> bool {
        self.disqualified
    }

    pub fn joined_at(&self) -> Instant {
        self.joined_at
    }

    /// Timestamp of the most recent accepted click, or the join instant while
    /// the history is empty. The inactivity rule measures gaps against this.
    pub fn last_click_at(&self) -> Instant {
        self.last_click_at
    }

    pub fn first_click(&self) -> Option<Instant> {
        self.clicks.first().copied()
    }

    pub fn last_click(&self) -> Option<Instant> {
        self.clicks.last().copied()
    }

    /// Number of recorded clicks with timestamp >= `cutoff`. The history is
    /// non-decreasing, so scanning back from the tail visits exactly the
    /// trailing window.
    pub fn clicks_since(&self, cutoff: Instant) -> usize {
        self.clicks.iter().rev().take_while(|t| **t >= cutoff).count()
    }

    pub(crate) fn disqualify(&mut self) {
        self.disqualified = true;
    }

    pub(crate) fn record_click(&mut self, at: Instant) {
        self.last_click_at = at;
        self.clicks.push(at);
    }
}

/// Result of initializing a participant record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Created,
    /// The id is already tracked (joined, possibly disqualified). Idempotent
    /// failure so the click path can lazily initialize on first contact.
    AlreadyTracked,
}

/// Participant id to click-history map.
///
/// Owned exclusively by the coordinator; exactly one logical thread of
/// control touches it at any instant. Records are never deleted.
#[derive(Debug, Default)]
pub struct ParticipantRegistry {
    participants: HashMap<ParticipantId, Participant>,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty record with `joined_at = last_click_at = now`.
    /// Membership in the identity store is the caller's check.
    pub fn initialize(&mut self, id: &ParticipantId, now: Instant) -> InitOutcome {
        if self.participants.contains_key(id) {
            return InitOutcome::AlreadyTracked;
        }
        self.participants.insert(id.clone(), Participant::new(now));
        InitOutcome::Created
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.participants.contains_key(id)
    }

    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.get(id)
    }

    pub fn get_mut(&mut self, id: &ParticipantId) -> Option<&mut Participant> {
        self.participants.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParticipantId, &Participant)> {
        self.participants.iter()
    }
}
