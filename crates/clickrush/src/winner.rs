use crate::clock::{SessionClock, SessionPhase};
use crate::registry::ParticipantRegistry;
use crate::types::ParticipantId;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// The winning participant. Derived on demand, never stored; click times are
/// reported as offsets from session start so the record is serializable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerRecord {
    pub participant: ParticipantId,
    pub click_count: u32,
    pub first_click: Duration,
    pub last_click: Duration,
}

/// Answer to a winner query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WinnerResolution {
    /// The winner is only defined once the session has ended.
    SessionNotEnded,
    /// The session ended with no eligible participant who clicked.
    NoEligibleParticipants,
    Winner(WinnerRecord),
}

/// Deterministic selection over a registry snapshot.
///
/// Disqualified participants are excluded regardless of their recorded
/// counts, as are participants who never landed an accepted click. Ordering:
/// click count descending, then last recorded click ascending (earliest to
/// reach the tied count wins), then participant id ascending so the result
/// does not depend on map iteration order. Idempotent for an unchanged
/// registry.
pub fn resolve(
    clock: &SessionClock,
    registry: &ParticipantRegistry,
    now: Instant,
) -> WinnerResolution {
    if clock.phase(now) != SessionPhase::Ended {
        return WinnerResolution::SessionNotEnded;
    }
    let Some(started_at) = clock.started_at() else {
        return WinnerResolution::SessionNotEnded;
    };

    struct Candidate<'a> {
        id: &'a ParticipantId,
        count: usize,
        first: Instant,
        last: Instant,
    }

    let mut eligible: Vec<Candidate<'_>> = registry
        .iter()
        .filter_map(|(id, p)| {
            if p.is_disqualified() {
                return None;
            }
            Some(Candidate {
                id,
                count: p.click_count(),
                first: p.first_click()?,
                last: p.last_click()?,
            })
        })
        .collect();

    if eligible.is_empty() {
        return WinnerResolution::NoEligibleParticipants;
    }

    eligible.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.last.cmp(&b.last))
            .then_with(|| a.id.cmp(b.id))
    });

    let best = &eligible[0];
    WinnerResolution::Winner(WinnerRecord {
        participant: best.id.clone(),
        click_count: best.count as u32,
        first_click: best.first.duration_since(started_at),
        last_click: best.last.duration_since(started_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        clock: SessionClock,
        registry: ParticipantRegistry,
        start: Instant,
    }

    fn ended_session() -> Fixture {
        let start = Instant::now();
        let mut clock = SessionClock::new(Duration::from_secs(60));
        clock.start(start);
        Fixture {
            clock,
            registry: ParticipantRegistry::new(),
            start,
        }
    }

    impl Fixture {
        fn add_clicks(&mut self, id: &str, offsets_ms: &[u64]) -> ParticipantId {
            let id = ParticipantId::new(id);
            self.registry.initialize(&id, self.start);
            let p = self.registry.get_mut(&id).unwrap();
            for ms in offsets_ms {
                p.record_click(self.start + Duration::from_millis(*ms));
            }
            id
        }

        fn disqualify(&mut self, id: &ParticipantId) {
            self.registry.get_mut(id).unwrap().disqualify();
        }

        fn resolve_after_end(&self) -> WinnerResolution {
            resolve(
                &self.clock,
                &self.registry,
                self.start + Duration::from_secs(61),
            )
        }
    }

    #[test]
    fn undefined_before_session_ends() {
        let mut fx = ended_session();
        fx.add_clicks("alice", &[1_000, 2_000]);
        let mid_session = fx.start + Duration::from_secs(30);
        assert_eq!(
            resolve(&fx.clock, &fx.registry, mid_session),
            WinnerResolution::SessionNotEnded
        );
    }

    #[test]
    fn undefined_while_pending() {
        let clock = SessionClock::new(Duration::from_secs(60));
        let registry = ParticipantRegistry::new();
        assert_eq!(
            resolve(&clock, &registry, Instant::now()),
            WinnerResolution::SessionNotEnded
        );
    }

    #[test]
    fn empty_registry_has_no_winner() {
        let fx = ended_session();
        assert_eq!(
            fx.resolve_after_end(),
            WinnerResolution::NoEligibleParticipants
        );
    }

    #[test]
    fn highest_click_count_wins() {
        let mut fx = ended_session();
        fx.add_clicks("alice", &[1_000, 2_000, 3_000]);
        fx.add_clicks("bob", &[1_000, 2_000]);

        match fx.resolve_after_end() {
            WinnerResolution::Winner(record) => {
                assert_eq!(record.participant, ParticipantId::new("alice"));
                assert_eq!(record.click_count, 3);
                assert_eq!(record.first_click, Duration::from_secs(1));
                assert_eq!(record.last_click, Duration::from_secs(3));
            }
            other => panic!("expected a winner, got {other:?}"),
        }
    }

    #[test]
    fn tie_breaks_on_earlier_last_click() {
        let mut fx = ended_session();
        // Same count; bob reached it first
        fx.add_clicks("alice", &[1_100, 2_100, 3_100]);
        fx.add_clicks("bob", &[1_000, 2_000, 3_000]);

        match fx.resolve_after_end() {
            WinnerResolution::Winner(record) => {
                assert_eq!(record.participant, ParticipantId::new("bob"));
                assert_eq!(record.click_count, 3);
            }
            other => panic!("expected a winner, got {other:?}"),
        }
    }

    #[test]
    fn full_tie_breaks_on_participant_id() {
        let mut fx = ended_session();
        fx.add_clicks("carol", &[1_000, 2_000]);
        fx.add_clicks("bob", &[1_000, 2_000]);

        match fx.resolve_after_end() {
            WinnerResolution::Winner(record) => {
                assert_eq!(record.participant, ParticipantId::new("bob"));
            }
            other => panic!("expected a winner, got {other:?}"),
        }
    }

    #[test]
    fn disqualified_participants_are_excluded() {
        let mut fx = ended_session();
        fx.add_clicks("alice", &[1_000, 2_000]);
        let bob = fx.add_clicks("bob", &[100, 200, 300, 400, 500]);
        fx.disqualify(&bob);

        match fx.resolve_after_end() {
            WinnerResolution::Winner(record) => {
                assert_eq!(record.participant, ParticipantId::new("alice"));
                assert_eq!(record.click_count, 2);
            }
            other => panic!("expected a winner, got {other:?}"),
        }
    }

    #[test]
    fn all_disqualified_means_no_winner() {
        let mut fx = ended_session();
        let alice = fx.add_clicks("alice", &[1_000]);
        fx.disqualify(&alice);
        assert_eq!(
            fx.resolve_after_end(),
            WinnerResolution::NoEligibleParticipants
        );
    }

    #[test]
    fn zero_click_participants_are_not_winners() {
        let mut fx = ended_session();
        fx.add_clicks("alice", &[]);
        assert_eq!(
            fx.resolve_after_end(),
            WinnerResolution::NoEligibleParticipants
        );
    }

    #[test]
    fn resolution_is_idempotent() {
        let mut fx = ended_session();
        fx.add_clicks("alice", &[1_000, 2_000]);
        fx.add_clicks("bob", &[500]);
        assert_eq!(fx.resolve_after_end(), fx.resolve_after_end());
    }
}
