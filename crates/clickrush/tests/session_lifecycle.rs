//! Session lifecycle tests: start, the click window boundary, end-of-session
//! behavior, and winner resolution over the public coordinator surface.

use std::time::Duration;

use clickrush::testing::TestEngine;
use clickrush::{ClickOutcome, ParticipantId, RejectReason, StartOutcome, WinnerResolution};
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn session_start_is_one_shot() {
    let engine = TestEngine::pending().await;
    assert_eq!(
        engine.handle().start_session().await.unwrap(),
        StartOutcome::Started
    );
    assert_eq!(
        engine.handle().start_session().await.unwrap(),
        StartOutcome::AlreadyStarted
    );
    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn clicks_rejected_while_pending() {
    let engine = TestEngine::pending().await;
    let alice = engine.register("alice").await;
    let outcome = engine.handle().submit_click(&alice).await.unwrap();
    assert_eq!(
        outcome,
        ClickOutcome::Rejected(RejectReason::SessionNotRunning)
    );
    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn click_window_end_boundary() {
    let engine = TestEngine::started().await;
    let start = Instant::now();
    let alice = engine.register("alice").await;

    // One millisecond before the boundary: accepted
    let just_inside = start + Duration::from_secs(60) - Duration::from_millis(1);
    assert_eq!(
        engine
            .handle()
            .submit_click_at(&alice, just_inside)
            .await
            .unwrap(),
        ClickOutcome::Accepted
    );

    // Exactly at start + duration: outside the window
    let at_boundary = start + Duration::from_secs(60);
    assert_eq!(
        engine
            .handle()
            .submit_click_at(&alice, at_boundary)
            .await
            .unwrap(),
        ClickOutcome::Rejected(RejectReason::OutsideSessionWindow)
    );

    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn session_ends_with_zero_clicks() {
    let engine = TestEngine::started().await;
    engine.register("alice").await;

    assert_eq!(
        engine.handle().query_winner().await.unwrap(),
        WinnerResolution::SessionNotEnded
    );

    // The time-triggered transition needs no click traffic
    tokio::time::sleep(Duration::from_secs(61)).await;

    assert_eq!(
        engine.handle().query_winner().await.unwrap(),
        WinnerResolution::NoEligibleParticipants
    );
    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn clicks_rejected_after_session_end() {
    let engine = TestEngine::started().await;
    let alice = engine.register("alice").await;

    tokio::time::sleep(Duration::from_secs(61)).await;

    let outcome = engine.handle().submit_click(&alice).await.unwrap();
    assert_eq!(
        outcome,
        ClickOutcome::Rejected(RejectReason::SessionNotRunning)
    );
    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn end_to_end_winner_excludes_disqualified_runner_up() {
    let engine = TestEngine::started().await;
    let start = Instant::now();
    let alice = engine.register("alice").await;
    let bob = engine.register("bob").await;

    // Interleaved by arrival time. Alice lands 5 clicks spaced 0.25s to 8s
    // apart; Bob lands 5 earlier clicks that would win the tie-break, then
    // goes silent for 11 seconds and clicks again.
    let schedule: Vec<(&ParticipantId, u64)> = vec![
        (&alice, 1_000),
        (&alice, 1_250),
        (&bob, 2_000),
        (&alice, 3_000),
        (&bob, 3_500),
        (&bob, 4_000),
        (&bob, 5_000),
        (&bob, 6_000),
        (&alice, 9_000),
        (&alice, 17_000),
    ];
    for (id, offset_ms) in schedule {
        let outcome = engine
            .handle()
            .submit_click_at(id, start + Duration::from_millis(offset_ms))
            .await
            .unwrap();
        assert_eq!(outcome, ClickOutcome::Accepted, "click at {offset_ms}ms");
    }

    // Bob's comeback click arrives 11s after his last: disqualified
    let outcome = engine
        .handle()
        .submit_click_at(&bob, start + Duration::from_millis(17_000))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        ClickOutcome::Rejected(RejectReason::InactivityTimeout)
    );

    tokio::time::sleep(Duration::from_secs(61)).await;

    match engine.handle().query_winner().await.unwrap() {
        WinnerResolution::Winner(record) => {
            assert_eq!(record.participant, alice);
            assert_eq!(record.click_count, 5);
            assert_eq!(record.first_click, Duration::from_millis(1_000));
            assert_eq!(record.last_click, Duration::from_millis(17_000));
        }
        other => panic!("expected alice to win, got {other:?}"),
    }
    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn winner_query_is_idempotent() {
    let engine = TestEngine::started().await;
    let start = Instant::now();
    let alice = engine.register("alice").await;

    for offset_ms in [1_000, 2_000, 3_000] {
        engine
            .handle()
            .submit_click_at(&alice, start + Duration::from_millis(offset_ms))
            .await
            .unwrap();
    }

    tokio::time::sleep(Duration::from_secs(61)).await;

    let first = engine.handle().query_winner().await.unwrap();
    let second = engine.handle().query_winner().await.unwrap();
    assert_eq!(first, second);
    assert!(matches!(first, WinnerResolution::Winner(_)));
    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn unknown_participant_never_initialized() {
    let engine = TestEngine::started().await;
    engine.register("alice").await;

    let outcome = engine
        .handle()
        .submit_click(&ParticipantId::new("mallory"))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        ClickOutcome::Rejected(RejectReason::UnknownParticipant)
    );
    engine.shutdown().await;
}
