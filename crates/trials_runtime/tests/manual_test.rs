//! Deterministic driver tests on the virtual clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use trials_core::{
    Completion, PointKind, ProgressLedger, SessionConfig, SessionDuration, Status, Timeline,
};
use trials_runtime::{Capabilities, FnSink, ManualSession, SessionBuilder};

fn manual(duration: i64) -> ManualSession {
    SessionBuilder::new(
        SessionConfig::for_game(Timeline::Past, "forge")
            .with_duration(SessionDuration::from_secs(duration)),
    )
    .manual()
}

#[test]
fn test_nine_goods_then_expiry() {
    let ledger = Arc::new(Mutex::new(ProgressLedger::new()));
    let session = SessionBuilder::new(
        SessionConfig::for_game(Timeline::Past, "forge")
            .with_duration(SessionDuration::from_secs(10)),
    )
    .sink(Arc::clone(&ledger))
    .manual();

    session.start_game();
    session.advance(Duration::from_millis(500));
    for _ in 0..9 {
        session.add_points(10, 0.0, 0.0, PointKind::Good);
        session.advance(Duration::from_secs(1));
    }
    assert!(session.is_game_started());
    session.advance(Duration::from_secs(1));

    let outcomes = session.take_outcomes();
    assert_eq!(outcomes.len(), 1);
    let completion = outcomes[0].completion().expect("won");
    assert_eq!(*completion.rewards().life_bonus(), 150);
    assert_eq!(*completion.rewards().time_bonus(), 0);
    assert!(!session.timers_armed());
    assert_eq!(*ledger.lock().unwrap().completions(), 1);

    // Time keeps moving, nothing else happens.
    session.advance(Duration::from_secs(5));
    assert!(session.take_outcomes().is_empty());
    assert_eq!(*session.snapshot().time_left(), 0);
}

#[test]
fn test_critical_after_expiry_in_same_turn_is_gameover() {
    let session = manual(1);
    session.start_game();
    session.add_points(0, 0.0, 0.0, PointKind::Critical);
    session.add_points(0, 0.0, 0.0, PointKind::Critical);

    session.in_one_turn(|s| {
        s.advance(Duration::from_secs(1));
        s.add_points(0, 0.0, 0.0, PointKind::Critical);
    });

    let outcomes = session.take_outcomes();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].status(), Status::GameOver);
    assert_eq!(*session.snapshot().lives(), 0);
}

#[test]
fn test_critical_before_expiry_in_same_turn_is_gameover() {
    let completions = Arc::new(Mutex::new(0u32));
    let counter = Arc::clone(&completions);
    let session = SessionBuilder::new(
        SessionConfig::for_game(Timeline::Future, "reactor")
            .with_duration(SessionDuration::from_secs(1)),
    )
    .sink(FnSink(move |_: &Completion| *counter.lock().unwrap() += 1))
    .manual();

    session.start_game();
    session.in_one_turn(|s| {
        for _ in 0..3 {
            s.add_points(0, 0.0, 0.0, PointKind::Critical);
        }
        s.advance(Duration::from_secs(1));
    });

    let outcomes = session.take_outcomes();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].status(), Status::GameOver);
    assert_eq!(*completions.lock().unwrap(), 0);
}

#[test]
fn test_every_turn_commits_its_own_transition() {
    let session = manual(30);
    session.start_game();
    for _ in 0..3 {
        session.add_points(0, 0.0, 0.0, PointKind::Critical);
    }
    // Already committed, the forced win is ignored.
    session.end_game();
    let outcomes = session.take_outcomes();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].status(), Status::GameOver);
    assert!(!session.is_game_started());
}

#[test]
fn test_restart_rearms_single_countdown() {
    let session = manual(10);
    session.start_game();
    session.advance(Duration::from_millis(2500));
    assert_eq!(*session.snapshot().time_left(), 8);

    session.start_game();
    assert_eq!(*session.snapshot().time_left(), 10);
    assert_eq!(*session.snapshot().cycle(), 2);
    session.advance(Duration::from_millis(1500));
    assert_eq!(*session.snapshot().time_left(), 9);
    assert!(session.take_outcomes().is_empty());
}

#[test]
fn test_decay_follows_virtual_wall_clock() {
    let session = manual(30);
    session.start_game();
    session.advance(Duration::from_millis(500));
    session.add_points(100, 0.0, 0.0, PointKind::Perfect);
    session.add_points(100, 0.0, 0.0, PointKind::Perfect);
    assert_eq!(*session.snapshot().combo(), 1.2);
    assert_eq!(*session.snapshot().streak(), 2);

    session.advance(Duration::from_millis(2700));
    assert_eq!(*session.snapshot().combo(), 1.2);
    session.advance(Duration::from_secs(1));
    assert_eq!(*session.snapshot().combo(), 1.0);
    // Decay keeps the streak and the recorded maximum.
    assert_eq!(*session.snapshot().streak(), 2);
    assert_eq!(session.snapshot().stats().max_combo_value(), 1.2);
}

#[test]
fn test_particles_expire_with_effects_ticker() {
    let session = manual(30);
    session.start_game();
    session.add_points(10, 4.0, 8.0, PointKind::Good);
    assert_eq!(*session.snapshot().particles(), 1);
    session.advance(Duration::from_millis(400));
    assert_eq!(*session.snapshot().particles(), 1);
    session.advance(Duration::from_millis(500));
    assert_eq!(*session.snapshot().particles(), 0);
}

#[test]
fn test_close_is_final() {
    let session = manual(30);
    session.start_game();
    session.advance(Duration::from_secs(2));
    session.close();

    session.add_points(100, 0.0, 0.0, PointKind::Perfect);
    session.start_game();
    session.advance(Duration::from_secs(5));
    assert!(!session.is_game_started());
    assert_eq!(*session.snapshot().time_left(), 28);
    assert_eq!(*session.snapshot().score(), 0);
    assert!(session.take_outcomes().is_empty());
}
