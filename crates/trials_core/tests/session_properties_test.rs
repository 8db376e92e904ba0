//! Property tests: arbitrary event sequences never break session invariants.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use proptest::prelude::*;
use trials_core::{
    Combo, InvariantSet, MAX_LIVES, PointKind, SessionConfig, SessionDuration,
    SessionInvariants, SessionMachine, Status, Timeline,
};

#[derive(Debug, Clone)]
enum Step {
    Points(PointKind, i64),
    Countdown,
    Decay(u64),
    EndGame,
    Settle,
    Start,
}

fn point_kind() -> impl Strategy<Value = PointKind> {
    prop_oneof![
        Just(PointKind::Perfect),
        Just(PointKind::Good),
        Just(PointKind::Miss),
        Just(PointKind::Critical),
        Just(PointKind::Score),
    ]
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => (point_kind(), -200i64..500).prop_map(|(k, p)| Step::Points(k, p)),
        3 => Just(Step::Countdown),
        1 => (0u64..5000).prop_map(Step::Decay),
        1 => Just(Step::EndGame),
        3 => Just(Step::Settle),
        1 => Just(Step::Start),
    ]
}

proptest! {
    #[test]
    fn invariants_hold_for_any_sequence(
        duration in 1i64..8,
        steps in prop::collection::vec(step(), 0..120),
    ) {
        let mut m = SessionMachine::new(
            SessionConfig::for_game(Timeline::Past, "relay")
                .with_duration(SessionDuration::from_secs(duration)),
        );
        let t0 = Instant::now();
        let mut elapsed = Duration::ZERO;
        let mut outcomes: HashMap<u64, u32> = HashMap::new();

        for step in steps {
            let epoch = *m.epoch();
            let before = m.session().clone();
            let restarting = matches!(step, Step::Start);
            match step {
                Step::Points(kind, base) => {
                    m.add_points(base, 0.0, 0.0, kind, t0 + elapsed);
                }
                Step::Countdown => {
                    m.countdown_tick(epoch);
                }
                Step::Decay(ms) => {
                    elapsed += Duration::from_millis(ms);
                    m.decay_tick(epoch, t0 + elapsed);
                }
                Step::EndGame => {
                    let _ = m.end_game();
                }
                Step::Settle => {
                    if let Some(outcome) = m.settle() {
                        *outcomes.entry(outcome.cycle()).or_default() += 1;
                        prop_assert_eq!(outcome.cycle(), epoch);
                        prop_assert_eq!(
                            outcome.status() == Status::Won,
                            outcome.completion().is_some()
                        );
                    }
                }
                Step::Start => {
                    m.start_game(t0 + elapsed);
                }
            }

            SessionInvariants::check_all(&m)
                .map_err(|v| TestCaseError::fail(format!("{:?}", v)))?;
            let session = m.session();
            prop_assert!(*session.lives() <= MAX_LIVES);
            prop_assert!(*session.time_left() <= duration as u32);
            prop_assert!(*session.combo() >= Combo::ONE && *session.combo() <= Combo::MAX);

            // A finished cycle is frozen until the next start.
            if before.status().is_terminal() && !restarting {
                prop_assert_eq!(&before, session);
            }
        }

        prop_assert!(outcomes.values().all(|&n| n == 1));
    }

    #[test]
    fn lives_only_drop_on_critical(
        kinds in prop::collection::vec(point_kind(), 1..40),
    ) {
        let mut m = SessionMachine::new(SessionConfig::for_game(Timeline::Present, "grid"));
        let now = Instant::now();
        m.start_game(now);
        let mut criticals = 0u8;
        for kind in kinds {
            if !m.accepts_input() {
                break;
            }
            if kind == PointKind::Critical {
                criticals += 1;
            }
            m.add_points(10, 0.0, 0.0, kind, now);
        }
        prop_assert_eq!(*m.session().lives(), MAX_LIVES - criticals.min(MAX_LIVES));
        // Nothing is committed before the batch settles.
        prop_assert_eq!(*m.session().status(), Status::Playing);
    }
}
