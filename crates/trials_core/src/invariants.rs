//! First-class invariants for challenge sessions.
//!
//! Invariants are logical properties that must hold at every observable point.
//! The state machine checks them after each transition in debug builds; tests
//! check them after arbitrary event sequences.

use crate::machine::{SessionMachine, TerminalCause};
use crate::types::{Combo, MAX_LIVES, Status};

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("{}", description)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants that can be checked together.
///
/// Implemented for tuples of [`Invariant`]s.
pub trait InvariantSet<S> {
    /// Returns Ok(()) if all invariants hold, or every violation found.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

macro_rules! impl_invariant_set {
    ($($inv:ident),+) => {
        impl<S, $($inv),+> InvariantSet<S> for ($($inv,)+)
        where
            $($inv: Invariant<S>),+
        {
            fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
                let mut violations = Vec::new();
                $(
                    if !$inv::holds(state) {
                        violations.push(InvariantViolation::new($inv::description()));
                    }
                )+
                if violations.is_empty() {
                    Ok(())
                } else {
                    Err(violations)
                }
            }
        }
    };
}

impl_invariant_set!(I1, I2);
impl_invariant_set!(I1, I2, I3);
impl_invariant_set!(I1, I2, I3, I4);
impl_invariant_set!(I1, I2, I3, I4, I5);

// ─────────────────────────────────────────────────────────────
//  Session invariants
// ─────────────────────────────────────────────────────────────

/// Lives stay within `0..=3`.
pub struct LivesInRange;

impl Invariant<SessionMachine> for LivesInRange {
    fn holds(machine: &SessionMachine) -> bool {
        *machine.session().lives() <= MAX_LIVES
    }

    fn description() -> &'static str {
        "Lives must stay between 0 and 3"
    }
}

/// The clock never exceeds the configured duration.
pub struct TimeLeftInRange;

impl Invariant<SessionMachine> for TimeLeftInRange {
    fn holds(machine: &SessionMachine) -> bool {
        *machine.session().time_left() <= machine.config().duration().secs()
    }

    fn description() -> &'static str {
        "Time left must stay between 0 and the session duration"
    }
}

/// The multiplier stays within `1.0..=3.0`.
pub struct ComboInRange;

impl Invariant<SessionMachine> for ComboInRange {
    fn holds(machine: &SessionMachine) -> bool {
        let combo = *machine.session().combo();
        (Combo::ONE..=Combo::MAX).contains(&combo)
    }

    fn description() -> &'static str {
        "Combo multiplier must stay between 1.0 and 3.0"
    }
}

/// `gameover` implies no lives left.
pub struct GameOverMeansNoLives;

impl Invariant<SessionMachine> for GameOverMeansNoLives {
    fn holds(machine: &SessionMachine) -> bool {
        *machine.session().status() != Status::GameOver || *machine.session().lives() == 0
    }

    fn description() -> &'static str {
        "Status gameover requires zero lives"
    }
}

/// `won` implies the clock ran out with lives left, or a forced win.
pub struct WinIsJustified;

impl Invariant<SessionMachine> for WinIsJustified {
    fn holds(machine: &SessionMachine) -> bool {
        let session = machine.session();
        if *session.status() != Status::Won {
            return true;
        }
        match machine.ended_by() {
            Some(TerminalCause::Forced) => true,
            Some(TerminalCause::ClockExpired) => *session.time_left() == 0 && *session.lives() > 0,
            _ => false,
        }
    }

    fn description() -> &'static str {
        "Status won requires an expired clock with lives left, or a forced win"
    }
}

/// Every session invariant, composed.
pub type SessionInvariants = (
    LivesInRange,
    TimeLeftInRange,
    ComboInRange,
    GameOverMeansNoLives,
    WinIsJustified,
);

/// Panics in debug builds if any session invariant is violated.
pub fn assert_invariants(machine: &SessionMachine) {
    if cfg!(debug_assertions)
        && let Err(violations) = SessionInvariants::check_all(machine)
    {
        let descriptions = violations
            .iter()
            .map(|v| v.description.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        panic!("Session invariant violated: {}", descriptions);
    }
}
