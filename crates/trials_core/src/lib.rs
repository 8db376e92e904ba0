//! Pure session logic for timed skill challenges.
//!
//! Everything here is synchronous and deterministic: the caller supplies the
//! current instant and decides when an update batch ends. The async clock and
//! capability handles live in `trials_runtime`.
//!
//! # Example
//!
//! ```
//! use std::time::Instant;
//! use trials_core::{PointKind, SessionConfig, SessionMachine, Status, Timeline};
//!
//! let mut machine = SessionMachine::new(SessionConfig::for_game(Timeline::Future, "reactor"));
//! machine.start_game(Instant::now());
//! machine.add_points(100, 0.0, 0.0, PointKind::Perfect, Instant::now());
//! assert_eq!(*machine.session().score(), 200);
//!
//! machine.end_game().unwrap();
//! let outcome = machine.settle().unwrap();
//! assert_eq!(outcome.status(), Status::Won);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod clock;
mod effects;
mod invariants;
mod machine;
mod outcome;
mod progress;
mod rewards;
mod scoring;
mod session;
mod types;

pub use clock::{ClockConfig, TimerKind};
pub use effects::{MAX_PARTICLES, PARTICLE_LIFETIME, Particle, ParticleField};
pub use invariants::{
    ComboInRange, GameOverMeansNoLives, Invariant, InvariantSet, InvariantViolation,
    LivesInRange, SessionInvariants, TimeLeftInRange, WinIsJustified, assert_invariants,
};
pub use machine::{Ignored, PointsOutcome, SessionMachine, TerminalCause, TickOutcome};
pub use outcome::{Completion, Defeat, ScoreSubmission, SessionSnapshot, TerminalOutcome};
pub use progress::{MAX_STABILITY, ProgressLedger, ResourceTotals};
pub use rewards::{
    ENERGY_GAIN, FinalTally, LIFE_BONUS_PER_LIFE, MIN_BASE_CREDITS, ResourceDivisors,
    RewardTable, Rewards, TIME_BONUS_PER_SEC, TimelineResources, calculate_rewards,
};
pub use scoring::{ScoreResult, calculate_score, good_points, neutral_points, perfect_points};
pub use session::{Session, SessionConfig, SessionDuration, SessionStats};
pub use types::{Combo, DEFAULT_DURATION_SECS, Difficulty, MAX_LIVES, PointKind, Status, Timeline};
