//! Session parameters and canonical session fields.

use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::types::{Combo, DEFAULT_DURATION_SECS, Difficulty, MAX_LIVES, Status, Timeline};

/// Validated session length in whole seconds. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionDuration(u32);

impl SessionDuration {
    /// Accepts any positive whole number of seconds, otherwise the default.
    #[instrument]
    pub fn from_secs(secs: i64) -> Self {
        match u32::try_from(secs) {
            Ok(secs) if secs > 0 => Self(secs),
            _ => {
                warn!(secs, default = DEFAULT_DURATION_SECS, "Invalid duration, using default");
                Self::default()
            }
        }
    }

    /// Accepts a positive finite float, truncated to whole seconds.
    ///
    /// Values that truncate to zero fall back to the default.
    #[instrument]
    pub fn from_secs_f64(secs: f64) -> Self {
        if secs.is_finite() && secs >= 1.0 && secs <= u32::MAX as f64 {
            Self(secs.trunc() as u32)
        } else {
            warn!(secs, default = DEFAULT_DURATION_SECS, "Invalid duration, using default");
            Self::default()
        }
    }

    /// Parses host input such as `"45"` or `"12.5"`. Non-numeric text yields the default.
    #[instrument]
    pub fn parse(input: &str) -> Self {
        match input.trim().parse::<f64>() {
            Ok(secs) => Self::from_secs_f64(secs),
            Err(_) => {
                warn!(input, default = DEFAULT_DURATION_SECS, "Non-numeric duration, using default");
                Self::default()
            }
        }
    }

    /// Seconds.
    pub fn secs(self) -> u32 {
        self.0
    }
}

impl Default for SessionDuration {
    fn default() -> Self {
        Self(DEFAULT_DURATION_SECS)
    }
}

/// Construction parameters handed over by the host screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct SessionConfig {
    /// Timeline tag routed into rewards and completions.
    timeline: Timeline,
    /// Identifier of the mini-game (e.g. `"forge"`, `"morse"`).
    game_id: String,
    /// Clock length.
    duration: SessionDuration,
    /// Cosmetic difficulty.
    difficulty: Difficulty,
}

impl SessionConfig {
    /// Config with the default duration and difficulty.
    #[instrument(skip(game_id))]
    pub fn for_game(timeline: Timeline, game_id: impl Into<String>) -> Self {
        Self {
            timeline,
            game_id: game_id.into(),
            duration: SessionDuration::default(),
            difficulty: Difficulty::default(),
        }
    }

    /// Replaces the duration.
    pub fn with_duration(mut self, duration: SessionDuration) -> Self {
        self.duration = duration;
        self
    }

    /// Replaces the difficulty.
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }
}

/// Lifetime counters of one session cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Getters)]
pub struct SessionStats {
    /// Accepted `add_points` calls of any kind.
    pub(crate) total_actions: u32,
    /// Accepted perfect actions.
    pub(crate) perfect_actions: u32,
    /// Misses plus life-costing mistakes.
    pub(crate) mistakes: u32,
    /// Highest multiplier observed; zero-valued until the first action.
    pub(crate) max_combo: Option<Combo>,
}

impl SessionStats {
    /// Builds stats from raw counters, e.g. for reward previews.
    pub fn from_counts(
        total_actions: u32,
        perfect_actions: u32,
        mistakes: u32,
        max_combo: Option<Combo>,
    ) -> Self {
        Self {
            total_actions,
            perfect_actions,
            mistakes,
            max_combo,
        }
    }

    /// `max_combo` as a float, 0.0 before any action.
    pub fn max_combo_value(&self) -> f64 {
        self.max_combo.map(Combo::as_f64).unwrap_or(0.0)
    }

    /// `max_combo` in hundredths, 0 before any action.
    pub fn max_combo_centis(&self) -> u32 {
        self.max_combo.map(|c| c.centis() as u32).unwrap_or(0)
    }

    /// Fraction of actions that were perfect.
    pub fn accuracy(&self) -> f64 {
        self.perfect_actions as f64 / self.total_actions.max(1) as f64
    }
}

/// Canonical mutable fields of a session.
///
/// Only [`crate::SessionMachine`] mutates these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters)]
pub struct Session {
    pub(crate) status: Status,
    pub(crate) score: u64,
    pub(crate) time_left: u32,
    pub(crate) lives: u8,
    pub(crate) combo: Combo,
    pub(crate) stats: SessionStats,
    /// Consecutive perfect actions.
    pub(crate) streak: u32,
    /// Longest perfect run this cycle.
    pub(crate) best_streak: u32,
}

impl Session {
    /// Fresh fields for the instructions screen.
    pub(crate) fn idle(duration: SessionDuration) -> Self {
        Self {
            status: Status::Instructions,
            score: 0,
            time_left: duration.secs(),
            lives: MAX_LIVES,
            combo: Combo::ONE,
            stats: SessionStats::default(),
            streak: 0,
            best_streak: 0,
        }
    }

    /// Fields as they stand right after `start_game`.
    pub(crate) fn started(duration: SessionDuration) -> Self {
        Self {
            status: Status::Playing,
            ..Self::idle(duration)
        }
    }

    /// Combo multiplier as a float.
    pub fn combo_multiplier(&self) -> f64 {
        self.combo.as_f64()
    }

    /// Adds a signed delta, clamping at zero.
    pub(crate) fn apply_score_delta(&mut self, delta: i64) {
        self.score = if delta >= 0 {
            self.score.saturating_add(delta as u64)
        } else {
            self.score.saturating_sub(delta.unsigned_abs())
        };
    }
}
