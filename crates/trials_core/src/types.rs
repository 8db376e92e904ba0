//! Core domain types for timed skill challenges.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumIter, EnumString};
use tracing::instrument;

/// Lives granted at the start of every session.
pub const MAX_LIVES: u8 = 3;

/// Session length used when the host supplies nothing usable.
pub const DEFAULT_DURATION_SECS: u32 = 30;

/// Lifecycle status of a session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Status {
    /// Instructions screen; the clock has never run.
    #[default]
    Instructions,
    /// Clock running, capability calls accepted.
    Playing,
    /// Terminal: the player survived the clock or the content layer forced a win.
    Won,
    /// Terminal: all lives lost.
    #[strum(serialize = "gameover")]
    #[serde(rename = "gameover")]
    GameOver,
}

impl Status {
    /// Returns true for `won` and `gameover`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Won | Status::GameOver)
    }
}

/// Kind of play event reported through `add_points`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PointKind {
    /// Best possible action: double points, large combo step.
    Perfect,
    /// Acceptable action: plain points, small combo step.
    Good,
    /// Recoverable mistake: combo reset, no life lost.
    Miss,
    /// Costly mistake: routed to the mistake handler, costs a life.
    Critical,
    /// Neutral score adjustment; non-positive values apply verbatim.
    Score,
}

/// Difficulty selected by the host. Cosmetic for the engine.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Difficulty {
    /// Relaxed pacing.
    Easy,
    /// Standard pacing.
    #[default]
    Medium,
    /// Short, tight sessions.
    Hard,
}

impl Difficulty {
    /// Duration a host may offer when it has no explicit one.
    #[instrument]
    pub fn suggested_duration(self) -> u32 {
        match self {
            Difficulty::Easy => 45,
            Difficulty::Medium => DEFAULT_DURATION_SECS,
            Difficulty::Hard => 20,
        }
    }
}

/// Timeline the challenge belongs to; selects the reward resource bundle.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Timeline {
    /// Ancient forges and pressure works.
    Past,
    /// Grid, markets and traffic.
    #[default]
    Present,
    /// Reactors, AI defense and signal decoding.
    Future,
}

/// Combo multiplier stored in hundredths so every step is exact.
///
/// Always within `[1.00, 3.00]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Combo(u16);

impl Combo {
    /// Neutral multiplier.
    pub const ONE: Combo = Combo(100);
    /// Hard ceiling reachable through perfect actions.
    pub const MAX: Combo = Combo(300);
    /// Ceiling for increases coming from good actions.
    pub const GOOD_CAP: Combo = Combo(200);
    /// Increment applied by a perfect action.
    pub const PERFECT_STEP: u16 = 10;
    /// Increment applied by a good action.
    pub const GOOD_STEP: u16 = 5;

    /// Builds a combo from hundredths, clamped to the legal range.
    pub fn from_centis(centis: u16) -> Self {
        Combo(centis.clamp(Self::ONE.0, Self::MAX.0))
    }

    /// Builds a combo from a float, rounded to the nearest hundredth and clamped.
    ///
    /// Non-finite input yields [`Combo::ONE`].
    pub fn from_f64(value: f64) -> Self {
        if !value.is_finite() {
            return Self::ONE;
        }
        let centis = (value * 100.0).round().clamp(Self::ONE.0 as f64, Self::MAX.0 as f64);
        Combo(centis as u16)
    }

    /// Multiplier in hundredths (100 = 1.0x).
    pub fn centis(self) -> u16 {
        self.0
    }

    /// Multiplier as a float.
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Raises the multiplier by `step` without exceeding `cap`.
    ///
    /// A multiplier already above `cap` is left where it is.
    pub fn raised(self, step: u16, cap: Combo) -> Self {
        if self >= cap {
            return self;
        }
        Combo::from_centis(self.0.saturating_add(step).min(cap.0))
    }

    /// Scales `points` by the multiplier and `factor`, rounding toward negative infinity.
    ///
    /// Saturates at the `i64` bounds.
    pub fn apply(self, points: i64, factor: i64) -> i64 {
        let scaled = (points as i128 * self.0 as i128 * factor as i128).div_euclid(100);
        scaled.clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }
}

impl Default for Combo {
    fn default() -> Self {
        Self::ONE
    }
}

impl std::fmt::Display for Combo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}x", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Combo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Combo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Ok(Combo::from_f64(value))
    }
}
