//! Scoring rules: how one play event changes score, combo and counters.
//!
//! Rules per kind:
//! - `perfect`: `base * combo * 2`, combo +0.10 (cap 3.0), streak advances.
//! - `good`: `base * combo`, combo +0.05 (cap 2.0).
//! - `miss`: never positive, combo back to 1.0, counts as a mistake.
//! - `critical`: handled by the mistake path, costs a life, base ignored.
//! - `score`: `base * combo` when positive, otherwise verbatim.

use crate::types::{Combo, PointKind};

/// Effect of a single event on the session, before it is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreResult {
    /// Signed score delta (clamping happens when applied).
    pub delta: i64,
    /// Multiplier after the event.
    pub combo: Combo,
    /// Whether the event counts as perfect.
    pub perfect: bool,
    /// Whether the event counts as a mistake.
    pub mistake: bool,
    /// Lives removed by the event (0 or 1).
    pub lives_lost: u8,
    /// Whether the perfect streak resets.
    pub breaks_streak: bool,
}

/// Points for a perfect action.
pub fn perfect_points(base_points: i64, combo: Combo) -> i64 {
    combo.apply(base_points, 2)
}

/// Points for a good action.
pub fn good_points(base_points: i64, combo: Combo) -> i64 {
    combo.apply(base_points, 1)
}

/// Points for a neutral score event.
pub fn neutral_points(base_points: i64, combo: Combo) -> i64 {
    if base_points > 0 {
        combo.apply(base_points, 1)
    } else {
        base_points
    }
}

/// Evaluates one event against the current multiplier.
pub fn calculate_score(kind: PointKind, base_points: i64, combo: Combo) -> ScoreResult {
    let unchanged = ScoreResult {
        delta: 0,
        combo,
        perfect: false,
        mistake: false,
        lives_lost: 0,
        breaks_streak: false,
    };

    match kind {
        PointKind::Perfect => ScoreResult {
            delta: perfect_points(base_points, combo),
            combo: combo.raised(Combo::PERFECT_STEP, Combo::MAX),
            perfect: true,
            ..unchanged
        },
        PointKind::Good => ScoreResult {
            delta: good_points(base_points, combo),
            combo: combo.raised(Combo::GOOD_STEP, Combo::GOOD_CAP),
            ..unchanged
        },
        PointKind::Miss => ScoreResult {
            delta: base_points.min(0),
            combo: Combo::ONE,
            mistake: true,
            breaks_streak: true,
            ..unchanged
        },
        PointKind::Critical => mistake(),
        PointKind::Score => ScoreResult {
            delta: neutral_points(base_points, combo),
            ..unchanged
        },
    }
}

/// The mistake handler's effect: combo reset, one mistake, one life.
pub fn mistake() -> ScoreResult {
    ScoreResult {
        delta: 0,
        combo: Combo::ONE,
        perfect: false,
        mistake: true,
        lives_lost: 1,
        breaks_streak: true,
    }
}
