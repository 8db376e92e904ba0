//! Reward calculation for won sessions.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::session::SessionStats;
use crate::types::Timeline;

/// Credits granted per remaining second.
pub const TIME_BONUS_PER_SEC: u64 = 10;
/// Credits granted per remaining life.
pub const LIFE_BONUS_PER_LIFE: u64 = 50;
/// Minimum base credits for any win.
pub const MIN_BASE_CREDITS: u64 = 100;
/// Fixed energy reward.
pub const ENERGY_GAIN: u32 = 15;
/// Flat stability added on top of the accuracy share.
pub const BASE_STABILITY_GAIN: u32 = 5;

/// Divisors turning a session into timeline resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDivisors {
    /// Divides the final score.
    pub score: u64,
    /// Divides the perfect action count.
    pub perfect: u32,
}

/// Content-defined divisors per timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(default)]
pub struct RewardTable {
    past: ResourceDivisors,
    present: ResourceDivisors,
    future: ResourceDivisors,
}

impl RewardTable {
    /// Table with explicit divisors.
    pub fn new(past: ResourceDivisors, present: ResourceDivisors, future: ResourceDivisors) -> Self {
        Self {
            past,
            present,
            future,
        }
    }

    /// Divisors for one timeline.
    pub fn divisors(&self, timeline: Timeline) -> ResourceDivisors {
        match timeline {
            Timeline::Past => self.past,
            Timeline::Present => self.present,
            Timeline::Future => self.future,
        }
    }
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            past: ResourceDivisors {
                score: 200,
                perfect: 5,
            },
            present: ResourceDivisors {
                score: 150,
                perfect: 4,
            },
            future: ResourceDivisors {
                score: 250,
                perfect: 10,
            },
        }
    }
}

/// Timeline-specific resource bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "timeline", rename_all = "lowercase")]
pub enum TimelineResources {
    /// Past timeline resources.
    #[serde(rename_all = "camelCase")]
    Past {
        /// Score-derived.
        artifacts: u64,
        /// Perfect-derived.
        relics: u32,
    },
    /// Present timeline resources.
    #[serde(rename_all = "camelCase")]
    Present {
        /// Score-derived.
        materials: u64,
        /// Perfect-derived.
        data: u32,
    },
    /// Future timeline resources.
    #[serde(rename_all = "camelCase")]
    Future {
        /// Score-derived.
        tech_fragments: u64,
        /// Perfect-derived.
        quantum_cores: u32,
    },
}

impl TimelineResources {
    /// Computes the bundle for a timeline.
    #[instrument(skip(table))]
    pub fn compute(timeline: Timeline, score: u64, perfect_actions: u32, table: &RewardTable) -> Self {
        let divisors = table.divisors(timeline);
        let from_score = score.checked_div(divisors.score).unwrap_or(0);
        let from_perfect = perfect_actions.checked_div(divisors.perfect).unwrap_or(0);
        match timeline {
            Timeline::Past => TimelineResources::Past {
                artifacts: from_score,
                relics: from_perfect,
            },
            Timeline::Present => TimelineResources::Present {
                materials: from_score,
                data: from_perfect,
            },
            Timeline::Future => TimelineResources::Future {
                tech_fragments: from_score,
                quantum_cores: from_perfect,
            },
        }
    }

    /// Timeline this bundle belongs to.
    pub fn timeline(&self) -> Timeline {
        match self {
            TimelineResources::Past { .. } => Timeline::Past,
            TimelineResources::Present { .. } => Timeline::Present,
            TimelineResources::Future { .. } => Timeline::Future,
        }
    }

    /// Score-derived and perfect-derived amounts, in that order.
    pub fn amounts(&self) -> (u64, u32) {
        match *self {
            TimelineResources::Past { artifacts, relics } => (artifacts, relics),
            TimelineResources::Present { materials, data } => (materials, data),
            TimelineResources::Future {
                tech_fragments,
                quantum_cores,
            } => (tech_fragments, quantum_cores),
        }
    }
}

/// Final figures a reward is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalTally {
    /// Final score.
    pub score: u64,
    /// Seconds left on the clock.
    pub time_left: u32,
    /// Lives left.
    pub lives: u8,
    /// Session counters.
    pub stats: SessionStats,
}

/// Reward payload handed to the host on a win.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct Rewards {
    credits: u64,
    energy: u32,
    stability: u32,
    coins_per_second: u32,
    resources: TimelineResources,
    accuracy: f64,
    time_bonus: u64,
    life_bonus: u64,
    combo_bonus: u64,
}

/// Derives the reward payload from a won session.
#[instrument(skip(table))]
pub fn calculate_rewards(tally: &FinalTally, timeline: Timeline, table: &RewardTable) -> Rewards {
    let stats = &tally.stats;
    let accuracy = stats.accuracy();
    let time_bonus = tally.time_left as u64 * TIME_BONUS_PER_SEC;
    let life_bonus = tally.lives as u64 * LIFE_BONUS_PER_LIFE;
    // maxCombo * 100 is exactly the multiplier in hundredths.
    let combo_bonus = stats.max_combo_centis() as u64;

    let base_credits = (tally.score / 10).max(MIN_BASE_CREDITS);
    let credits = base_credits + time_bonus + life_bonus + combo_bonus;
    let stability = (accuracy * 20.0).floor() as u32 + BASE_STABILITY_GAIN;
    let coins_per_second = stats.max_combo_centis() / 200;
    let resources =
        TimelineResources::compute(timeline, tally.score, stats.perfect_actions, table);

    debug!(credits, stability, coins_per_second, "Rewards calculated");

    Rewards {
        credits,
        energy: ENERGY_GAIN,
        stability,
        coins_per_second,
        resources,
        accuracy,
        time_bonus,
        life_bonus,
        combo_bonus,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Combo;

    fn tally(score: u64, time_left: u32, lives: u8, stats: SessionStats) -> FinalTally {
        FinalTally {
            score,
            time_left,
            lives,
            stats,
        }
    }

    #[test]
    fn test_minimum_credits() {
        let stats = SessionStats::from_counts(0, 0, 0, None);
        let rewards = calculate_rewards(&tally(0, 0, 3, stats), Timeline::Past, &RewardTable::default());
        assert_eq!(*rewards.credits(), 100 + 150);
        assert_eq!(*rewards.stability(), 5);
        assert_eq!(*rewards.energy(), 15);
        assert_eq!(*rewards.coins_per_second(), 0);
    }

    #[test]
    fn test_full_breakdown() {
        let stats = SessionStats::from_counts(10, 5, 1, Some(Combo::from_centis(150)));
        let rewards =
            calculate_rewards(&tally(2500, 4, 2, stats), Timeline::Present, &RewardTable::default());
        // base 250 + time 40 + life 100 + combo 150
        assert_eq!(*rewards.credits(), 540);
        assert_eq!(*rewards.stability(), 15);
        assert_eq!(*rewards.coins_per_second(), 0);
        assert_eq!(
            *rewards.resources(),
            TimelineResources::Present {
                materials: 16,
                data: 1
            }
        );
    }

    #[test]
    fn test_coins_per_second_floor() {
        let stats = SessionStats::from_counts(30, 30, 0, Some(Combo::MAX));
        let rewards =
            calculate_rewards(&tally(9000, 0, 3, stats), Timeline::Future, &RewardTable::default());
        assert_eq!(*rewards.coins_per_second(), 1);
        assert_eq!(*rewards.stability(), 25);
        assert_eq!(
            *rewards.resources(),
            TimelineResources::Future {
                tech_fragments: 36,
                quantum_cores: 3
            }
        );
    }

    #[test]
    fn test_zero_divisor_yields_nothing() {
        let zero = ResourceDivisors { score: 0, perfect: 0 };
        let table = RewardTable::new(zero, zero, zero);
        let resources = TimelineResources::compute(Timeline::Past, 5000, 50, &table);
        assert_eq!(resources.amounts(), (0, 0));
    }
}
