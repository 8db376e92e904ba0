//! Player progress store fed by won sessions.

use std::collections::BTreeMap;

use derive_getters::Getters;
use serde::Serialize;
use tracing::{info, instrument};

use crate::outcome::Completion;
use crate::types::Timeline;

/// Stability never climbs above this.
pub const MAX_STABILITY: u32 = 100;

/// Accumulated resources of one timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResourceTotals {
    /// Score-derived resource total.
    pub primary: u64,
    /// Perfect-derived resource total.
    pub secondary: u64,
}

/// In-memory player progress: what the host merges every completion into.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Getters)]
pub struct ProgressLedger {
    credits: u64,
    energy: u64,
    stability: u32,
    coins_per_second: u64,
    resources: BTreeMap<Timeline, ResourceTotals>,
    /// Best score per `timeline/game_id`.
    best_scores: BTreeMap<String, u64>,
    completions: u32,
}

impl ProgressLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges a completion's rewards. Returns true if it set a new best score.
    #[instrument(skip(self, completion), fields(game_id = %completion.game_id(), score = completion.score()))]
    pub fn merge(&mut self, completion: &Completion) -> bool {
        let rewards = completion.rewards();
        self.credits = self.credits.saturating_add(*rewards.credits());
        self.energy += *rewards.energy() as u64;
        self.stability = (self.stability + rewards.stability()).min(MAX_STABILITY);
        self.coins_per_second += *rewards.coins_per_second() as u64;
        self.completions += 1;

        let (primary, secondary) = rewards.resources().amounts();
        let totals = self.resources.entry(rewards.resources().timeline()).or_default();
        totals.primary = totals.primary.saturating_add(primary);
        totals.secondary += secondary as u64;

        let key = Self::score_key(*completion.timeline(), completion.game_id());
        let best = self.best_scores.entry(key).or_insert(0);
        let improved = *completion.score() > *best;
        if improved {
            *best = *completion.score();
        }

        info!(credits = self.credits, stability = self.stability, improved, "Progress updated");
        improved
    }

    /// Best score recorded for a game.
    pub fn best_score(&self, timeline: Timeline, game_id: &str) -> Option<u64> {
        self.best_scores.get(&Self::score_key(timeline, game_id)).copied()
    }

    /// Resource totals of a timeline.
    pub fn resources_for(&self, timeline: Timeline) -> ResourceTotals {
        self.resources.get(&timeline).copied().unwrap_or_default()
    }

    fn score_key(timeline: Timeline, game_id: &str) -> String {
        format!("{}/{}", timeline, game_id)
    }
}
