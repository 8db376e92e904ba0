//! What a session reports outward: snapshots while playing, one terminal outcome per cycle.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

use crate::rewards::{FinalTally, Rewards};
use crate::session::{SessionDuration, SessionStats};
use crate::types::{Status, Timeline};

/// Payload of a won cycle; the `onComplete` contract.
#[derive(Debug, Clone, PartialEq, Serialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub(crate) cycle: u64,
    pub(crate) timeline: Timeline,
    pub(crate) game_id: String,
    pub(crate) score: u64,
    pub(crate) rewards: Rewards,
    pub(crate) tally: FinalTally,
    pub(crate) duration: SessionDuration,
    pub(crate) best_streak: u32,
    /// True when the content layer ended the game rather than the clock.
    pub(crate) forced: bool,
}

impl Completion {
    /// Record a leaderboard consumer may submit.
    pub fn submission(&self, completed_at: DateTime<Utc>) -> ScoreSubmission {
        ScoreSubmission {
            timeline: self.timeline,
            game_id: self.game_id.clone(),
            score: self.score,
            duration: self.duration.secs(),
            completed_at,
        }
    }
}

/// Payload of a lost cycle. Carries no rewards.
#[derive(Debug, Clone, PartialEq, Serialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct Defeat {
    pub(crate) cycle: u64,
    pub(crate) timeline: Timeline,
    pub(crate) game_id: String,
    pub(crate) score: u64,
    pub(crate) tally: FinalTally,
    pub(crate) best_streak: u32,
}

/// Result of a terminal transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TerminalOutcome {
    /// Clock survived or forced win.
    Won(Completion),
    /// Lives exhausted.
    #[serde(rename = "gameover")]
    GameOver(Defeat),
}

impl TerminalOutcome {
    /// Cycle number the outcome belongs to.
    pub fn cycle(&self) -> u64 {
        match self {
            TerminalOutcome::Won(c) => c.cycle,
            TerminalOutcome::GameOver(d) => d.cycle,
        }
    }

    /// Final score.
    pub fn score(&self) -> u64 {
        match self {
            TerminalOutcome::Won(c) => c.score,
            TerminalOutcome::GameOver(d) => d.score,
        }
    }

    /// Terminal status reached.
    pub fn status(&self) -> Status {
        match self {
            TerminalOutcome::Won(_) => Status::Won,
            TerminalOutcome::GameOver(_) => Status::GameOver,
        }
    }

    /// The completion, if the cycle was won.
    pub fn completion(&self) -> Option<&Completion> {
        match self {
            TerminalOutcome::Won(c) => Some(c),
            TerminalOutcome::GameOver(_) => None,
        }
    }
}

/// Leaderboard entry derived from a completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmission {
    /// Timeline tag.
    pub timeline: Timeline,
    /// Mini-game identifier.
    pub game_id: String,
    /// Final score.
    pub score: u64,
    /// Configured session length in seconds.
    pub duration: u32,
    /// When the win was committed.
    pub completed_at: DateTime<Utc>,
}

/// Read-only view published after every update batch.
#[derive(Debug, Clone, PartialEq, Serialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub(crate) cycle: u64,
    pub(crate) status: Status,
    pub(crate) score: u64,
    pub(crate) time_left: u32,
    pub(crate) lives: u8,
    pub(crate) combo: f64,
    pub(crate) stats: SessionStats,
    pub(crate) streak: u32,
    pub(crate) best_streak: u32,
    pub(crate) particles: usize,
}

impl SessionSnapshot {
    /// True while the clock runs.
    pub fn is_game_started(&self) -> bool {
        self.status == Status::Playing
    }
}
