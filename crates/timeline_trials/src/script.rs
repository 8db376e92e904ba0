//! Scripted play: timed capability calls loaded from TOML.

use std::path::Path;
use std::time::Duration;

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use trials_core::{Difficulty, PointKind, SessionConfig, SessionDuration, Timeline};

use crate::config::{ConfigError, TrialsConfig};

/// One timed action of a script.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
pub struct ScriptEvent {
    /// Offset from `start_game`, in milliseconds of session time.
    at_ms: u64,
    /// Event kind; absent for `end_game` entries.
    #[serde(default)]
    kind: Option<PointKind>,
    /// Base points of the event.
    #[serde(default)]
    base_points: i64,
    /// Cosmetic x position.
    #[serde(default)]
    x: f32,
    /// Cosmetic y position.
    #[serde(default)]
    y: f32,
    /// Forces a win instead of scoring.
    #[serde(default)]
    end_game: bool,
}

/// What a script step asks the engine to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptAction {
    /// `add_points`.
    Points {
        /// Base points.
        base_points: i64,
        /// Cosmetic x.
        x: f32,
        /// Cosmetic y.
        y: f32,
        /// Event kind.
        kind: PointKind,
    },
    /// `end_game`.
    EndGame,
}

impl ScriptEvent {
    /// Event that scores at `at_ms`.
    pub fn points(at_ms: u64, kind: PointKind, base_points: i64) -> Self {
        Self {
            at_ms,
            kind: Some(kind),
            base_points,
            x: 0.0,
            y: 0.0,
            end_game: false,
        }
    }

    /// Event that forces a win at `at_ms`.
    pub fn end_game_at(at_ms: u64) -> Self {
        Self {
            at_ms,
            kind: None,
            base_points: 0,
            x: 0.0,
            y: 0.0,
            end_game: true,
        }
    }

    /// The capability call this event stands for.
    pub fn action(&self) -> Result<ScriptAction, ConfigError> {
        match (self.kind, self.end_game) {
            (Some(kind), false) => Ok(ScriptAction::Points {
                base_points: self.base_points,
                x: self.x,
                y: self.y,
                kind,
            }),
            (None, true) => Ok(ScriptAction::EndGame),
            (Some(_), true) => Err(ConfigError::new(format!(
                "event at {} ms has both a kind and end_game",
                self.at_ms
            ))),
            (None, false) => Err(ConfigError::new(format!(
                "event at {} ms needs a kind or end_game",
                self.at_ms
            ))),
        }
    }

    /// Offset as a duration, scaled down by `speed`.
    pub fn offset(&self, speed: f64) -> Duration {
        Duration::from_micros((self.at_ms as f64 * 1000.0 / speed).round() as u64)
    }
}

/// A scripted session: optional overrides of the configured session plus events.
#[derive(Debug, Clone, Default, PartialEq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct Script {
    /// Mini-game identifier.
    game_id: Option<String>,
    /// Timeline tag.
    timeline: Option<Timeline>,
    /// Difficulty.
    difficulty: Option<Difficulty>,
    /// Session length in seconds.
    duration: Option<f64>,
    /// Playback acceleration; 1.0 is real time.
    speed: Option<f64>,
    /// Timed events, played in `at_ms` order.
    events: Vec<ScriptEvent>,
}

impl Script {
    /// Loads a script from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading script");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read script: {}", e)))?;
        let script = Self::from_toml(&content)?;
        info!(events = script.events.len(), "Script loaded");
        Ok(script)
    }

    /// Parses, validates and orders a script.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut script: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse script: {}", e)))?;
        for event in &script.events {
            event.action()?;
        }
        if let Some(speed) = script.speed
            && !(speed.is_finite() && speed > 0.0)
        {
            return Err(ConfigError::new(format!("speed must be positive, got {}", speed)));
        }
        script.events.sort_by_key(|e| e.at_ms);
        Ok(script)
    }

    /// Script over explicit events, e.g. built in code.
    pub fn with_events(events: Vec<ScriptEvent>) -> Self {
        let mut script = Self {
            events,
            ..Self::default()
        };
        script.events.sort_by_key(|e| e.at_ms);
        script
    }

    /// Replaces the playback speed.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Replaces the session duration.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration = Some(secs);
        self
    }

    /// Playback speed, 1.0 when unset.
    pub fn effective_speed(&self) -> f64 {
        self.speed.unwrap_or(1.0)
    }

    /// Session parameters: script overrides on top of the configured defaults.
    ///
    /// A script that picks a difficulty but no duration gets that difficulty's suggestion.
    pub fn session_config(&self, defaults: &TrialsConfig) -> SessionConfig {
        let section = defaults.session();
        let timeline = self.timeline.unwrap_or(*section.timeline());
        let difficulty = self.difficulty.unwrap_or(*section.difficulty());
        let duration = match (self.duration, self.difficulty) {
            (Some(secs), _) => SessionDuration::from_secs_f64(secs),
            (None, Some(difficulty)) => {
                SessionDuration::from_secs(difficulty.suggested_duration() as i64)
            }
            (None, None) => section.effective_duration(),
        };
        let game_id = self.game_id.as_deref().unwrap_or(section.game_id().as_str());
        SessionConfig::for_game(timeline, game_id)
            .with_duration(duration)
            .with_difficulty(difficulty)
    }
}
