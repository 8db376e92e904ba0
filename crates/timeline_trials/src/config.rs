//! Engine configuration loaded from TOML and the environment.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use trials_core::{
    ClockConfig, Difficulty, RewardTable, SessionConfig, SessionDuration, Timeline,
};

/// Config file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "timeline_trials.toml";

/// Overrides the session duration.
pub const ENV_DURATION: &str = "TRIALS_DURATION";
/// Overrides the difficulty.
pub const ENV_DIFFICULTY: &str = "TRIALS_DIFFICULTY";
/// Overrides the timeline.
pub const ENV_TIMELINE: &str = "TRIALS_TIMELINE";

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// `[session]` defaults applied to every played session.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// Default mini-game identifier.
    game_id: String,
    /// Timeline tag.
    timeline: Timeline,
    /// Difficulty; also picks the duration when none is set.
    difficulty: Difficulty,
    /// Session length in seconds. Invalid values fall back to 30.
    duration: Option<f64>,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            game_id: "trial".to_string(),
            timeline: Timeline::default(),
            difficulty: Difficulty::default(),
            duration: None,
        }
    }
}

impl SessionSection {
    /// Effective duration: the configured one, else the difficulty's suggestion.
    pub fn effective_duration(&self) -> SessionDuration {
        match self.duration {
            Some(secs) => SessionDuration::from_secs_f64(secs),
            None => SessionDuration::from_secs(self.difficulty.suggested_duration() as i64),
        }
    }
}

/// `[clock]` timer periods in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockSection {
    /// Countdown period.
    countdown_period_ms: u64,
    /// Combo-decay watchdog period.
    decay_period_ms: u64,
    /// Time without a perfect before the combo resets.
    decay_window_ms: u64,
    /// Cosmetic effects period.
    effects_period_ms: u64,
}

impl Default for ClockSection {
    fn default() -> Self {
        Self {
            countdown_period_ms: 1000,
            decay_period_ms: 1000,
            decay_window_ms: 3000,
            effects_period_ms: 16,
        }
    }
}

impl ClockSection {
    /// Converts to engine clock parameters.
    pub fn to_clock(&self) -> ClockConfig {
        ClockConfig {
            countdown_period: Duration::from_millis(self.countdown_period_ms),
            decay_period: Duration::from_millis(self.decay_period_ms),
            decay_window: Duration::from_millis(self.decay_window_ms),
            effects_period: Duration::from_millis(self.effects_period_ms),
        }
    }
}

/// Whole engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct TrialsConfig {
    /// Session defaults.
    session: SessionSection,
    /// Timer periods.
    clock: ClockSection,
    /// Timeline resource divisors.
    rewards: RewardTable,
}

impl TrialsConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;
        info!(game_id = %config.session.game_id, "Config loaded successfully");
        Ok(config)
    }

    /// Parses and validates TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path`, or the default file if present, or built-in defaults.
    ///
    /// An explicit path that cannot be read is an error; a missing default file is not.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => {
                debug!("No config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Applies `TRIALS_*` overrides read through `lookup`.
    ///
    /// A malformed duration falls back to the default; a malformed timeline or
    /// difficulty is an error.
    #[instrument(skip(self, lookup))]
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(raw) = lookup(ENV_DURATION) {
            let duration = SessionDuration::parse(&raw);
            debug!(raw, secs = duration.secs(), "Duration from environment");
            self.session.duration = Some(duration.secs() as f64);
        }
        if let Some(raw) = lookup(ENV_DIFFICULTY) {
            self.session.difficulty = Difficulty::from_str(raw.trim()).map_err(|_| {
                ConfigError::new(format!("{} is not a difficulty: {}", ENV_DIFFICULTY, raw))
            })?;
        }
        if let Some(raw) = lookup(ENV_TIMELINE) {
            self.session.timeline = Timeline::from_str(raw.trim()).map_err(|_| {
                ConfigError::new(format!("{} is not a timeline: {}", ENV_TIMELINE, raw))
            })?;
        }
        Ok(())
    }

    /// Checks the values the engine cannot default on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let clock = &self.clock;
        let periods = [
            ("countdown_period_ms", clock.countdown_period_ms),
            ("decay_period_ms", clock.decay_period_ms),
            ("decay_window_ms", clock.decay_window_ms),
            ("effects_period_ms", clock.effects_period_ms),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, ms)| *ms == 0) {
            return Err(ConfigError::new(format!("clock.{} must be positive", name)));
        }
        if self.session.game_id.trim().is_empty() {
            return Err(ConfigError::new("session.game_id must not be empty"));
        }
        Ok(())
    }

    /// Session parameters for `game_id`, or the configured default game.
    pub fn session_config(&self, game_id: Option<&str>) -> SessionConfig {
        let game_id = game_id.unwrap_or(self.session.game_id.as_str());
        SessionConfig::for_game(self.session.timeline, game_id)
            .with_duration(self.session.effective_duration())
            .with_difficulty(self.session.difficulty)
    }

    /// Engine clock parameters.
    pub fn clock_config(&self) -> ClockConfig {
        self.clock.to_clock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = TrialsConfig::default();
        assert_eq!(config.session().effective_duration().secs(), 30);
        assert_eq!(config.clock_config(), ClockConfig::default());
        assert_eq!(*config.rewards(), RewardTable::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = TrialsConfig::from_toml(
            r#"
            [session]
            timeline = "future"
            difficulty = "hard"

            [rewards.future]
            score = 100
            perfect = 2
            "#,
        )
        .unwrap();
        assert_eq!(*config.session().timeline(), Timeline::Future);
        assert_eq!(config.session().effective_duration().secs(), 20);
        assert_eq!(config.rewards().future().score, 100);
        assert_eq!(config.rewards().past().score, 200);
    }

    #[test]
    fn test_zero_period_rejected() {
        let err = TrialsConfig::from_toml("[clock]\neffects_period_ms = 0\n").unwrap_err();
        assert!(err.message.contains("effects_period_ms"));
    }

    #[test]
    fn test_invalid_duration_defaults() {
        let config = TrialsConfig::from_toml("[session]\nduration = -4\n").unwrap();
        assert_eq!(config.session().effective_duration().secs(), 30);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_DURATION, "12"),
            (ENV_DIFFICULTY, "EASY"),
            (ENV_TIMELINE, "past"),
        ]
        .into_iter()
        .collect();
        let mut config = TrialsConfig::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(*config.session().difficulty(), Difficulty::Easy);
        assert_eq!(*config.session().timeline(), Timeline::Past);
        assert_eq!(config.session().effective_duration().secs(), 12);
    }

    #[test]
    fn test_env_bad_duration_defaults_and_bad_timeline_fails() {
        let mut config = TrialsConfig::default();
        config
            .apply_env(|key| (key == ENV_DURATION).then(|| "soon".to_string()))
            .unwrap();
        assert_eq!(config.session().effective_duration().secs(), 30);

        let result = config.apply_env(|key| (key == ENV_TIMELINE).then(|| "later".to_string()));
        assert!(result.is_err());
    }
}
