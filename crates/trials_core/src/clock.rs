//! Clock subsystem parameters shared by every session driver.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timer periods and the combo-decay window.
///
/// Defaults: 1 s countdown, 1 s decay watchdog, 3 s decay window, 16 ms effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Countdown period; one second of `time_left` per period.
    pub countdown_period: Duration,
    /// How often the decay watchdog looks at the last perfect event.
    pub decay_period: Duration,
    /// Time without a perfect after which the combo resets.
    pub decay_window: Duration,
    /// Cosmetic effects ticker period.
    pub effects_period: Duration,
}

impl ClockConfig {
    /// Divides every period by `speed` for accelerated playback.
    ///
    /// Speeds of zero or below, or non-finite, leave the config unchanged. A
    /// period that no longer fits a `Duration` keeps its unscaled value.
    pub fn accelerated(self, speed: f64) -> Self {
        if !speed.is_finite() || speed <= 0.0 {
            return self;
        }
        let scale = |d: Duration| Duration::try_from_secs_f64(d.as_secs_f64() / speed).unwrap_or(d);
        Self {
            countdown_period: scale(self.countdown_period),
            decay_period: scale(self.decay_period),
            decay_window: scale(self.decay_window),
            effects_period: scale(self.effects_period),
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            countdown_period: Duration::from_secs(1),
            decay_period: Duration::from_secs(1),
            decay_window: Duration::from_secs(3),
            effects_period: Duration::from_millis(16),
        }
    }
}

/// The three repeating timers of a playing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// 1 Hz `time_left` countdown.
    Countdown,
    /// 1 Hz combo-decay watchdog.
    ComboDecay,
    /// ~60 Hz cosmetic particle ticker.
    Effects,
}

impl TimerKind {
    /// All timers, in the order they are armed.
    pub const ALL: [TimerKind; 3] = [TimerKind::Countdown, TimerKind::ComboDecay, TimerKind::Effects];

    /// Period of this timer under `config`.
    pub fn period(self, config: &ClockConfig) -> Duration {
        match self {
            TimerKind::Countdown => config.countdown_period,
            TimerKind::ComboDecay => config.decay_period,
            TimerKind::Effects => config.effects_period,
        }
    }
}
