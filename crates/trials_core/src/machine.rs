//! Session state machine: lifecycle, deferred terminal transitions, exactly-once termination.
//!
//! `instructions → playing → won | gameover`, re-entrant into `playing` through
//! [`SessionMachine::start_game`].
//!
//! Terminal transitions are two-step. Handlers only *request* one (the countdown
//! reaching zero, the last life lost, a forced win); the driver commits it with
//! [`SessionMachine::settle`] at the end of the update batch. Within a batch a
//! life-loss request replaces a clock-expiry request, every other request keeps
//! the first arrival. Once committed, nothing but `start_game` changes the session.

use std::time::{Duration, Instant};

use derive_getters::Getters;
use tracing::{debug, info, instrument, trace};

use crate::clock::ClockConfig;
use crate::effects::ParticleField;
use crate::invariants::assert_invariants;
use crate::outcome::{Completion, Defeat, SessionSnapshot, TerminalOutcome};
use crate::rewards::{FinalTally, RewardTable, calculate_rewards};
use crate::scoring::{ScoreResult, calculate_score, mistake};
use crate::session::{Session, SessionConfig};
use crate::types::{Combo, PointKind, Status};

/// Why a session is ending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminalCause {
    /// Countdown reached zero with lives left.
    ClockExpired,
    /// The content layer called `end_game`.
    Forced,
    /// The mistake handler took the last life.
    LivesExhausted,
}

/// Why a capability call or timer tick changed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    /// Not in `playing`.
    NotPlaying,
    /// A game-ending transition is already pending for this batch.
    Ending,
    /// Tick from a timer armed for an earlier cycle.
    StaleTimer,
    /// Countdown already at zero.
    ClockStopped,
}

/// Result of `add_points`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointsOutcome {
    /// Event applied.
    Applied(ScoreResult),
    /// Event dropped.
    Ignored(Ignored),
}

/// Result of a timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Tick applied, timer keeps running.
    Continue,
    /// Countdown hit zero and requested a win.
    Expired,
    /// Tick dropped.
    Ignored(Ignored),
}

/// Single owner of a session's mutable state.
#[derive(Debug, Clone, Getters)]
pub struct SessionMachine {
    config: SessionConfig,
    reward_table: RewardTable,
    #[getter(skip)]
    decay_window: Duration,
    session: Session,
    /// Cycle number; bumped by every `start_game`. Zero before the first.
    epoch: u64,
    pending: Option<TerminalCause>,
    ended_by: Option<TerminalCause>,
    #[getter(skip)]
    last_perfect_at: Option<Instant>,
    effects: ParticleField,
}

impl SessionMachine {
    /// Machine on the instructions screen.
    #[instrument(skip(config), fields(game_id = %config.game_id(), timeline = %config.timeline()))]
    pub fn new(config: SessionConfig) -> Self {
        info!(duration = config.duration().secs(), difficulty = %config.difficulty(), "Creating session");
        Self {
            session: Session::idle(*config.duration()),
            config,
            reward_table: RewardTable::default(),
            decay_window: ClockConfig::default().decay_window,
            epoch: 0,
            pending: None,
            ended_by: None,
            last_perfect_at: None,
            effects: ParticleField::new(),
        }
    }

    /// Replaces the timeline resource divisors.
    pub fn with_reward_table(mut self, table: RewardTable) -> Self {
        self.reward_table = table;
        self
    }

    /// Uses the decay window of `clock`.
    pub fn with_clock(mut self, clock: &ClockConfig) -> Self {
        self.decay_window = clock.decay_window;
        self
    }

    /// Whether `add_points` / `end_game` are currently accepted.
    pub fn accepts_input(&self) -> bool {
        self.session.status == Status::Playing
            && !matches!(
                self.pending,
                Some(TerminalCause::Forced | TerminalCause::LivesExhausted)
            )
    }

    /// `status == playing`.
    pub fn is_game_started(&self) -> bool {
        self.session.status == Status::Playing
    }

    /// Whether the timers of the current cycle should be running.
    pub fn clock_running(&self) -> bool {
        self.session.status == Status::Playing
    }

    /// Resets every field and enters `playing`. Returns the new cycle number.
    #[instrument(skip(self, now), fields(game_id = %self.config.game_id()))]
    pub fn start_game(&mut self, now: Instant) -> u64 {
        let previous = self.session.status;
        self.epoch += 1;
        self.session = Session::started(*self.config.duration());
        self.pending = None;
        self.ended_by = None;
        self.last_perfect_at = Some(now);
        self.effects.clear();

        info!(cycle = self.epoch, from = %previous, "Session started");
        assert_invariants(self);
        self.epoch
    }

    /// Applies one play event. `x`/`y` only position the cosmetic particle.
    #[instrument(skip(self, now), fields(cycle = self.epoch))]
    pub fn add_points(
        &mut self,
        base_points: i64,
        x: f32,
        y: f32,
        kind: PointKind,
        now: Instant,
    ) -> PointsOutcome {
        if let Some(reason) = self.input_blocker() {
            debug!(?reason, "add_points ignored");
            return PointsOutcome::Ignored(reason);
        }

        let result = match kind {
            PointKind::Critical => self.handle_mistake(),
            _ => calculate_score(kind, base_points, self.session.combo),
        };
        self.apply(kind, &result, now);
        self.effects.spawn(x, y, kind, result.delta);

        debug!(
            delta = result.delta,
            score = self.session.score,
            combo = %self.session.combo,
            lives = self.session.lives,
            "Points applied"
        );
        assert_invariants(self);
        PointsOutcome::Applied(result)
    }

    /// Forces a win at the end of the current batch.
    #[instrument(skip(self), fields(cycle = self.epoch))]
    pub fn end_game(&mut self) -> Result<(), Ignored> {
        if let Some(reason) = self.input_blocker() {
            debug!(?reason, "end_game ignored");
            return Err(reason);
        }
        self.request_terminal(TerminalCause::Forced);
        Ok(())
    }

    /// One countdown period elapsed.
    #[instrument(skip(self), fields(cycle = self.epoch))]
    pub fn countdown_tick(&mut self, epoch: u64) -> TickOutcome {
        if let Some(reason) = self.tick_blocker(epoch) {
            trace!(?reason, "Countdown tick ignored");
            return TickOutcome::Ignored(reason);
        }
        if !self.accepts_input() {
            return TickOutcome::Ignored(Ignored::Ending);
        }
        if self.session.time_left == 0 || self.pending.is_some() {
            return TickOutcome::Ignored(Ignored::ClockStopped);
        }

        self.session.time_left -= 1;
        trace!(time_left = self.session.time_left, "Countdown");
        assert_invariants(self);

        if self.session.time_left == 0 && self.session.lives > 0 {
            self.request_terminal(TerminalCause::ClockExpired);
            return TickOutcome::Expired;
        }
        TickOutcome::Continue
    }

    /// Watchdog check: resets the combo after the decay window without a perfect.
    #[instrument(skip(self, now), fields(cycle = self.epoch))]
    pub fn decay_tick(&mut self, epoch: u64, now: Instant) -> TickOutcome {
        if let Some(reason) = self.tick_blocker(epoch) {
            trace!(?reason, "Decay tick ignored");
            return TickOutcome::Ignored(reason);
        }
        let idle = self
            .last_perfect_at
            .map(|at| now.saturating_duration_since(at))
            .unwrap_or_default();
        if idle > self.decay_window && self.session.combo != Combo::ONE {
            debug!(idle_ms = idle.as_millis() as u64, from = %self.session.combo, "Combo decayed");
            self.session.combo = Combo::ONE;
            assert_invariants(self);
        }
        TickOutcome::Continue
    }

    /// Advances cosmetic particles by `dt`.
    pub fn effects_tick(&mut self, epoch: u64, dt: Duration) -> TickOutcome {
        if let Some(reason) = self.tick_blocker(epoch) {
            return TickOutcome::Ignored(reason);
        }
        self.effects.step(dt);
        TickOutcome::Continue
    }

    /// Commits the pending terminal transition, if any. Called once per update batch.
    ///
    /// Returns the outcome exactly once per cycle.
    #[instrument(skip(self), fields(cycle = self.epoch))]
    pub fn settle(&mut self) -> Option<TerminalOutcome> {
        let cause = self.pending.take()?;
        if self.ended_by.is_some() || self.session.status != Status::Playing {
            debug!(?cause, "Terminal request dropped, cycle already ended");
            return None;
        }

        let tally = FinalTally {
            score: self.session.score,
            time_left: self.session.time_left,
            lives: self.session.lives,
            stats: self.session.stats,
        };
        self.ended_by = Some(cause);
        self.effects.clear();

        let outcome = match cause {
            TerminalCause::LivesExhausted => {
                self.session.status = Status::GameOver;
                info!(score = tally.score, "Session lost");
                TerminalOutcome::GameOver(Defeat {
                    cycle: self.epoch,
                    timeline: *self.config.timeline(),
                    game_id: self.config.game_id().clone(),
                    score: tally.score,
                    tally,
                    best_streak: self.session.best_streak,
                })
            }
            TerminalCause::ClockExpired | TerminalCause::Forced => {
                self.session.status = Status::Won;
                let rewards =
                    calculate_rewards(&tally, *self.config.timeline(), &self.reward_table);
                info!(
                    score = tally.score,
                    credits = rewards.credits(),
                    forced = cause == TerminalCause::Forced,
                    "Session won"
                );
                TerminalOutcome::Won(Completion {
                    cycle: self.epoch,
                    timeline: *self.config.timeline(),
                    game_id: self.config.game_id().clone(),
                    score: tally.score,
                    rewards,
                    tally,
                    duration: *self.config.duration(),
                    best_streak: self.session.best_streak,
                    forced: cause == TerminalCause::Forced,
                })
            }
        };

        assert_invariants(self);
        Some(outcome)
    }

    /// Read-only view of the current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            cycle: self.epoch,
            status: self.session.status,
            score: self.session.score,
            time_left: self.session.time_left,
            lives: self.session.lives,
            combo: self.session.combo.as_f64(),
            stats: self.session.stats,
            streak: self.session.streak,
            best_streak: self.session.best_streak,
            particles: self.effects.len(),
        }
    }

    fn input_blocker(&self) -> Option<Ignored> {
        if self.session.status != Status::Playing {
            Some(Ignored::NotPlaying)
        } else if !self.accepts_input() {
            Some(Ignored::Ending)
        } else {
            None
        }
    }

    fn tick_blocker(&self, epoch: u64) -> Option<Ignored> {
        if epoch != self.epoch {
            Some(Ignored::StaleTimer)
        } else if self.session.status != Status::Playing {
            Some(Ignored::NotPlaying)
        } else {
            None
        }
    }

    /// Mistake handler: one life, combo reset, gameover requested at zero lives.
    fn handle_mistake(&mut self) -> ScoreResult {
        let result = mistake();
        let lives_after = self.session.lives.saturating_sub(result.lives_lost);
        if lives_after == 0 {
            self.request_terminal(TerminalCause::LivesExhausted);
        }
        result
    }

    fn apply(&mut self, kind: PointKind, result: &ScoreResult, now: Instant) {
        let session = &mut self.session;
        session.apply_score_delta(result.delta);
        session.combo = result.combo;
        session.lives = session.lives.saturating_sub(result.lives_lost);

        let stats = &mut session.stats;
        stats.total_actions += 1;
        if result.perfect {
            stats.perfect_actions += 1;
        }
        if result.mistake {
            stats.mistakes += 1;
        }
        stats.max_combo = Some(stats.max_combo.map_or(session.combo, |m| m.max(session.combo)));

        if kind == PointKind::Perfect {
            session.streak += 1;
            session.best_streak = session.best_streak.max(session.streak);
            self.last_perfect_at = Some(now);
        } else if result.breaks_streak {
            session.streak = 0;
        }
    }

    fn request_terminal(&mut self, cause: TerminalCause) {
        match self.pending {
            None => {
                debug!(?cause, "Terminal transition requested");
                self.pending = Some(cause);
            }
            Some(TerminalCause::ClockExpired) if cause == TerminalCause::LivesExhausted => {
                debug!("Life loss overrides clock expiry in the same batch");
                self.pending = Some(cause);
            }
            Some(existing) => {
                debug!(?existing, ?cause, "Terminal transition already pending");
            }
        }
    }
}
