//! Deterministic session driver on a virtual clock.
//!
//! Nothing runs on its own: time moves only through [`ManualSession::advance`],
//! and every capability call is its own turn unless grouped with
//! [`ManualSession::in_one_turn`]. Useful for content tests and for hosts
//! that own their frame loop.

use std::cell::RefCell;
use std::time::{Duration, Instant};

use tracing::{debug, instrument, trace};
use trials_core::{
    ClockConfig, PointKind, SessionMachine, SessionSnapshot, TerminalOutcome, TimerKind,
};

use crate::capability::Capabilities;
use crate::clock::effective_period;
use crate::outcome::CompletionSink;

/// Next due time of each timer of the running cycle, as offsets from the origin.
#[derive(Debug, Clone, Copy)]
struct ArmedTimers {
    epoch: u64,
    due: [Duration; 3],
}

struct ManualState {
    machine: SessionMachine,
    clock: ClockConfig,
    origin: Instant,
    elapsed: Duration,
    timers: Option<ArmedTimers>,
    turn_depth: u32,
    closed: bool,
    sinks: Vec<Box<dyn CompletionSink>>,
    outcomes: Vec<TerminalOutcome>,
}

impl ManualState {
    fn now(&self) -> Instant {
        self.origin + self.elapsed
    }

    fn end_turn(&mut self) {
        if self.turn_depth > 0 {
            return;
        }
        let Some(outcome) = self.machine.settle() else {
            return;
        };
        self.timers = None;
        if let TerminalOutcome::Won(completion) = &outcome {
            for sink in &mut self.sinks {
                sink.on_complete(completion);
            }
        }
        self.outcomes.push(outcome);
    }

    fn start(&mut self) {
        // A transition requested earlier in this turn commits first.
        let depth = std::mem::take(&mut self.turn_depth);
        self.end_turn();
        self.turn_depth = depth;

        let now = self.now();
        let epoch = self.machine.start_game(now);
        let mut due = [Duration::ZERO; 3];
        for (slot, timer) in due.iter_mut().zip(TimerKind::ALL) {
            *slot = self.elapsed + effective_period(timer, &self.clock);
        }
        self.timers = Some(ArmedTimers { epoch, due });
    }

    /// Earliest timer due at or before `until`.
    fn next_due(&self, until: Duration) -> Option<(usize, Duration)> {
        let armed = self.timers?;
        armed
            .due
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, at)| *at <= until)
            .min_by_key(|(_, at)| *at)
    }

    fn fire(&mut self, index: usize, at: Duration) {
        let Some(armed) = self.timers.as_mut() else {
            return;
        };
        let timer = TimerKind::ALL[index];
        let epoch = armed.epoch;
        armed.due[index] = at + effective_period(timer, &self.clock);
        self.elapsed = at;

        let now = self.now();
        let outcome = match timer {
            TimerKind::Countdown => self.machine.countdown_tick(epoch),
            TimerKind::ComboDecay => self.machine.decay_tick(epoch, now),
            TimerKind::Effects => self.machine.effects_tick(epoch, self.clock.effects_period),
        };
        trace!(?timer, ?outcome, "Manual tick");
        self.end_turn();
    }
}

/// Session driven by the caller instead of an actor.
pub struct ManualSession {
    state: RefCell<ManualState>,
}

impl ManualSession {
    pub(crate) fn new(
        machine: SessionMachine,
        clock: ClockConfig,
        sinks: Vec<Box<dyn CompletionSink>>,
    ) -> Self {
        Self {
            state: RefCell::new(ManualState {
                machine,
                clock,
                origin: Instant::now(),
                elapsed: Duration::ZERO,
                timers: None,
                turn_depth: 0,
                closed: false,
                sinks,
                outcomes: Vec::new(),
            }),
        }
    }

    /// Moves the virtual clock forward, firing due timers in deadline order.
    ///
    /// Outside [`Self::in_one_turn`] every tick is its own turn.
    #[instrument(skip(self))]
    pub fn advance(&self, dt: Duration) {
        let mut state = self.state.borrow_mut();
        let until = state.elapsed + dt;
        while let Some((index, at)) = state.next_due(until) {
            state.fire(index, at);
        }
        state.elapsed = until;
    }

    /// Runs `f` as a single turn: terminal transitions commit once, after it returns.
    pub fn in_one_turn<R>(&self, f: impl FnOnce(&Self) -> R) -> R {
        self.state.borrow_mut().turn_depth += 1;
        let result = f(self);
        let mut state = self.state.borrow_mut();
        state.turn_depth -= 1;
        state.end_turn();
        result
    }

    /// Current snapshot. Never stale.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().machine.snapshot()
    }

    /// Virtual time since construction.
    pub fn elapsed(&self) -> Duration {
        self.state.borrow().elapsed
    }

    /// Whether the timers of a cycle are armed.
    pub fn timers_armed(&self) -> bool {
        self.state.borrow().timers.is_some()
    }

    /// Drains the terminal outcomes committed so far, oldest first.
    pub fn take_outcomes(&self) -> Vec<TerminalOutcome> {
        std::mem::take(&mut self.state.borrow_mut().outcomes)
    }

    /// Teardown (`onClose`): disarms timers and makes every later capability call inert.
    pub fn close(&self) {
        let mut state = self.state.borrow_mut();
        state.timers = None;
        state.closed = true;
        debug!("Manual session closed");
    }
}

impl Capabilities for ManualSession {
    fn add_points(&self, base_points: i64, x: f32, y: f32, kind: PointKind) {
        let mut state = self.state.borrow_mut();
        if state.closed {
            return;
        }
        let now = state.now();
        state.machine.add_points(base_points, x, y, kind, now);
        state.end_turn();
    }

    fn end_game(&self) {
        let mut state = self.state.borrow_mut();
        if state.closed {
            return;
        }
        let _ = state.machine.end_game();
        state.end_turn();
    }

    fn start_game(&self) {
        let mut state = self.state.borrow_mut();
        if !state.closed {
            state.start();
        }
    }

    fn is_game_started(&self) -> bool {
        let state = self.state.borrow();
        !state.closed && state.machine.is_game_started()
    }
}
