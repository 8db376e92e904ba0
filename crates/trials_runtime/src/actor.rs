//! Session actor: the single owner of a live session.
//!
//! Capability calls and timer ticks arrive as commands on one channel. The
//! actor drains whatever is queued into one update batch, applies it in
//! arrival order, then commits at most one terminal transition and publishes
//! a fresh snapshot.

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, trace};
use trials_core::{
    ClockConfig, PointKind, SessionMachine, SessionSnapshot, TerminalOutcome, TimerKind,
};

use crate::clock::TimerSet;
use crate::outcome::{CompletionSink, CycleTracker};

/// Everything the actor reacts to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Command {
    AddPoints {
        base_points: i64,
        x: f32,
        y: f32,
        kind: PointKind,
    },
    EndGame,
    StartGame,
    Tick {
        epoch: u64,
        timer: TimerKind,
    },
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

pub(crate) struct SessionActor {
    machine: SessionMachine,
    clock: ClockConfig,
    commands: mpsc::UnboundedReceiver<Command>,
    timer_tx: mpsc::WeakUnboundedSender<Command>,
    timers: TimerSet,
    cycles: CycleTracker,
    sinks: Vec<Box<dyn CompletionSink>>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl SessionActor {
    pub(crate) fn new(
        machine: SessionMachine,
        clock: ClockConfig,
        commands: mpsc::UnboundedReceiver<Command>,
        timer_tx: mpsc::WeakUnboundedSender<Command>,
        cycles: CycleTracker,
        sinks: Vec<Box<dyn CompletionSink>>,
        snapshots: watch::Sender<SessionSnapshot>,
    ) -> Self {
        Self {
            machine,
            clock,
            commands,
            timer_tx,
            timers: TimerSet::default(),
            cycles,
            sinks,
            snapshots,
        }
    }

    /// Runs until shutdown or until every handle is dropped.
    #[instrument(skip(self), fields(game_id = %self.machine.config().game_id()))]
    pub(crate) async fn run(mut self) {
        info!("Session actor running");
        let mut batch = Vec::new();
        while let Some(first) = self.commands.recv().await {
            batch.push(first);
            while let Ok(next) = self.commands.try_recv() {
                batch.push(next);
            }
            trace!(commands = batch.len(), "Update batch");

            let mut flow = Flow::Continue;
            for command in batch.drain(..) {
                flow = self.handle(command);
                if flow == Flow::Stop {
                    break;
                }
            }
            if flow == Flow::Stop {
                break;
            }
            self.settle();
            self.publish();
        }
        self.teardown();
    }

    fn handle(&mut self, command: Command) -> Flow {
        let now = now();
        match command {
            Command::AddPoints {
                base_points,
                x,
                y,
                kind,
            } => {
                self.machine.add_points(base_points, x, y, kind, now);
            }
            Command::EndGame => {
                let _ = self.machine.end_game();
            }
            Command::StartGame => self.start(now),
            Command::Tick { epoch, timer } => {
                let effects_dt = self.clock.effects_period;
                match timer {
                    TimerKind::Countdown => self.machine.countdown_tick(epoch),
                    TimerKind::ComboDecay => self.machine.decay_tick(epoch, now),
                    TimerKind::Effects => self.machine.effects_tick(epoch, effects_dt),
                };
            }
            Command::Shutdown => {
                debug!("Shutdown requested");
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    /// Starting ends the turn so far: a transition requested earlier in the batch commits first.
    fn start(&mut self, now: std::time::Instant) {
        self.settle();
        let cycle = self.machine.start_game(now);
        self.cycles.begin(cycle);
        match self.timer_tx.upgrade() {
            Some(commands) => self.timers.arm(cycle, &self.clock, &commands),
            None => debug!("No command senders left, timers not armed"),
        }
    }

    fn settle(&mut self) {
        let Some(outcome) = self.machine.settle() else {
            return;
        };
        self.timers.cancel();
        // Hosts woken by the outcome must already see the terminal snapshot.
        self.publish();
        if !self.cycles.finish(&outcome) {
            return;
        }
        if let TerminalOutcome::Won(completion) = &outcome {
            for sink in &mut self.sinks {
                sink.on_complete(completion);
            }
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.machine.snapshot());
    }

    fn teardown(&mut self) {
        self.timers.cancel();
        info!(cycle = self.machine.epoch(), "Session actor stopped");
    }
}

/// Wall-clock instant, following tokio's clock so paused-time tests can steer it.
fn now() -> std::time::Instant {
    tokio::time::Instant::now().into_std()
}
