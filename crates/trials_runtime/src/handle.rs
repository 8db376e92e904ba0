//! Host-side construction and control of a live session.

use derive_getters::Getters;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};
use trials_core::{
    ClockConfig, PointKind, RewardTable, SessionConfig, SessionMachine, SessionSnapshot,
};

use crate::actor::{Command, SessionActor};
use crate::capability::Capabilities;
use crate::error::EngineError;
use crate::manual::ManualSession;
use crate::outcome::{CompletionSink, Cycle, CycleTracker};

/// Collects everything a session needs before it goes live.
#[derive(Getters)]
pub struct SessionBuilder {
    config: SessionConfig,
    clock: ClockConfig,
    reward_table: RewardTable,
    #[getter(skip)]
    sinks: Vec<Box<dyn CompletionSink>>,
}

impl SessionBuilder {
    /// Builder with the default clock and reward table.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            clock: ClockConfig::default(),
            reward_table: RewardTable::default(),
            sinks: Vec::new(),
        }
    }

    /// Replaces the clock parameters.
    pub fn with_clock(mut self, clock: ClockConfig) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the timeline resource divisors.
    pub fn with_reward_table(mut self, table: RewardTable) -> Self {
        self.reward_table = table;
        self
    }

    /// Registers a completion sink. Sinks fire in registration order.
    pub fn sink(mut self, sink: impl CompletionSink) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    fn machine(&self) -> SessionMachine {
        SessionMachine::new(self.config.clone())
            .with_reward_table(self.reward_table)
            .with_clock(&self.clock)
    }

    /// Spawns the session actor on the current tokio runtime.
    ///
    /// The session waits on the instructions screen until `start_game`.
    #[instrument(skip(self), fields(game_id = %self.config.game_id()))]
    pub fn spawn(self) -> SessionHandle {
        let machine = self.machine();
        let (tx, rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(machine.snapshot());
        let (cycle_tx, cycle_rx) = mpsc::unbounded_channel();

        let actor = SessionActor::new(
            machine,
            self.clock,
            rx,
            tx.downgrade(),
            CycleTracker::new(cycle_tx),
            self.sinks,
            snapshot_tx,
        );
        let task = tokio::spawn(actor.run());
        info!("Session spawned");

        SessionHandle {
            caps: ChallengeCaps {
                commands: tx,
                snapshots: snapshot_rx,
            },
            cycles: cycle_rx,
            task: Some(task),
        }
    }

    /// Builds a deterministic driver on a virtual clock instead of an actor.
    pub fn manual(self) -> ManualSession {
        let machine = self.machine();
        ManualSession::new(machine, self.clock, self.sinks)
    }
}

/// Capability handle of an actor-backed session. Cheap to clone.
///
/// Commands to a torn-down session are dropped without error.
#[derive(Debug, Clone)]
pub struct ChallengeCaps {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl ChallengeCaps {
    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!(?command, "Session torn down, command dropped");
        }
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }
}

impl Capabilities for ChallengeCaps {
    fn add_points(&self, base_points: i64, x: f32, y: f32, kind: PointKind) {
        self.send(Command::AddPoints {
            base_points,
            x,
            y,
            kind,
        });
    }

    fn end_game(&self) {
        self.send(Command::EndGame);
    }

    fn start_game(&self) {
        self.send(Command::StartGame);
    }

    fn is_game_started(&self) -> bool {
        !self.commands.is_closed() && self.snapshots.borrow().is_game_started()
    }
}

/// Owner of a live session. Dropping it tears the session down.
#[derive(Debug)]
pub struct SessionHandle {
    caps: ChallengeCaps,
    cycles: mpsc::UnboundedReceiver<Cycle>,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Capability handle for the content layer.
    pub fn caps(&self) -> ChallengeCaps {
        self.caps.clone()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.caps.snapshot()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.caps.snapshots.clone()
    }

    /// Starts a cycle, failing if the actor is gone.
    pub fn start(&self) -> Result<(), EngineError> {
        self.caps
            .commands
            .send(Command::StartGame)
            .map_err(|_| EngineError::new("Session actor is not running"))
    }

    /// Next announced cycle. `None` once the session is torn down.
    pub async fn next_cycle(&mut self) -> Option<Cycle> {
        self.cycles.recv().await
    }

    /// Host teardown (`onClose`): stops the actor and cancels every timer.
    ///
    /// Capability handles still held by the content layer become inert.
    #[instrument(skip(self))]
    pub async fn close(mut self) -> Result<(), EngineError> {
        let _ = self.caps.commands.send(Command::Shutdown);
        if let Some(task) = self.task.take() {
            task.await?;
        }
        info!("Session closed");
        Ok(())
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if self.task.take().is_some() {
            let _ = self.caps.commands.send(Command::Shutdown);
        }
    }
}
