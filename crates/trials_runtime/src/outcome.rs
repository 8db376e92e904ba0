//! Outward reporting: one-shot cycle outcomes and completion sinks.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument, warn};
use trials_core::{Completion, ProgressLedger, ScoreSubmission, TerminalOutcome};

/// How a session cycle ended, from the host's side.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The cycle reached `won` or `gameover`.
    Finished(TerminalOutcome),
    /// Restarted or torn down before a terminal transition.
    Abandoned,
}

impl CycleOutcome {
    /// The terminal outcome, if the cycle finished.
    pub fn finished(self) -> Option<TerminalOutcome> {
        match self {
            CycleOutcome::Finished(outcome) => Some(outcome),
            CycleOutcome::Abandoned => None,
        }
    }
}

/// One `start_game` cycle, announced to the host as it begins.
///
/// The outcome arrives through a one-shot channel, so it is delivered at most once.
#[derive(Debug)]
pub struct Cycle {
    number: u64,
    outcome: oneshot::Receiver<TerminalOutcome>,
}

impl Cycle {
    /// Cycle number, starting at 1.
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Waits for the cycle to end.
    #[instrument(skip(self), fields(cycle = self.number))]
    pub async fn outcome(self) -> CycleOutcome {
        match self.outcome.await {
            Ok(outcome) => CycleOutcome::Finished(outcome),
            Err(_) => {
                debug!("Cycle abandoned");
                CycleOutcome::Abandoned
            }
        }
    }
}

/// Issues one outcome channel per cycle and fires it at most once.
#[derive(Debug)]
pub(crate) struct CycleTracker {
    current: Option<(u64, oneshot::Sender<TerminalOutcome>)>,
    announce: mpsc::UnboundedSender<Cycle>,
}

impl CycleTracker {
    pub(crate) fn new(announce: mpsc::UnboundedSender<Cycle>) -> Self {
        Self {
            current: None,
            announce,
        }
    }

    /// Opens a new cycle. An unfinished previous cycle is abandoned.
    #[instrument(skip(self))]
    pub(crate) fn begin(&mut self, number: u64) {
        if let Some((previous, _)) = self.current.take() {
            debug!(previous, "Abandoning unfinished cycle");
        }
        let (tx, rx) = oneshot::channel();
        self.current = Some((number, tx));
        if self.announce.send(Cycle { number, outcome: rx }).is_err() {
            debug!("No host listening for cycle announcements");
        }
    }

    /// Delivers the outcome of the current cycle. Returns false if it was already delivered.
    #[instrument(skip(self, outcome), fields(cycle = outcome.cycle()))]
    pub(crate) fn finish(&mut self, outcome: &TerminalOutcome) -> bool {
        match self.current.take() {
            Some((number, tx)) if number == outcome.cycle() => {
                if tx.send(outcome.clone()).is_err() {
                    debug!("Nobody awaited the cycle outcome");
                }
                true
            }
            other => {
                warn!("Outcome for a cycle that is not open");
                self.current = other;
                false
            }
        }
    }
}

/// Consumer of won cycles: the `onComplete` side of the engine.
///
/// Sinks run after the reward calculation, in registration order. They cannot
/// fail back into the engine.
pub trait CompletionSink: Send + 'static {
    /// Called exactly once per won cycle.
    fn on_complete(&mut self, completion: &Completion);
}

impl CompletionSink for ProgressLedger {
    fn on_complete(&mut self, completion: &Completion) {
        self.merge(completion);
    }
}

impl CompletionSink for Arc<Mutex<ProgressLedger>> {
    fn on_complete(&mut self, completion: &Completion) {
        match self.lock() {
            Ok(mut ledger) => {
                ledger.merge(completion);
            }
            Err(_) => warn!("Progress ledger lock poisoned, completion dropped"),
        }
    }
}

/// Forwards a [`ScoreSubmission`] per win, stamped with the commit time.
impl CompletionSink for mpsc::UnboundedSender<ScoreSubmission> {
    fn on_complete(&mut self, completion: &Completion) {
        if self.send(completion.submission(Utc::now())).is_err() {
            debug!("Score submission receiver gone");
        }
    }
}

/// Adapts a closure into a [`CompletionSink`].
pub struct FnSink<F>(pub F);

impl<F> CompletionSink for FnSink<F>
where
    F: FnMut(&Completion) + Send + 'static,
{
    fn on_complete(&mut self, completion: &Completion) {
        (self.0)(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use trials_core::{PointKind, SessionConfig, SessionMachine, Timeline};

    fn won(cycles: u64) -> TerminalOutcome {
        let mut machine = SessionMachine::new(SessionConfig::for_game(Timeline::Present, "grid"));
        let mut outcome = None;
        for _ in 0..cycles {
            machine.start_game(Instant::now());
            machine.add_points(40, 0.0, 0.0, PointKind::Good, Instant::now());
            machine.end_game().expect("playing");
            outcome = machine.settle();
        }
        outcome.expect("won")
    }

    #[tokio::test]
    async fn test_outcome_delivered_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tracker = CycleTracker::new(tx);
        tracker.begin(1);
        let outcome = won(1);
        assert!(tracker.finish(&outcome));
        assert!(!tracker.finish(&outcome));

        let cycle = rx.recv().await.expect("announced");
        assert_eq!(cycle.number(), 1);
        assert_eq!(cycle.outcome().await, CycleOutcome::Finished(outcome));
    }

    #[tokio::test]
    async fn test_restart_abandons_cycle() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tracker = CycleTracker::new(tx);
        tracker.begin(1);
        tracker.begin(2);
        let first = rx.recv().await.expect("announced");
        assert_eq!(first.outcome().await, CycleOutcome::Abandoned);

        // An outcome stamped with a stale cycle is refused.
        assert!(!tracker.finish(&won(1)));
        assert!(tracker.finish(&won(2)));
    }

    #[test]
    fn test_fn_sink_and_submission_sink() {
        let outcome = won(1);
        let completion = outcome.completion().expect("won");

        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        FnSink(move |c: &Completion| recorder.lock().unwrap().push(*c.score()))
            .on_complete(completion);
        assert_eq!(*seen.lock().unwrap(), vec![40]);

        let (mut sink, mut rx) = mpsc::unbounded_channel::<ScoreSubmission>();
        sink.on_complete(completion);
        let submission = rx.try_recv().expect("submitted");
        assert_eq!(submission.game_id, "grid");
        assert_eq!(submission.score, 40);
        assert_eq!(submission.duration, 30);
    }
}
