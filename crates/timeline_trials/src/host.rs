//! Headless host: plays a script against an actor-backed session.
//!
//! Plays the part of the embedding application: it owns the progress ledger
//! and the score-submission queue, wires both in as completion sinks, feeds
//! the script through the capability handle and tears the session down at
//! the end.

use std::sync::{Arc, Mutex};

use derive_getters::Getters;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{info, instrument, warn};
use trials_core::{ProgressLedger, ScoreSubmission, SessionSnapshot, TerminalOutcome};
use trials_runtime::{Capabilities, CycleOutcome, EngineError, SessionBuilder};

use crate::config::TrialsConfig;
use crate::script::{Script, ScriptAction};

/// What a played script produced.
#[derive(Debug, Clone, Serialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct PlayReport {
    /// Terminal outcome; `None` if the session was abandoned.
    outcome: Option<TerminalOutcome>,
    /// Snapshot published last before teardown.
    final_snapshot: SessionSnapshot,
    /// Progress after merging the completion, if any.
    ledger: ProgressLedger,
    /// Submissions emitted for won cycles.
    submissions: Vec<ScoreSubmission>,
}

/// Plays `script` once on a fresh session built from `config`.
///
/// Events past the end of the session are sent anyway and ignored by the engine.
#[instrument(skip(config, script), fields(events = script.events().len(), speed = script.effective_speed()))]
pub async fn play_script(config: &TrialsConfig, script: &Script) -> Result<PlayReport, EngineError> {
    let speed = script.effective_speed();
    let session = script.session_config(config);
    info!(
        game_id = %session.game_id(),
        timeline = %session.timeline(),
        duration = session.duration().secs(),
        "Playing script"
    );

    let ledger = Arc::new(Mutex::new(ProgressLedger::new()));
    let (submission_tx, mut submission_rx) = mpsc::unbounded_channel::<ScoreSubmission>();
    let mut handle = SessionBuilder::new(session)
        .with_clock(config.clock_config().accelerated(speed))
        .with_reward_table(*config.rewards())
        .sink(Arc::clone(&ledger))
        .sink(submission_tx)
        .spawn();
    let caps = handle.caps();

    handle.start()?;
    let cycle = handle
        .next_cycle()
        .await
        .ok_or_else(|| EngineError::new("Session ended before the cycle was announced"))?;
    let started = Instant::now();

    for event in script.events() {
        sleep_until(started + event.offset(speed)).await;
        match event.action() {
            Ok(ScriptAction::Points {
                base_points,
                x,
                y,
                kind,
            }) => caps.add_points(base_points, x, y, kind),
            Ok(ScriptAction::EndGame) => caps.end_game(),
            Err(e) => warn!(error = %e, "Skipping invalid script event"),
        }
    }

    let outcome = match cycle.outcome().await {
        CycleOutcome::Finished(outcome) => Some(outcome),
        CycleOutcome::Abandoned => None,
    };
    let final_snapshot = handle.snapshot();
    handle.close().await?;

    let mut submissions = Vec::new();
    while let Ok(submission) = submission_rx.try_recv() {
        submissions.push(submission);
    }
    let ledger = ledger
        .lock()
        .map(|ledger| ledger.clone())
        .map_err(|_| EngineError::new("Progress ledger lock poisoned"))?;

    info!(
        status = ?outcome.as_ref().map(TerminalOutcome::status),
        score = final_snapshot.score(),
        "Script finished"
    );
    Ok(PlayReport {
        outcome,
        final_snapshot,
        ledger,
        submissions,
    })
}
