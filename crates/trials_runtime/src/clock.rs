//! Clock subsystem: one tokio task per repeating timer.
//!
//! Timers never touch session state. Each one sends a tick stamped with the
//! cycle it was armed for; the actor drops ticks from older cycles.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, instrument, trace};
use trials_core::{ClockConfig, TimerKind};

use crate::actor::Command;

/// Shortest period a timer is armed with.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Period of `timer`, floored so a zero config cannot spin.
pub(crate) fn effective_period(timer: TimerKind, config: &ClockConfig) -> Duration {
    timer.period(config).max(MIN_PERIOD)
}

/// The running timers of the current cycle.
#[derive(Debug, Default)]
pub(crate) struct TimerSet {
    epoch: Option<u64>,
    handles: Vec<JoinHandle<()>>,
}

impl TimerSet {
    /// Cancels any running timers, then arms all of them for `epoch`.
    #[instrument(skip(self, config, commands))]
    pub(crate) fn arm(
        &mut self,
        epoch: u64,
        config: &ClockConfig,
        commands: &UnboundedSender<Command>,
    ) {
        self.cancel();
        for timer in TimerKind::ALL {
            let period = effective_period(timer, config);
            let handle = tokio::spawn(run_timer(epoch, timer, period, commands.clone()));
            self.handles.push(handle);
        }
        self.epoch = Some(epoch);
        debug!(timers = self.handles.len(), "Timers armed");
    }

    /// Aborts every timer task. Idempotent.
    pub(crate) fn cancel(&mut self) {
        if let Some(epoch) = self.epoch.take() {
            debug!(epoch, "Timers cancelled");
        }
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }

    /// Whether timers are armed.
    pub(crate) fn is_armed(&self) -> bool {
        !self.handles.is_empty()
    }
}

impl Drop for TimerSet {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_timer(
    epoch: u64,
    timer: TimerKind,
    period: Duration,
    commands: UnboundedSender<Command>,
) {
    let Some(start) = Instant::now().checked_add(period) else {
        trace!(?timer, ?period, "Period out of range, timer never fires");
        return;
    };
    let mut interval = interval_at(start, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        if commands.send(Command::Tick { epoch, timer }).is_err() {
            trace!(?timer, "Actor gone, timer exiting");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn test_timers_tick_with_epoch() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timers = TimerSet::default();
        let config = ClockConfig {
            effects_period: Duration::from_secs(10),
            ..ClockConfig::default()
        };
        timers.arm(7, &config, &tx);
        assert!(timers.is_armed());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        let mut ticks = Vec::new();
        while let Ok(cmd) = rx.try_recv() {
            ticks.push(cmd);
        }
        assert_eq!(ticks.len(), 2);
        assert!(ticks.iter().all(|c| matches!(c, Command::Tick { epoch: 7, .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_ticks() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timers = TimerSet::default();
        timers.arm(1, &ClockConfig::default(), &tx);
        timers.cancel();
        assert!(!timers.is_armed());

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_timers() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timers = TimerSet::default();
        let config = ClockConfig {
            effects_period: Duration::from_secs(10),
            ..ClockConfig::default()
        };
        timers.arm(1, &config, &tx);
        tokio::time::sleep(Duration::from_millis(500)).await;
        timers.arm(2, &config, &tx);

        tokio::time::sleep(Duration::from_millis(1200)).await;
        let mut epochs = Vec::new();
        while let Ok(Command::Tick { epoch, .. }) = rx.try_recv() {
            epochs.push(epoch);
        }
        assert_eq!(epochs, vec![2, 2]);
    }
}
