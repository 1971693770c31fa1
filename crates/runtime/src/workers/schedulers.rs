//! Fixed-interval timers that feed the session worker's queue.
//!
//! Schedulers never touch session state: each tick is enqueued as a command
//! and applied by the worker in arrival order. A scheduler stops on its own
//! once the worker has gone away and the queue no longer accepts sends.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

use crate::workers::Command;

/// Spawn the passive-accrual ticker (short period, order of a second).
pub(crate) fn spawn_passive_ticker(
    command_tx: mpsc::Sender<Command>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        // First accrual lands one full period after session start.
        let mut ticker = time::interval_at(Instant::now() + period, period);
        loop {
            ticker.tick().await;
            if command_tx.send(Command::PassiveTick).await.is_err() {
                debug!(target: "runtime::scheduler", "passive ticker stopping, session gone");
                break;
            }
        }
    })
}

/// Spawn the autosave timer (long period, order of minutes).
pub(crate) fn spawn_autosaver(
    command_tx: mpsc::Sender<Command>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        // A late autosave carries current state anyway; bursts add nothing.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if command_tx.send(Command::Autosave).await.is_err() {
                debug!(target: "runtime::scheduler", "autosaver stopping, session gone");
                break;
            }
        }
    })
}
