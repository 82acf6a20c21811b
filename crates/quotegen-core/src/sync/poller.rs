//! Periodic sync poller
//!
//! Fires a `SyncTrigger::Periodic` cycle on a fixed interval until shut down.
//! Every trigger, timed or requested, is handed to the engine as soon as it
//! arrives, so one landing while a cycle is in flight is dropped there
//! instead of waiting its turn.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use super::engine::{SyncEngine, SyncOutcome, SyncTrigger};

/// Commands sent to the poller task
#[derive(Debug)]
pub enum SyncCommand {
    /// Run a manual cycle now
    SyncNow,
    /// Stop the poller
    Shutdown,
}

/// Handle for controlling the background poller
pub struct SyncHandle {
    pub command_tx: mpsc::Sender<SyncCommand>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Ask the poller for a manual cycle
    pub async fn sync_now(&self) -> bool {
        self.command_tx.send(SyncCommand::SyncNow).await.is_ok()
    }

    /// Stop the poller and wait for it to exit
    ///
    /// A cycle already in flight runs to completion first.
    pub async fn shutdown(self) {
        let _ = self.command_tx.send(SyncCommand::Shutdown).await;
        let _ = self.task.await;
    }
}

/// Spawn a task that triggers a periodic sync every `interval`
pub fn spawn_sync_poller(engine: Arc<SyncEngine>, interval: Duration) -> SyncHandle {
    let (command_tx, command_rx) = mpsc::channel(16);
    let task = tokio::spawn(sync_poller_task(engine, interval, command_rx));

    SyncHandle { command_tx, task }
}

async fn sync_poller_task(
    engine: Arc<SyncEngine>,
    interval: Duration,
    mut command_rx: mpsc::Receiver<SyncCommand>,
) {
    debug!("Sync poller started, interval {:?}", interval);

    // First tick one full interval after start, then on a fixed cadence
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut cycles = JoinSet::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                spawn_trigger(&mut cycles, &engine, SyncTrigger::Periodic);
            }
            cmd = command_rx.recv() => match cmd {
                Some(SyncCommand::SyncNow) => {
                    spawn_trigger(&mut cycles, &engine, SyncTrigger::Manual);
                }
                Some(SyncCommand::Shutdown) | None => break,
            },
            Some(_) = cycles.join_next(), if !cycles.is_empty() => {}
        }
    }

    while cycles.join_next().await.is_some() {}
    debug!("Sync poller stopped");
}

fn spawn_trigger(cycles: &mut JoinSet<()>, engine: &Arc<SyncEngine>, trigger: SyncTrigger) {
    let engine = engine.clone();
    cycles.spawn(async move {
        if let SyncOutcome::Skipped = engine.trigger(trigger).await {
            debug!("{:?} sync skipped, a cycle is in flight", trigger);
        }
    });
}
