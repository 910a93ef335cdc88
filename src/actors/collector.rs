//! CollectorActor - Runs the plugin on a schedule
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → plugin.run() → Publish CollectionEvent → [subscribers]
//!     ↑
//!     └─── Commands (PollNow, UpdateInterval, Shutdown)
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, instrument, trace, warn};

use crate::plugin::{MongodbComposePlugin, RunOutcome};

use super::messages::{CollectionEvent, CollectorCommand};

/// Actor that owns one plugin instance and runs it periodically
pub struct CollectorActor {
    plugin: MongodbComposePlugin,

    /// Name used in events and logs
    name: String,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<CollectorCommand>,

    /// Broadcast sender for publishing run results
    event_tx: broadcast::Sender<CollectionEvent>,

    /// Current run interval
    interval_duration: Duration,
}

impl CollectorActor {
    pub fn new(
        name: String,
        plugin: MongodbComposePlugin,
        interval_secs: u64,
        command_rx: mpsc::Receiver<CollectorCommand>,
        event_tx: broadcast::Sender<CollectionEvent>,
    ) -> Self {
        Self {
            plugin,
            name,
            command_rx,
            event_tx,
            interval_duration: Duration::from_secs(interval_secs.max(1)),
        }
    }

    /// Run the actor's main loop
    ///
    /// This is the entry point for the actor. It runs until:
    /// - A Shutdown command is received
    /// - The command channel is closed
    #[instrument(skip(self), fields(plugin = %self.name))]
    pub async fn run(mut self) {
        debug!("starting collector actor");

        let mut ticker = self.ticker();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.collect().await;
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(CollectorCommand::PollNow { respond_to }) => {
                            debug!("received PollNow command");
                            let outcome = self.collect().await;
                            let _ = respond_to.send(outcome);
                        }

                        Some(CollectorCommand::UpdateInterval { interval_secs }) => {
                            debug!("updating interval to {interval_secs}s");
                            self.interval_duration = Duration::from_secs(interval_secs.max(1));
                            ticker = self.ticker();
                        }

                        Some(CollectorCommand::Shutdown) => {
                            debug!("received shutdown command");
                            break;
                        }

                        // every handle is gone
                        None => {
                            warn!("command channel closed, shutting down");
                            break;
                        }
                    }
                }
            }
        }

        debug!("collector actor stopped");
    }

    fn ticker(&self) -> tokio::time::Interval {
        let mut ticker = interval(self.interval_duration);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    /// Run the plugin once and publish the outcome.
    async fn collect(&self) -> RunOutcome {
        let outcome = self.plugin.run().await;

        let event = CollectionEvent {
            plugin: self.name.clone(),
            outcome: outcome.clone(),
            timestamp: Utc::now(),
        };

        match self.event_tx.send(event) {
            Ok(num_receivers) => trace!("published collection event to {num_receivers} receivers"),
            Err(_) => trace!("no receivers for collection event"),
        }

        outcome
    }
}

/// Handle for controlling a CollectorActor
///
/// It can be cloned and shared across tasks.
#[derive(Clone)]
pub struct CollectorHandle {
    sender: mpsc::Sender<CollectorCommand>,

    pub name: String,
}

impl CollectorHandle {
    /// Spawn a new collector actor as a tokio task
    pub fn spawn(
        name: impl ToString,
        plugin: MongodbComposePlugin,
        interval_secs: u64,
        event_tx: broadcast::Sender<CollectionEvent>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let name = name.to_string();

        let actor = CollectorActor::new(name.clone(), plugin, interval_secs, cmd_rx, event_tx);

        tokio::spawn(actor.run());

        Self {
            sender: cmd_tx,
            name,
        }
    }

    /// Run the plugin now and wait for its outcome
    pub async fn poll_now(&self) -> Result<RunOutcome> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(CollectorCommand::PollNow { respond_to: tx })
            .await
            .context("failed to send PollNow command")?;

        rx.await.context("failed to receive response")
    }

    pub async fn update_interval(&self, interval_secs: u64) -> Result<()> {
        self.sender
            .send(CollectorCommand::UpdateInterval { interval_secs })
            .await
            .context("failed to send UpdateInterval command")?;
        Ok(())
    }

    /// Gracefully shut down the collector
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(CollectorCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}
