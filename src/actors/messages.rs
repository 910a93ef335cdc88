//! Message types for actor communication

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

use crate::plugin::RunOutcome;

/// Event published after every plugin run
///
/// Slow subscribers may lag and miss events; the next run produces a fresh one.
#[derive(Debug, Clone)]
pub struct CollectionEvent {
    /// Name of the plugin instance that ran
    pub plugin: String,

    /// Result of the run
    pub outcome: RunOutcome,

    /// When the run finished
    pub timestamp: DateTime<Utc>,
}

/// Commands that can be sent to a CollectorActor
#[derive(Debug)]
pub enum CollectorCommand {
    /// Run the plugin immediately (bypassing the interval timer)
    PollNow {
        /// Channel to send the result back
        respond_to: oneshot::Sender<RunOutcome>,
    },

    /// Update the run interval
    UpdateInterval {
        /// New interval in seconds
        interval_secs: u64,
    },

    /// Gracefully shut down the collector
    ///
    /// An in-flight run is finished first.
    Shutdown,
}
