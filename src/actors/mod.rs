//! Actor-based scheduling of plugin runs
//!
//! Hosts without their own plugin loader can drive the plugin through a
//! collector actor. The actor owns one plugin instance, so two runs of the same
//! instance never overlap.
//!
//! ```text
//! Timer tick / PollNow → plugin.run() → Publish CollectionEvent → [printer, tests, ...]
//!     ↑
//!     └─── Commands (PollNow, UpdateInterval, Shutdown)
//! ```
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: the actor has an mpsc command channel for control messages
//! 2. **Events**: results are published to a broadcast channel for fan-out
//! 3. **Request/Response**: oneshot channels for `PollNow`

pub mod collector;
pub mod messages;
