//! MongoDB health metrics for a host monitoring agent, merged from a direct
//! MongoDB connection and the Compose deployment API.

pub mod actors;
pub mod assemble;
pub mod compose;
pub mod config;
pub mod error;
pub mod flatten;
pub mod plugin;
pub mod store;
pub mod util;

pub use error::{PluginError, PluginResult};
pub use flatten::{FlatMetrics, flatten};
pub use plugin::{MongodbComposePlugin, RunOutcome};
