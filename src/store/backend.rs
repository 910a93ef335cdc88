//! Check store trait definitions

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::PluginResult;

/// Read access to the collections the monitored application writes.
///
/// Counts are exact and taken against the live data at call time.
#[async_trait]
pub trait CheckStore: Send + Sync {
    /// Number of checks that are down, not paused and have run at least once.
    async fn count_failing_checks(&self) -> PluginResult<u64>;

    /// Number of check-stat records whose `field` lies in `[start, end)`.
    async fn count_check_stats(
        &self,
        field: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> PluginResult<u64>;
}

/// Opens a [`CheckStore`] for a normalized MongoDB URI.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self, uri: &str, dbname: &str) -> PluginResult<Box<dyn CheckStore>>;
}
