//! MongoDB check store backed by the official driver

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::{
    Client, Database,
    bson::{DateTime as BsonDateTime, Document, doc},
};
use tracing::{debug, instrument, trace};

use super::backend::{CheckStore, StoreConnector};
use super::uri::redact_credentials;
use crate::error::{PluginError, PluginResult};

pub const CHECKS_COLLECTION: &str = "checks";
pub const CHECK_STATS_COLLECTION: &str = "check_stats";

/// Checks that are down, not paused and have been checked at least once.
pub fn failing_checks_filter() -> Document {
    doc! {
        "is_up": 0,
        "is_paused": 0,
        "last_checked_time": { "$gt": 0 },
    }
}

/// Records whose `field` timestamp lies in `[start, end)`.
pub fn check_stats_filter(field: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Document {
    let mut filter = Document::new();
    filter.insert(
        field,
        doc! {
            "$gte": BsonDateTime::from_millis(start.timestamp_millis()),
            "$lt": BsonDateTime::from_millis(end.timestamp_millis()),
        },
    );
    filter
}

/// Connects to MongoDB with `Client::with_uri_str` and verifies the server answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct MongoConnector;

#[async_trait]
impl StoreConnector for MongoConnector {
    #[instrument(skip(self, uri))]
    async fn connect(&self, uri: &str, dbname: &str) -> PluginResult<Box<dyn CheckStore>> {
        let address = redact_credentials(uri);

        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| PluginError::ConnectionFailed(format!("{address}: {e}")))?;

        // the driver connects lazily, so make it talk to the server now
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| PluginError::ConnectionFailed(format!("{address}: {e}")))?;

        debug!("Connected to MongoDB");

        Ok(Box::new(MongoCheckStore {
            database: client.database(dbname),
        }))
    }
}

pub struct MongoCheckStore {
    database: Database,
}

#[async_trait]
impl CheckStore for MongoCheckStore {
    async fn count_failing_checks(&self) -> PluginResult<u64> {
        let filter = failing_checks_filter();
        trace!("counting {CHECKS_COLLECTION} matching {filter}");

        self.database
            .collection::<Document>(CHECKS_COLLECTION)
            .count_documents(filter)
            .await
            .map_err(|e| PluginError::QueryFailed(format!("{CHECKS_COLLECTION}: {e}")))
    }

    async fn count_check_stats(
        &self,
        field: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> PluginResult<u64> {
        let filter = check_stats_filter(field, start, end);
        trace!("counting {CHECK_STATS_COLLECTION} matching {filter}");

        self.database
            .collection::<Document>(CHECK_STATS_COLLECTION)
            .count_documents(filter)
            .await
            .map_err(|e| PluginError::QueryFailed(format!("{CHECK_STATS_COLLECTION}: {e}")))
    }
}
