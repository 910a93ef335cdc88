//! The MongoDB/Compose collection routine
//!
//! A single run goes through four phases:
//!
//! ```text
//! validate config → connect to MongoDB → acquire metrics → assemble + flatten
//! ```
//!
//! Missing configuration and connection problems end the run with a `false`
//! result for the host. A failing Compose API only removes the replica-set
//! fields from the result.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::{debug, error, instrument, warn};

use crate::{
    assemble::assemble,
    compose::ComposeClient,
    config::{PluginConfig, RawConfig},
    error::{PluginError, PluginResult},
    flatten::FlatMetrics,
    store::{
        CheckStore, StoreConnector, mongo::MongoConnector, normalize_server_uri,
        redact_credentials,
    },
};

/// Length of the trailing window used for the check throughput.
pub const THROUGHPUT_WINDOW_MINUTES: i64 = 5;

/// What a run hands back to the host agent.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The plugin has no server configured and did nothing
    NotConfigured,

    /// The run was aborted
    Failed(PluginError),

    /// Flattened metrics of the primary member plus the check counters
    Collected(FlatMetrics),
}

impl RunOutcome {
    pub fn metrics(&self) -> Option<&FlatMetrics> {
        match self {
            RunOutcome::Collected(metrics) => Some(metrics),
            _ => None,
        }
    }

    pub fn is_collected(&self) -> bool {
        matches!(self, RunOutcome::Collected(_))
    }

    /// The host-facing value: the metric mapping, or `false`.
    pub fn to_value(&self) -> Value {
        match self {
            RunOutcome::Collected(metrics) => Value::Object(metrics.clone()),
            _ => Value::Bool(false),
        }
    }
}

impl Serialize for RunOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RunOutcome::Collected(metrics) => metrics.serialize(serializer),
            _ => serializer.serialize_bool(false),
        }
    }
}

pub struct MongodbComposePlugin {
    raw_config: RawConfig,
    connector: Arc<dyn StoreConnector>,
}

impl MongodbComposePlugin {
    pub fn new(raw_config: RawConfig, connector: Arc<dyn StoreConnector>) -> Self {
        Self {
            raw_config,
            connector,
        }
    }

    /// Plugin talking to a real MongoDB server.
    pub fn with_mongodb(raw_config: RawConfig) -> Self {
        Self::new(raw_config, Arc::new(MongoConnector))
    }

    #[instrument(skip_all)]
    pub async fn run(&self) -> RunOutcome {
        debug!("mongodb_plugin: started gathering data");

        let config = match self.preliminaries() {
            Ok(Some(config)) => config,
            Ok(None) => {
                debug!("mongodb_plugin: config not set");
                return RunOutcome::NotConfigured;
            }
            Err(e) => {
                error!("mongodb_plugin: {e}");
                return RunOutcome::Failed(e);
            }
        };

        let store = match self.get_connection(&config).await {
            Ok(store) => store,
            Err(e) => {
                error!("mongodb_plugin: {e}");
                return RunOutcome::Failed(e);
            }
        };

        match self.collect(&config, store.as_ref()).await {
            Ok(metrics) => {
                debug!("mongodb_plugin: collected {} metrics", metrics.len());
                RunOutcome::Collected(metrics)
            }
            Err(e) => {
                error!("mongodb_plugin: {e}");
                RunOutcome::Failed(e)
            }
        }
    }

    fn preliminaries(&self) -> PluginResult<Option<PluginConfig>> {
        let config = PluginConfig::from_raw(&self.raw_config)?;
        if let Some(config) = &config {
            debug!("mongodb_plugin: config set: {config:?}");
        }
        Ok(config)
    }

    #[instrument(skip_all)]
    async fn get_connection(&self, config: &PluginConfig) -> PluginResult<Box<dyn CheckStore>> {
        let uri = normalize_server_uri(&config.server)?;
        debug!("-- mongo_uri: {}", redact_credentials(&uri));

        self.connector.connect(&uri, &config.dbname).await
    }

    #[instrument(skip_all)]
    async fn collect(
        &self,
        config: &PluginConfig,
        store: &dyn CheckStore,
    ) -> PluginResult<FlatMetrics> {
        let status = self.server_status(config).await;

        let checks_down = store.count_failing_checks().await?;

        let end = Utc::now();
        let start = end - Duration::minutes(THROUGHPUT_WINDOW_MINUTES);
        let recent = store
            .count_check_stats(&config.stats_field, start, end)
            .await?;
        let checks_per_minute = recent as f64 / THROUGHPUT_WINDOW_MINUTES as f64;

        Ok(assemble(&status, checks_down, checks_per_minute))
    }

    async fn server_status(&self, config: &PluginConfig) -> Map<String, Value> {
        let status = match ComposeClient::new(config) {
            Ok(client) => client.server_status().await,
            Err(e) => Err(e),
        };

        status.unwrap_or_else(|e| {
            warn!("mongodb_plugin: continuing without server status: {e}");
            Map::new()
        })
    }
}
