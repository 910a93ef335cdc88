//! Client for the Compose deployment API
//!
//! Every request carries the bearer token and the pinned API version. An HTTP
//! error status is not a failure of the run: the caller gets an empty result and
//! the collected metrics simply lack the Compose part.

use reqwest::{Client, header};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{instrument, trace, warn};

use crate::config::PluginConfig;
use crate::error::{PluginError, PluginResult};

pub const ACCEPT_VERSION: &str = "2014-06";

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseEntry {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ComposeClient {
    client: Client,
    base: String,
    account: String,
    deployment: String,
    token: String,
}

impl ComposeClient {
    pub fn new(config: &PluginConfig) -> PluginResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| PluginError::Api(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base: config.api_base.clone(),
            account: config.account.clone(),
            deployment: config.deployment.clone(),
            token: config.token.clone(),
        })
    }

    fn deployment_url(&self, suffix: &str) -> String {
        format!(
            "{}/deployments/{}/{}/{suffix}",
            self.base, self.account, self.deployment
        )
    }

    pub fn server_status_url(&self) -> String {
        self.deployment_url("mongodb/server-status")
    }

    pub fn databases_url(&self) -> String {
        self.deployment_url("databases")
    }

    pub fn db_stats_url(&self, dbname: &str) -> String {
        self.deployment_url(&format!("mongodb/{dbname}/stats"))
    }

    /// Server status of every deployment member, keyed by member name.
    pub async fn server_status(&self) -> PluginResult<Map<String, Value>> {
        let data = self.get(&self.server_status_url()).await?;
        Ok(data.and_then(into_object).unwrap_or_default())
    }

    /// Names of all databases of the deployment.
    pub async fn list_databases(&self) -> PluginResult<Vec<String>> {
        let Some(data) = self.get(&self.databases_url()).await? else {
            return Ok(vec![]);
        };

        let entries = serde_json::from_value::<Vec<DatabaseEntry>>(data)
            .map_err(|e| PluginError::Api(format!("unexpected database list: {e}")))?;

        Ok(entries.into_iter().map(|entry| entry.name).collect())
    }

    pub async fn db_stats(&self, dbname: &str) -> PluginResult<Map<String, Value>> {
        let data = self.get(&self.db_stats_url(dbname)).await?;
        Ok(data.and_then(into_object).unwrap_or_default())
    }

    /// Issue an authenticated GET.
    ///
    /// `Ok(None)` means the API answered with an error status.
    #[instrument(skip(self))]
    async fn get(&self, url: &str) -> PluginResult<Option<Value>> {
        trace!("requesting {url}");

        let response = self
            .client
            .get(url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .header("Accept-Version", ACCEPT_VERSION)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("mongodb_plugin: Compose API answered {status} for {url}");
            return Ok(None);
        }

        let body = response.json::<Value>().await?;
        trace!("received response from {url}");

        Ok(Some(body))
    }
}

fn into_object(value: Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        other => {
            warn!("mongodb_plugin: expected a JSON object, got {other}");
            None
        }
    }
}
