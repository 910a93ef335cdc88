use std::collections::BTreeMap;
use std::fmt;

use tracing::trace;

use crate::error::{PluginError, PluginResult};
use crate::store::redact_credentials;

pub const SECTION: &str = "MongoDB";

pub const SERVER_KEY: &str = "mongodb_plugin_server";
pub const DBNAME_KEY: &str = "mongodb_plugin_compose_dbname";
pub const TOKEN_KEY: &str = "mongodb_plugin_compose_token";
pub const ACCOUNT_KEY: &str = "mongodb_plugin_compose_account";
pub const DEPLOYMENT_KEY: &str = "mongodb_plugin_compose_deployment";
pub const API_BASE_KEY: &str = "mongodb_plugin_compose_api_base";
pub const STATS_FIELD_KEY: &str = "mongodb_plugin_check_stats_field";

/// Keys that must be set once a server address is configured, in check order.
pub const REQUIRED_FIELDS: [&str; 4] = [DBNAME_KEY, TOKEN_KEY, ACCOUNT_KEY, DEPLOYMENT_KEY];

pub const COMPOSE_API_BASE: &str = "https://api.compose.io";

fn default_stats_field() -> String {
    String::from("timestamp")
}

/// Raw host configuration: named sections of string settings.
pub type RawConfig = BTreeMap<String, BTreeMap<String, String>>;

/// Validated plugin settings for a single run.
#[derive(Clone, PartialEq, Eq)]
pub struct PluginConfig {
    pub server: String,
    pub dbname: String,
    pub account: String,
    pub deployment: String,
    pub token: String,
    pub api_base: String,
    pub stats_field: String,
}

impl PluginConfig {
    /// Decode the `MongoDB` section of the host configuration.
    ///
    /// Returns `Ok(None)` when the plugin is not configured at all (no section or
    /// an empty server address). A configured server with any other required key
    /// missing is an error naming that key.
    pub fn from_raw(raw: &RawConfig) -> PluginResult<Option<PluginConfig>> {
        let Some(section) = raw.get(SECTION) else {
            return Ok(None);
        };

        let Some(server) = non_empty(section, SERVER_KEY) else {
            return Ok(None);
        };

        for field in REQUIRED_FIELDS {
            if non_empty(section, field).is_none() {
                return Err(PluginError::MissingField(field));
            }
        }

        let value = |key: &str| non_empty(section, key).unwrap_or_default().to_string();

        Ok(Some(PluginConfig {
            server: server.to_string(),
            dbname: value(DBNAME_KEY),
            account: value(ACCOUNT_KEY),
            deployment: value(DEPLOYMENT_KEY),
            token: value(TOKEN_KEY),
            api_base: non_empty(section, API_BASE_KEY)
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| COMPOSE_API_BASE.to_string()),
            stats_field: non_empty(section, STATS_FIELD_KEY)
                .map(str::to_string)
                .unwrap_or_else(default_stats_field),
        }))
    }
}

impl fmt::Debug for PluginConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginConfig")
            .field("server", &redact_credentials(&self.server))
            .field("dbname", &self.dbname)
            .field("account", &self.account)
            .field("deployment", &self.deployment)
            .field("token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("stats_field", &self.stats_field)
            .finish()
    }
}

fn non_empty<'a>(section: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    section
        .get(key)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

pub fn read_config_file(path: &str) -> anyhow::Result<RawConfig> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str::<RawConfig>(&file_content)
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))
        .inspect(|config| trace!("loaded config sections: {:?}", config.keys()))
}
