//! Error types for plugin runs

use std::fmt;

/// Result type alias for plugin operations
pub type PluginResult<T> = Result<T, PluginError>;

/// Errors that can occur while collecting metrics
#[derive(Debug, Clone, PartialEq)]
pub enum PluginError {
    /// A required configuration key is missing or empty
    MissingField(&'static str),

    /// The server address cannot be turned into a MongoDB URI
    InvalidAddress(String),

    /// Opening the database client failed
    ConnectionFailed(String),

    /// A count query against the database failed
    QueryFailed(String),

    /// The Compose API could not be reached or decoded
    Api(String),
}

impl PluginError {
    /// Whether this error aborts the run.
    ///
    /// Compose API failures only degrade the result, everything else is fatal.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, PluginError::Api(_))
    }
}

impl fmt::Display for PluginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginError::MissingField(field) => write!(
                f,
                "config not set. {field} is required if mongodb_plugin_compose is `yes`"
            ),
            PluginError::InvalidAddress(msg) => write!(f, "invalid server address: {msg}"),
            PluginError::ConnectionFailed(msg) => {
                write!(f, "unable to connect to MongoDB server: {msg}")
            }
            PluginError::QueryFailed(msg) => write!(f, "MongoDB query failed: {msg}"),
            PluginError::Api(msg) => write!(f, "Compose API request failed: {msg}"),
        }
    }
}

impl std::error::Error for PluginError {}

impl From<reqwest::Error> for PluginError {
    fn from(err: reqwest::Error) -> Self {
        PluginError::Api(err.to_string())
    }
}
