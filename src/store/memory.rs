//! In-memory check store
//!
//! Holds check documents and check-stat timestamps in memory. Useful for:
//! - Testing the plugin without a MongoDB server
//! - Simulating unreachable servers and failing queries

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::backend::{CheckStore, StoreConnector};
use super::uri::redact_credentials;
use crate::error::{PluginError, PluginResult};

/// The fields of a `checks` document the plugin looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckRecord {
    pub is_up: bool,
    pub is_paused: bool,
    pub last_checked_time: i64,
}

impl CheckRecord {
    pub fn up(last_checked_time: i64) -> Self {
        Self {
            is_up: true,
            is_paused: false,
            last_checked_time,
        }
    }

    pub fn down(last_checked_time: i64) -> Self {
        Self {
            is_up: false,
            is_paused: false,
            last_checked_time,
        }
    }

    pub fn paused(mut self) -> Self {
        self.is_paused = true;
        self
    }

    fn is_failing(&self) -> bool {
        !self.is_up && !self.is_paused && self.last_checked_time > 0
    }
}

#[derive(Debug, Default)]
struct MemoryData {
    checks: Vec<CheckRecord>,
    check_stats: Vec<DateTime<Utc>>,
    query_error: Option<String>,
}

/// Shared in-memory store. Clones see the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<MemoryData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_check(&self, check: CheckRecord) {
        self.write().checks.push(check);
    }

    pub fn insert_check_stat(&self, timestamp: DateTime<Utc>) {
        self.write().check_stats.push(timestamp);
    }

    /// Make every following query fail with `message`.
    pub fn fail_queries(&self, message: impl ToString) {
        self.write().query_error = Some(message.to_string());
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, MemoryData> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read(&self) -> PluginResult<std::sync::RwLockReadGuard<'_, MemoryData>> {
        let data = self
            .data
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(message) = &data.query_error {
            return Err(PluginError::QueryFailed(message.clone()));
        }
        Ok(data)
    }
}

#[async_trait]
impl CheckStore for MemoryStore {
    async fn count_failing_checks(&self) -> PluginResult<u64> {
        let data = self.read()?;
        Ok(data.checks.iter().filter(|check| check.is_failing()).count() as u64)
    }

    async fn count_check_stats(
        &self,
        _field: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> PluginResult<u64> {
        let data = self.read()?;
        Ok(data
            .check_stats
            .iter()
            .filter(|timestamp| (start..end).contains(*timestamp))
            .count() as u64)
    }
}

/// Hands out a [`MemoryStore`], or refuses every connection attempt.
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    store: MemoryStore,
    refuse_with: Option<String>,
}

impl MemoryConnector {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store,
            refuse_with: None,
        }
    }

    /// A connector whose server can never be reached.
    pub fn unreachable(reason: impl ToString) -> Self {
        Self {
            store: MemoryStore::new(),
            refuse_with: Some(reason.to_string()),
        }
    }
}

#[async_trait]
impl StoreConnector for MemoryConnector {
    async fn connect(&self, uri: &str, _dbname: &str) -> PluginResult<Box<dyn CheckStore>> {
        if let Some(reason) = &self.refuse_with {
            return Err(PluginError::ConnectionFailed(format!(
                "{}: {reason}",
                redact_credentials(uri)
            )));
        }
        Ok(Box::new(self.store.clone()))
    }
}
