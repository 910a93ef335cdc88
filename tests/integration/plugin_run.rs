//! End-to-end runs of the plugin against a mocked Compose API and an
//! in-memory check store

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use compose_mongodb_plugin::{
    MongodbComposePlugin, PluginResult, RunOutcome,
    config::{SECTION, STATS_FIELD_KEY},
    store::{
        CheckStore, StoreConnector,
        memory::{CheckRecord, MemoryConnector, MemoryStore},
    },
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

/// Remembers the URI the plugin connected with.
#[derive(Default)]
struct RecordingConnector {
    store: MemoryStore,
    uris: Mutex<Vec<String>>,
}

#[async_trait]
impl StoreConnector for RecordingConnector {
    async fn connect(&self, uri: &str, dbname: &str) -> PluginResult<Box<dyn CheckStore>> {
        self.uris.lock().unwrap().push(uri.to_string());
        MemoryConnector::new(self.store.clone())
            .connect(uri, dbname)
            .await
    }
}

/// Check store that remembers every check-stats query it answers.
#[derive(Clone, Default)]
struct QueryRecordingStore {
    stats_queries: Arc<Mutex<Vec<(String, DateTime<Utc>, DateTime<Utc>)>>>,
}

#[async_trait]
impl CheckStore for QueryRecordingStore {
    async fn count_failing_checks(&self) -> PluginResult<u64> {
        Ok(0)
    }

    async fn count_check_stats(
        &self,
        field: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> PluginResult<u64> {
        self.stats_queries
            .lock()
            .unwrap()
            .push((field.to_string(), start, end));
        Ok(0)
    }
}

#[async_trait]
impl StoreConnector for QueryRecordingStore {
    async fn connect(&self, _uri: &str, _dbname: &str) -> PluginResult<Box<dyn CheckStore>> {
        Ok(Box::new(self.clone()))
    }
}

fn populated_store() -> MemoryStore {
    let store = MemoryStore::new();
    let now = Utc::now();

    store.insert_check(CheckRecord::down(1_700_000_000));
    store.insert_check(CheckRecord::down(1_700_000_100));
    store.insert_check(CheckRecord::down(1_700_000_200));
    store.insert_check(CheckRecord::down(0));
    store.insert_check(CheckRecord::down(1_700_000_300).paused());
    store.insert_check(CheckRecord::up(1_700_000_400));

    for i in 0..10 {
        store.insert_check_stat(now - Duration::seconds(10 + i * 20));
    }
    for i in 0..4 {
        store.insert_check_stat(now - Duration::minutes(10 + i));
    }

    store
}

async fn mock_server_status(response: ResponseTemplate) -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SERVER_STATUS_PATH))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(response)
        .mount(&mock_server)
        .await;

    mock_server
}

#[tokio::test]
async fn test_run_collects_primary_status_and_counters() {
    let mock_server = mock_server_status(
        ResponseTemplate::new(200).set_body_json(create_mock_server_status_json()),
    )
    .await;

    let plugin = MongodbComposePlugin::new(
        create_test_config("localhost:27017", &mock_server.uri()),
        Arc::new(MemoryConnector::new(populated_store())),
    );

    let outcome = plugin.run().await;
    let metrics = outcome.metrics().expect("run should collect metrics");

    assert_eq!(metrics["host"], json!("aws-us-east-1-portal.1"));
    assert_eq!(metrics["repl_ismaster"], json!(true));
    assert_eq!(metrics["repl_setName"], json!("rs0"));
    assert_eq!(metrics["connections_current"], json!(18));
    assert_eq!(metrics["opcounters_query"], json!(3400));
    assert_eq!(metrics["checks_down"], json!(3));
    assert_eq!(metrics["checks_per_minute"], json!(2.0));

    assert!(
        metrics.values().all(|value| !value.is_object()),
        "result must be flat"
    );
}

#[tokio::test]
async fn test_http_error_keeps_counters() {
    let mock_server = mock_server_status(ResponseTemplate::new(500)).await;

    let plugin = MongodbComposePlugin::new(
        create_test_config("localhost:27017", &mock_server.uri()),
        Arc::new(MemoryConnector::new(populated_store())),
    );

    let outcome = plugin.run().await;

    assert_eq!(
        outcome.to_value(),
        json!({"checks_down": 3, "checks_per_minute": 2.0})
    );
}

#[tokio::test]
async fn test_no_primary_keeps_counters() {
    let mock_server = mock_server_status(ResponseTemplate::new(200).set_body_json(json!({
        "portal.0": {"host": "portal.0", "repl": {"ismaster": false}},
        "portal.1": {"host": "portal.1"}
    })))
    .await;

    let plugin = MongodbComposePlugin::new(
        create_test_config("localhost:27017", &mock_server.uri()),
        Arc::new(MemoryConnector::new(MemoryStore::new())),
    );

    assert_eq!(
        plugin.run().await.to_value(),
        json!({"checks_down": 0, "checks_per_minute": 0.0})
    );
}

#[tokio::test]
async fn test_bare_address_is_prefixed() {
    let mock_server = mock_server_status(ResponseTemplate::new(404)).await;
    let connector = Arc::new(RecordingConnector::default());

    let plugin = MongodbComposePlugin::new(
        create_test_config("db.internal:27017", &mock_server.uri()),
        connector.clone(),
    );

    assert!(plugin.run().await.is_collected());
    assert_eq!(
        *connector.uris.lock().unwrap(),
        vec!["mongodb://db.internal:27017".to_string()]
    );
}

#[tokio::test]
async fn test_mongodb_uri_is_kept() {
    let mock_server = mock_server_status(ResponseTemplate::new(404)).await;
    let connector = Arc::new(RecordingConnector::default());
    let uri = "mongodb://user:pw@db-1:27017,db-2:27017/monitoring?replicaSet=rs0";

    let plugin = MongodbComposePlugin::new(
        create_test_config(uri, &mock_server.uri()),
        connector.clone(),
    );

    assert!(plugin.run().await.is_collected());
    assert_eq!(*connector.uris.lock().unwrap(), vec![uri.to_string()]);
}

#[tokio::test]
async fn test_each_run_reconnects() {
    let mock_server = mock_server_status(ResponseTemplate::new(404)).await;
    let connector = Arc::new(RecordingConnector::default());

    let plugin = MongodbComposePlugin::new(
        create_test_config("db:27017", &mock_server.uri()),
        connector.clone(),
    );

    plugin.run().await;
    plugin.run().await;

    assert_eq!(connector.uris.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_outcome_serializes_as_flat_object() {
    let mock_server = mock_server_status(
        ResponseTemplate::new(200).set_body_json(create_mock_server_status_json()),
    )
    .await;

    let plugin = MongodbComposePlugin::new(
        create_test_config("localhost:27017", &mock_server.uri()),
        Arc::new(MemoryConnector::new(MemoryStore::new())),
    );

    let serialized = serde_json::to_value(plugin.run().await).unwrap();

    assert_eq!(serialized["host"], json!("aws-us-east-1-portal.1"));
    assert_eq!(serialized["checks_down"], json!(0));
}

#[tokio::test]
async fn test_outcome_variants() {
    let plugin = MongodbComposePlugin::new(
        Default::default(),
        Arc::new(MemoryConnector::new(MemoryStore::new())),
    );

    assert_eq!(plugin.run().await, RunOutcome::NotConfigured);
}

#[tokio::test]
async fn test_check_stats_use_default_field_and_window() {
    let mock_server = mock_server_status(ResponseTemplate::new(404)).await;
    let store = QueryRecordingStore::default();

    let plugin = MongodbComposePlugin::new(
        create_test_config("db:27017", &mock_server.uri()),
        Arc::new(store.clone()),
    );
    assert!(plugin.run().await.is_collected());

    let queries = store.stats_queries.lock().unwrap();
    assert_eq!(queries.len(), 1);

    let (field, start, end) = &queries[0];
    assert_eq!(field, "timestamp");
    assert_eq!(*end - *start, Duration::minutes(5));
}

#[tokio::test]
async fn test_configured_stats_field_reaches_query() {
    let mock_server = mock_server_status(ResponseTemplate::new(404)).await;
    let store = QueryRecordingStore::default();

    let mut raw = create_test_config("db:27017", &mock_server.uri());
    raw.get_mut(SECTION)
        .unwrap()
        .insert(STATS_FIELD_KEY.to_string(), "created_at".to_string());

    let plugin = MongodbComposePlugin::new(raw, Arc::new(store.clone()));
    assert!(plugin.run().await.is_collected());

    let fields: Vec<String> = store
        .stats_queries
        .lock()
        .unwrap()
        .iter()
        .map(|(field, _, _)| field.clone())
        .collect();
    assert_eq!(fields, vec!["created_at".to_string()]);
}
