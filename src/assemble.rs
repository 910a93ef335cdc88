use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::flatten::{FlatMetrics, flatten};

pub const CHECKS_DOWN_KEY: &str = "checks_down";
pub const CHECKS_PER_MINUTE_KEY: &str = "checks_per_minute";

/// Pick the status document of the primary replica-set member.
///
/// The server-status payload maps member names to their status. The first
/// member whose `repl.ismaster` is truthy wins; without one the result is empty.
pub fn select_primary(status: &Map<String, Value>) -> Map<String, Value> {
    status
        .iter()
        .find(|(_, member)| is_primary(member))
        .map(|(name, member)| {
            debug!("mongodb_plugin: primary member is {name}");
            member.as_object().cloned().unwrap_or_default()
        })
        .unwrap_or_else(|| {
            trace!("mongodb_plugin: no primary member in server status");
            Map::new()
        })
}

fn is_primary(member: &Value) -> bool {
    member
        .get("repl")
        .and_then(Value::as_object)
        .and_then(|repl| repl.get("ismaster"))
        .is_some_and(truthy)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Merge the primary's status with the check counters and flatten the result.
pub fn assemble(
    status: &Map<String, Value>,
    checks_down: u64,
    checks_per_minute: f64,
) -> FlatMetrics {
    let mut result = select_primary(status);
    result.insert(CHECKS_DOWN_KEY.to_string(), Value::from(checks_down));
    result.insert(
        CHECKS_PER_MINUTE_KEY.to_string(),
        Value::from(checks_per_minute),
    );
    flatten(&result)
}
