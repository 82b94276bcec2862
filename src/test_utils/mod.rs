use std::sync::Arc;

use serde_json::Map;
use serde_json::Value;

use crate::MemoryKvClient;
use crate::SessionStore;
use crate::SessionStoreConfig;

/// Builds a field map from a `json!` object literal.
pub fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

/// A store over a fresh in-memory client, returning both handles.
pub fn mem_store(config: SessionStoreConfig) -> (Arc<MemoryKvClient>, SessionStore<MemoryKvClient>) {
    let client = Arc::new(MemoryKvClient::new());
    let store = SessionStore::new(client.clone(), config);
    (client, store)
}
