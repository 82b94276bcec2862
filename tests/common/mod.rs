use std::sync::Arc;
use std::time::Duration;

use s_engine::KvClient;
use s_engine::MemoryKvClient;
use s_engine::SessionStore;
use s_engine::SessionStoreConfig;
use serde_json::Value;

pub const TTL_SECS: u64 = 86400;

/// A session store over a fresh in-memory client.
pub fn mem_store() -> (Arc<MemoryKvClient>, SessionStore<MemoryKvClient>) {
    let config = SessionStoreConfig::new(TTL_SECS);
    let client = Arc::new(MemoryKvClient::new());
    let store = SessionStore::new(client.clone(), config);
    (client, store)
}

/// Seeds a raw record the way an external writer would.
pub async fn seed(
    client: &MemoryKvClient,
    key: &str,
    payload: &str,
) {
    client
        .set_with_expiry(key, payload.as_bytes().to_vec(), Duration::from_secs(TTL_SECS))
        .await
        .unwrap();
}

/// Reads a stored record back as JSON.
pub async fn stored_json(
    client: &MemoryKvClient,
    key: &str,
) -> Value {
    let raw = client.get(key).await.unwrap().expect("record present");
    serde_json::from_slice(&raw).unwrap()
}
