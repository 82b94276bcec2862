use std::sync::Arc;

use serde_json::Map;
use serde_json::Value;
use tracing::debug;

use crate::constants::LOCK_KEY_SUFFIX;
use crate::constants::TOMBSTONE;
use crate::metrics::OUTCOME_DESTROYED;
use crate::metrics::OUTCOME_DROPPED_DESTROYED;
use crate::metrics::OUTCOME_PERSISTED;
use crate::metrics::OUTCOME_SKIPPED_CLEAN;
use crate::metrics::OUTCOME_SKIPPED_FORGOTTEN;
use crate::metrics::SESSION_SAVE_METRIC;
use crate::KvClient;
use crate::LockManager;
use crate::Result;
use crate::SessionStoreConfig;
use crate::SessionValue;

/// Lock-guarded session persistence over an injected key-value client.
///
/// Reads are always lock-free. Saving re-reads the freshly persisted record
/// under the session's lock and rebases the caller's changes onto it, so
/// concurrent writers touching disjoint fields both survive, and a record
/// destroyed elsewhere wins over any update loaded before the destruction.
pub struct SessionStore<C> {
    client: Arc<C>,
    lock: LockManager<C>,
    config: SessionStoreConfig,
}

impl<C: KvClient> SessionStore<C> {
    pub fn new(
        client: Arc<C>,
        config: SessionStoreConfig,
    ) -> Self {
        let lock = LockManager::new(client.clone(), &config);
        Self {
            client,
            lock,
            config,
        }
    }

    /// The configuration this store was built with.
    pub fn config(&self) -> &SessionStoreConfig {
        &self.config
    }

    /// Returns the store key for the given session id.
    pub fn session_key(
        &self,
        id: &str,
    ) -> String {
        format!("{}{}", self.config.prefix, id)
    }

    /// Returns the store key guarding writes to the given session id.
    pub fn lock_key(
        &self,
        id: &str,
    ) -> String {
        format!("{}{}", self.session_key(id), LOCK_KEY_SUFFIX)
    }

    /// Loads the session with the given id.
    ///
    /// An absent record and a tombstone both load as empty data; the
    /// tombstone additionally flags the value as from-destroyed. Corrupt or
    /// foreign payloads are tolerated and load as empty data. Never blocks
    /// on the session lock.
    pub async fn get(
        &self,
        id: &str,
    ) -> Result<SessionValue> {
        let raw = self.client.get(&self.session_key(id)).await?;

        let from_destroyed =
            matches!(&raw, Some(value) if value.as_slice() == TOMBSTONE.as_bytes());
        let data = match &raw {
            Some(value) if !from_destroyed => decode_record(value),
            _ => Map::new(),
        };

        Ok(SessionValue::new(data, from_destroyed))
    }

    /// Saves the session under its lock, merging with whatever was
    /// persisted since it was loaded.
    ///
    /// A destroyed session delegates to [`destroy`](Self::destroy). A
    /// forgotten or unchanged session succeeds immediately without
    /// touching the store.
    pub async fn set(
        &self,
        id: &str,
        session: SessionValue,
    ) -> Result<()> {
        if session.is_destroyed() {
            return self.destroy(id).await;
        }

        if session.is_forgotten() {
            SESSION_SAVE_METRIC
                .with_label_values(&[OUTCOME_SKIPPED_FORGOTTEN])
                .inc();
            return Ok(());
        }
        if !session.has_changed() {
            SESSION_SAVE_METRIC
                .with_label_values(&[OUTCOME_SKIPPED_CLEAN])
                .inc();
            return Ok(());
        }

        let guard = self.lock.acquire(&self.lock_key(id)).await?;
        let result = self.save_updates(id, &session).await;
        self.lock.release(guard).await;
        result
    }

    /// Re-reads the record as currently persisted and applies the
    /// session's changes on top of it.
    ///
    /// The re-read makes the merge three-way instead of a blind overwrite:
    /// the session's diff was computed against its own load-time snapshot
    /// and is rebased onto the latest base here. If the record was
    /// destroyed after this session was loaded, the update is dropped
    /// rather than resurrecting it.
    async fn save_updates(
        &self,
        id: &str,
        session: &SessionValue,
    ) -> Result<()> {
        let latest = self.get(id).await?;

        if latest.is_from_destroyed() && !session.is_from_destroyed() {
            debug!("session {} destroyed since load, dropping update", id);
            SESSION_SAVE_METRIC
                .with_label_values(&[OUTCOME_DROPPED_DESTROYED])
                .inc();
            return Ok(());
        }

        let merged = latest.apply_changes(session);
        let payload = serde_json::to_vec(&merged)?;
        self.client
            .set_with_expiry(&self.session_key(id), payload, self.config.ttl())
            .await?;

        SESSION_SAVE_METRIC
            .with_label_values(&[OUTCOME_PERSISTED])
            .inc();
        Ok(())
    }

    /// Destroys the session with the given id, leaving a tombstone.
    ///
    /// The tombstone outlives in-flight requests that still hold a view of
    /// the record, so their late saves are dropped instead of resurrecting
    /// the session.
    pub async fn destroy(
        &self,
        id: &str,
    ) -> Result<()> {
        let guard = self.lock.acquire(&self.lock_key(id)).await?;
        let result = self
            .client
            .set_with_expiry(
                &self.session_key(id),
                TOMBSTONE.as_bytes().to_vec(),
                self.config.delete_expiry(),
            )
            .await;
        self.lock.release(guard).await;

        if result.is_ok() {
            SESSION_SAVE_METRIC
                .with_label_values(&[OUTCOME_DESTROYED])
                .inc();
        }
        result
    }
}

/// Decodes a persisted payload, falling back to empty data.
///
/// Only JSON objects are valid session records; malformed JSON and
/// non-object documents load as empty so corrupt or foreign data never
/// surfaces as an error.
fn decode_record(raw: &[u8]) -> Map<String, Value> {
    match serde_json::from_slice::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            debug!("non-object session payload ({}) treated as empty", kind_of(&other));
            Map::new()
        }
        Err(err) => {
            debug!("undecodable session payload treated as empty: {}", err);
            Map::new()
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
