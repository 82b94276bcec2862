use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::time::Instant;
use tracing::trace;

use crate::KvClient;
use crate::Result;

/// In-memory key-value adapter with per-key expiry.
///
/// Backs the test suites and embedded single-process setups. Entries expire
/// lazily on access; deadlines sit on the tokio clock so paused-time tests
/// behave deterministically. Never returns transport errors.
#[derive(Debug, Default)]
pub struct MemoryKvClient {
    entries: RwLock<HashMap<String, MemEntry>>,
}

#[derive(Debug, Clone)]
struct MemEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl MemEntry {
    fn is_expired(
        &self,
        now: Instant,
    ) -> bool {
        self.expires_at <= now
    }
}

impl MemoryKvClient {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining lifetime of a live entry, `None` when absent or expired.
    pub fn expires_in(
        &self,
        key: &str,
    ) -> Option<Duration> {
        let now = Instant::now();
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.expires_at - now)
    }
}

#[async_trait]
impl KvClient for MemoryKvClient {
    async fn get(
        &self,
        key: &str,
    ) -> Result<Option<Vec<u8>>> {
        let now = Instant::now();
        let entries = self.entries.read();
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone()))
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<bool> {
        let now = Instant::now();
        let mut entries = self.entries.write();

        if entries.get(key).is_some_and(|entry| !entry.is_expired(now)) {
            return Ok(false);
        }

        trace!("set_if_absent key = {}", key);
        entries.insert(
            key.to_string(),
            MemEntry {
                value,
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.entries.write();
        entries.insert(
            key.to_string(),
            MemEntry {
                value,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn delete(
        &self,
        key: &str,
    ) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

// Test helper methods
#[cfg(test)]
impl MemoryKvClient {
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
