use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::Result;

/// Minimal contract the session engine requires from a key-value store.
///
/// Four single-key operations, each atomic with respect to its key; no
/// multi-key transactions are needed. A Redis client satisfies this with
/// `GET`, `SET NX PX`, `SETEX` and `DEL`. The crate ships an in-memory
/// adapter ([`MemoryKvClient`]) for tests and embedded setups.
///
/// [`MemoryKvClient`]: crate::MemoryKvClient
#[cfg_attr(test, automock)]
#[async_trait]
pub trait KvClient: Send + Sync + 'static {
    /// Reads the value at `key`. `None` when the key is absent.
    async fn get(
        &self,
        key: &str,
    ) -> Result<Option<Vec<u8>>>;

    /// Atomically writes `value` only when `key` is absent, with a
    /// millisecond-precision expiry. Returns `false` when the key was
    /// already present.
    async fn set_if_absent(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<bool>;

    /// Writes `value` at `key` unconditionally, with a second-precision
    /// expiry.
    async fn set_with_expiry(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<()>;

    /// Deletes `key`. Deleting an absent key succeeds.
    async fn delete(
        &self,
        key: &str,
    ) -> Result<()>;
}
