use std::sync::Arc;
use std::time::Duration;

use nanoid::nanoid;
use tokio::time::sleep;
use tokio::time::Instant;
use tracing::debug;
use tracing::warn;

use crate::metrics::LOCK_HOLD_DURATION_METRIC;
use crate::metrics::LOCK_RETRY_METRIC;
use crate::KvClient;
use crate::Result;
use crate::SessionStoreConfig;

/// Proof of a single lock acquisition.
///
/// Bound to the lock key and the random token stored there. Only the holder
/// of the guard can release the lock, and release verifies the stored token
/// first, so a lock that expired and was re-acquired elsewhere is never
/// deleted out from under its new holder.
#[derive(Debug)]
pub struct LockGuard {
    key: String,
    token: String,
    acquired_at: Instant,
}

impl LockGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Acquires and releases short-lived, token-verified locks in the
/// key-value store.
///
/// No lock state lives in the process: ownership is entirely the token
/// stored at the lock key, which serializes writers to the same session
/// across process boundaries. The lock's own expiry is the only timeout.
pub struct LockManager<C> {
    client: Arc<C>,
    lock_expiry: Duration,
    retry_time: Duration,
}

impl<C: KvClient> LockManager<C> {
    pub fn new(
        client: Arc<C>,
        config: &SessionStoreConfig,
    ) -> Self {
        Self {
            client,
            lock_expiry: config.lock_expiry(),
            retry_time: config.retry_time(),
        }
    }

    /// Acquires the lock at `key`, waiting out the current holder if
    /// necessary.
    ///
    /// Retries the conditional write with a fixed delay and a fresh token
    /// per attempt until it succeeds. There is no maximum attempt count;
    /// the competing lock's own expiry bounds the wait. Store errors abort
    /// immediately without retrying.
    pub async fn acquire(
        &self,
        key: &str,
    ) -> Result<LockGuard> {
        loop {
            let token = nanoid!();
            let acquired = self
                .client
                .set_if_absent(key, token.clone().into_bytes(), self.lock_expiry)
                .await?;

            if acquired {
                debug!("acquired lock {}", key);
                return Ok(LockGuard {
                    key: key.to_string(),
                    token,
                    acquired_at: Instant::now(),
                });
            }

            LOCK_RETRY_METRIC.inc();
            debug!("lock {} held elsewhere, retrying in {:?}", key, self.retry_time);
            sleep(self.retry_time).await;
        }
    }

    /// Releases a previously acquired lock.
    ///
    /// Best-effort: the outcome is not surfaced. Failures are logged and
    /// swallowed, and a lock that could not be deleted expires on its own.
    pub async fn release(
        &self,
        guard: LockGuard,
    ) {
        LOCK_HOLD_DURATION_METRIC.observe(guard.acquired_at.elapsed().as_secs_f64() * 1000.0);

        let owned = match self.client.get(&guard.key).await {
            Ok(stored) => stored.as_deref() == Some(guard.token.as_bytes()),
            Err(err) => {
                debug!("lock {} ownership check failed ({}), deleting anyway", guard.key, err);
                true
            }
        };

        if !owned {
            debug!("lock {} re-acquired by another holder, leaving it", guard.key);
            return;
        }

        if let Err(err) = self.client.delete(&guard.key).await {
            warn!("failed to release lock {}: {}", guard.key, err);
        }
    }
}
