//! Configuration management for the session persistence engine.
//!
//! Hierarchical loading with priority (later sources override earlier):
//! 1. Default values (hardcoded)
//! 2. Configuration file named by the `CONFIG_PATH` environment variable
//! 3. Environment variables with `SESSION__` prefix (highest priority)

#[cfg(test)]
mod config_test;

use std::env;
use std::time::Duration;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_SESSION_KEY_PREFIX;
use crate::Error;
use crate::Result;

/// Timing and key-naming parameters for a session store.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionStoreConfig {
    /// Seconds a saved session record lives in the store. Required: there
    /// is no meaningful default for session lifetime, and validation
    /// rejects the zero placeholder.
    #[serde(default)]
    pub ttl_secs: u64,

    /// Key prefix for session records.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Milliseconds a session lock lasts before expiring on its own. This
    /// bounds how long a crashed or delayed holder can block other writers.
    #[serde(default = "default_lock_expiry_ms")]
    pub lock_expiry_ms: u64,

    /// Milliseconds to wait before retrying a contended lock.
    #[serde(default = "default_retry_time_ms")]
    pub retry_time_ms: u64,

    /// Seconds a tombstone record lives. Should be at least as long as the
    /// longest request that may still hold a view of the destroyed session.
    #[serde(default = "default_delete_expiry_secs")]
    pub delete_expiry_secs: u64,
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 0,
            prefix: default_prefix(),
            lock_expiry_ms: default_lock_expiry_ms(),
            retry_time_ms: default_retry_time_ms(),
            delete_expiry_secs: default_delete_expiry_secs(),
        }
    }
}

impl SessionStoreConfig {
    /// Programmatic configuration with the given record TTL and defaults
    /// for everything else.
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl_secs,
            ..Self::default()
        }
    }

    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Type defaults (lowest priority)
    /// 2. Configuration file from `CONFIG_PATH` (if set)
    /// 3. Environment variables with `SESSION__` prefix (highest priority)
    ///
    /// Validation is deferred so further overrides can be applied via
    /// [`with_override_config`](Self::with_override_config); callers must
    /// call [`validate`](Self::validate) before using the configuration.
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("SESSION")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional overrides from a file, keeping environment
    /// variables as the highest-priority source. Does not validate.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("SESSION")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates the configuration and returns it.
    pub fn validate(self) -> Result<Self> {
        if self.ttl_secs == 0 {
            return Err(Error::Config(ConfigError::Message(
                "ttl_secs must be greater than zero".into(),
            )));
        }
        if self.lock_expiry_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "lock_expiry_ms must be greater than zero".into(),
            )));
        }
        if self.retry_time_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "retry_time_ms must be greater than zero".into(),
            )));
        }
        Ok(self)
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn lock_expiry(&self) -> Duration {
        Duration::from_millis(self.lock_expiry_ms)
    }

    pub fn retry_time(&self) -> Duration {
        Duration::from_millis(self.retry_time_ms)
    }

    pub fn delete_expiry(&self) -> Duration {
        Duration::from_secs(self.delete_expiry_secs)
    }
}

fn default_prefix() -> String {
    DEFAULT_SESSION_KEY_PREFIX.to_string()
}

fn default_lock_expiry_ms() -> u64 {
    5000
}

fn default_retry_time_ms() -> u64 {
    100
}

fn default_delete_expiry_secs() -> u64 {
    5000
}
