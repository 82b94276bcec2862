//! Session Persistence Error Hierarchy
//!
//! Transport failures from the key-value collaborator always surface to the
//! caller. Decode failures on read, lock contention and tombstone-precedence
//! aborts are resolved internally and never appear here.

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Key-value store transport failures (network, backend)
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Settings loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Session record encoding failures
    #[error("failed to encode session record: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The key-value backend failed to execute a single-key operation
    #[error("key-value {op} failed: {source}")]
    Transport {
        op: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StorageError {
    pub fn transport(
        op: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Transport {
            op,
            source: source.into(),
        }
    }
}
