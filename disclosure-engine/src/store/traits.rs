//! Core trait for persistent storage.

use async_trait::async_trait;

/// Error types for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying I/O failed
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be decoded
    #[error("Store data corrupt: {0}")]
    Corrupt(String),

    /// Store refused the operation
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Asynchronous key/value store holding JSON values.
///
/// Values are whatever the store natively keeps for arrays and numbers;
/// JSON is the common denominator.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError>;

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError>;
}
