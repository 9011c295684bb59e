//! Token store port
//!
//! Defines the durable storage contract for the session credentials.

use async_trait::async_trait;
use tether_domain::TokenSet;

/// Errors that can occur while reading or writing persisted data.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Durable storage for the session's [`TokenSet`].
///
/// Implementations must survive process restarts. The store is shared by
/// every flow; concurrent writers resolve as last-writer-wins.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Replaces the stored token set.
    ///
    /// # Errors
    /// Returns an error if the tokens cannot be written.
    async fn save(&self, tokens: &TokenSet) -> Result<(), StorageError>;

    /// Loads the stored token set, if any.
    ///
    /// # Errors
    /// Returns an error if the store exists but cannot be read.
    async fn get(&self) -> Result<Option<TokenSet>, StorageError>;

    /// Removes the stored token set.
    ///
    /// Removing from an empty store succeeds.
    ///
    /// # Errors
    /// Returns an error if the tokens cannot be removed.
    async fn remove(&self) -> Result<(), StorageError>;
}
