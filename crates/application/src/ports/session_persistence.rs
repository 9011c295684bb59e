//! Session state persistence port

use async_trait::async_trait;
use tether_domain::AuthState;

use super::StorageError;

/// Persists [`AuthState`] across restarts.
#[async_trait]
pub trait SessionPersistence: Send + Sync {
    /// Loads the last saved state.
    ///
    /// Returns `None` if nothing has been saved yet.
    ///
    /// # Errors
    /// Returns an error if saved state exists but cannot be read.
    async fn load(&self) -> Result<Option<AuthState>, StorageError>;

    /// Saves the current state.
    ///
    /// # Errors
    /// Returns an error if the state cannot be written.
    async fn save(&self, state: &AuthState) -> Result<(), StorageError>;
}
