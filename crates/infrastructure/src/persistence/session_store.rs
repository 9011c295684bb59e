//! File-backed persistence of the application store.

use std::path::Path;

use async_trait::async_trait;
use tether_application::ports::{SessionPersistence, StorageError};
use tether_domain::AuthState;

use super::json_file::JsonFile;

/// File name of the persisted auth state.
pub const SESSION_FILE: &str = "session.json";

/// Keeps [`AuthState`] in `session.json`.
#[derive(Debug, Clone)]
pub struct FileSessionPersistence {
    file: JsonFile,
}

impl FileSessionPersistence {
    /// Creates a store inside `dir`.
    #[must_use]
    pub fn new(dir: &Path) -> Self {
        Self {
            file: JsonFile::new(dir.join(SESSION_FILE)),
        }
    }
}

#[async_trait]
impl SessionPersistence for FileSessionPersistence {
    async fn load(&self) -> Result<Option<AuthState>, StorageError> {
        self.file.read().await
    }

    async fn save(&self, state: &AuthState) -> Result<(), StorageError> {
        self.file.write(state).await
    }
}
