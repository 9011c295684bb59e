//! File-backed token store.

use std::path::Path;

use async_trait::async_trait;
use tether_application::ports::{StorageError, TokenStore};
use tether_domain::TokenSet;

use super::json_file::JsonFile;

/// File name of the stored token set.
pub const TOKENS_FILE: &str = "tokens.json";

/// Keeps the [`TokenSet`] in `tokens.json`, readable only by the owner.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    file: JsonFile,
}

impl FileTokenStore {
    /// Creates a store inside `dir`.
    #[must_use]
    pub fn new(dir: &Path) -> Self {
        Self {
            file: JsonFile::new(dir.join(TOKENS_FILE)).private(),
        }
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn save(&self, tokens: &TokenSet) -> Result<(), StorageError> {
        self.file.write(tokens).await
    }

    async fn get(&self) -> Result<Option<TokenSet>, StorageError> {
        self.file.read().await
    }

    async fn remove(&self) -> Result<(), StorageError> {
        self.file.remove().await
    }
}
