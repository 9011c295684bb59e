//! A single JSON document on disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tether_application::ports::StorageError;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::serialization::{from_json_bytes, to_json_stable_bytes};

/// JSON file written atomically through a sibling temp file.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
    private: bool,
}

impl JsonFile {
    /// Creates a handle for `path`. Nothing is touched on disk.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            private: false,
        }
    }

    /// Restricts the file to its owner on Unix.
    #[must_use]
    pub const fn private(mut self) -> Self {
        self.private = true;
        self
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and decodes the file; `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub async fn read<T: DeserializeOwned>(&self) -> Result<Option<T>, StorageError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(from_json_bytes(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Encodes and replaces the file, creating parent directories.
    ///
    /// Each call stages into its own temp file, so concurrent writers
    /// never collide and the last rename wins.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be encoded or written.
    pub async fn write<T: Serialize + Sync>(&self, value: &T) -> Result<(), StorageError> {
        let contents = to_json_stable_bytes(value)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let tmp = self.staging_path();
        if let Err(e) = self.stage(&tmp, &contents).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".{:016x}.tmp", rand::random::<u64>()));
        PathBuf::from(name)
    }

    /// Writes `contents` to a new file; private files are 0600 from creation.
    async fn stage(&self, tmp: &Path, contents: &[u8]) -> std::io::Result<()> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        if self.private {
            owner_only(&mut options);
        }
        let mut file = options.open(tmp).await?;
        file.write_all(contents).await?;
        file.sync_all().await
    }

    /// Deletes the file. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub async fn remove(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
fn owner_only(options: &mut fs::OpenOptions) {
    options.mode(0o600);
}

#[cfg(not(unix))]
const fn owner_only(_options: &mut fs::OpenOptions) {}
