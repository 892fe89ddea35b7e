use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::StorageError;

/// Public URL prefix under which content blobs are addressable.
pub const PUBLIC_URL_PREFIX: &str = "/documents";

/// Name of a content blob, derived deterministically from the owning
/// document's id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHandle(String);

impl ContentHandle {
    pub fn for_key(key: impl std::fmt::Display) -> Self {
        Self(format!("{key}.txt"))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// File-backed store for document content blobs.
///
/// Each blob is a flat text file under `root`, named after its handle.
/// Appends are atomic per blob (a single write on a file opened in append
/// mode); [ContentStore::truncate] is *not* safe against concurrent
/// truncate/append interleavings and must be serialized by the caller.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, handle: &ContentHandle) -> PathBuf {
        self.root.join(handle.name())
    }

    /// Returns the public locator of a blob.
    pub fn url_of(&self, handle: &ContentHandle) -> String {
        format!("{PUBLIC_URL_PREFIX}/{}", handle.name())
    }

    /// Materializes an empty blob.
    ///
    /// Callers are expected to check existence beforehand; an existing blob
    /// is reported as [StorageError::AlreadyExists].
    pub async fn create(&self, handle: &ContentHandle) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.path_of(handle))
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(StorageError::AlreadyExists {
                    name: handle.name().to_owned(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Appends `text` at the end of the blob.
    pub async fn append(&self, handle: &ContentHandle, text: &str) -> Result<(), StorageError> {
        let mut file = match tokio::fs::OpenOptions::new()
            .append(true)
            .open(self.path_of(handle))
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotMaterialized {
                    name: handle.name().to_owned(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(text.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Resets the blob to zero length.
    pub async fn truncate(&self, handle: &ContentHandle) -> Result<(), StorageError> {
        match tokio::fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(self.path_of(handle))
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotMaterialized {
                    name: handle.name().to_owned(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn read(&self, handle: &ContentHandle) -> Result<String, StorageError> {
        match tokio::fs::read_to_string(self.path_of(handle)).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotMaterialized {
                    name: handle.name().to_owned(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn exists(&self, handle: &ContentHandle) -> Result<bool, StorageError> {
        Ok(tokio::fs::try_exists(self.path_of(handle)).await?)
    }

    /// Removes the blob file.
    pub async fn remove(&self, handle: &ContentHandle) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.path_of(handle)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotMaterialized {
                    name: handle.name().to_owned(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}
