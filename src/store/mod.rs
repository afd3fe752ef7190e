//! Content-addressed storage for published component trees.

pub mod local;
pub mod pinning;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{ContentAddress, JutsuError};

pub use local::LocalStore;
pub use pinning::PinningStore;

/// Whether a store entry is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// One child of a stored directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreEntry {
    pub name: String,
    pub kind: EntryKind,
    pub address: ContentAddress,
}

/// Content store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no content at {address}")]
    Missing { address: ContentAddress },

    #[error("{address} is not a directory")]
    NotADirectory { address: ContentAddress },

    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("content store request failed: {message}")]
    Transport { message: String },

    #[error("content store rejected the upload: {message}")]
    Rejected { message: String },

    #[error("{message}")]
    Unconfigured { message: String },
}

impl From<StoreError> for JutsuError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unconfigured { message } => JutsuError::Configuration { message },
            other => JutsuError::Collaborator {
                collaborator: "content store",
                message: other.to_string(),
            },
        }
    }
}

/// A content-addressed blob and directory store.
pub trait ContentStore: Send + Sync {
    /// Check that the store has the credentials it needs to upload.
    fn ensure_ready(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Upload the directory tree at `dir`, tagged with `name`, and return
    /// the address of its root.
    fn upload(&self, dir: &Path, name: &str) -> Result<ContentAddress, StoreError>;

    /// List the direct children of the directory at `address`.
    fn list(&self, address: &ContentAddress) -> Result<Vec<StoreEntry>, StoreError>;

    /// Read the bytes of the file at `address`.
    fn read(&self, address: &ContentAddress) -> Result<Vec<u8>, StoreError>;
}

impl<S: ContentStore + ?Sized> ContentStore for &S {
    fn ensure_ready(&self) -> Result<(), StoreError> {
        (**self).ensure_ready()
    }

    fn upload(&self, dir: &Path, name: &str) -> Result<ContentAddress, StoreError> {
        (**self).upload(dir, name)
    }

    fn list(&self, address: &ContentAddress) -> Result<Vec<StoreEntry>, StoreError> {
        (**self).list(address)
    }

    fn read(&self, address: &ContentAddress) -> Result<Vec<u8>, StoreError> {
        (**self).read(address)
    }
}
