//! On-disk content-addressed store.
//!
//! ```text
//! <root>/
//! ├── blobs/<sha256>        # file contents
//! ├── trees/<sha256>.json   # directory listings
//! └── pins/<name>           # last root uploaded under a name
//! ```
//!
//! A blob's address hashes its bytes; a tree's address hashes the names,
//! kinds and addresses of its children in name order, so identical trees
//! share an address.

use std::fs;
use std::path::{Path, PathBuf};

use super::{ContentStore, EntryKind, StoreEntry, StoreError};
use crate::core::ContentAddress;
use crate::util::hash::Fingerprint;

/// A content store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, address: &ContentAddress) -> PathBuf {
        self.root.join("blobs").join(address.as_str())
    }

    fn tree_path(&self, address: &ContentAddress) -> PathBuf {
        self.root
            .join("trees")
            .join(format!("{}.json", address.as_str()))
    }

    /// The root most recently uploaded under `name`.
    pub fn pinned(&self, name: &str) -> Option<ContentAddress> {
        fs::read_to_string(self.root.join("pins").join(name))
            .ok()
            .map(|s| ContentAddress::new(s.trim()))
    }

    fn put_blob(&self, data: &[u8]) -> Result<ContentAddress, StoreError> {
        let mut fp = Fingerprint::new("blob");
        fp.update_bytes(data);
        let address = ContentAddress::new(fp.finish());

        let path = self.blob_path(&address);
        if !path.exists() {
            write_file(&path, data)?;
        }
        Ok(address)
    }

    fn put_tree(&self, entries: &[StoreEntry]) -> Result<ContentAddress, StoreError> {
        let mut fp = Fingerprint::new("tree");
        for entry in entries {
            fp.update_str(&entry.name);
            fp.update_str(match entry.kind {
                EntryKind::File => "file",
                EntryKind::Directory => "directory",
            });
            fp.update_str(entry.address.as_str());
        }
        let address = ContentAddress::new(fp.finish());

        let path = self.tree_path(&address);
        if !path.exists() {
            let json = serde_json::to_vec_pretty(entries).map_err(|e| StoreError::Rejected {
                message: e.to_string(),
            })?;
            write_file(&path, &json)?;
        }
        Ok(address)
    }

    fn put_dir(&self, dir: &Path) -> Result<ContentAddress, StoreError> {
        let mut children = fs::read_dir(dir)
            .map_err(io_error(dir))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(io_error(dir))?;
        children.sort_by_key(|e| e.file_name());

        let mut entries = Vec::with_capacity(children.len());
        for child in children {
            let path = child.path();
            let name = child.file_name().to_string_lossy().into_owned();
            let metadata = fs::metadata(&path).map_err(io_error(&path))?;

            let entry = if metadata.is_dir() {
                StoreEntry {
                    name,
                    kind: EntryKind::Directory,
                    address: self.put_dir(&path)?,
                }
            } else {
                let data = fs::read(&path).map_err(io_error(&path))?;
                StoreEntry {
                    name,
                    kind: EntryKind::File,
                    address: self.put_blob(&data)?,
                }
            };
            entries.push(entry);
        }

        self.put_tree(&entries)
    }
}

fn write_file(path: &Path, data: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    fs::write(path, data).map_err(io_error(path))
}

impl ContentStore for LocalStore {
    fn upload(&self, dir: &Path, name: &str) -> Result<ContentAddress, StoreError> {
        let address = self.put_dir(dir)?;
        write_file(&self.root.join("pins").join(name), address.as_str().as_bytes())?;
        tracing::debug!("stored {} as {}", dir.display(), address);
        Ok(address)
    }

    fn list(&self, address: &ContentAddress) -> Result<Vec<StoreEntry>, StoreError> {
        let path = self.tree_path(address);
        if !path.is_file() {
            return Err(if self.blob_path(address).is_file() {
                StoreError::NotADirectory {
                    address: address.clone(),
                }
            } else {
                StoreError::Missing {
                    address: address.clone(),
                }
            });
        }

        let data = fs::read(&path).map_err(io_error(&path))?;
        serde_json::from_slice(&data).map_err(|e| StoreError::Rejected {
            message: format!("corrupt tree {}: {}", address, e),
        })
    }

    fn read(&self, address: &ContentAddress) -> Result<Vec<u8>, StoreError> {
        let path = self.blob_path(address);
        if !path.is_file() {
            return Err(StoreError::Missing {
                address: address.clone(),
            });
        }
        fs::read(&path).map_err(io_error(&path))
    }
}
