//! Content transfer between the project tree and a content store.
//!
//! Install materializes a stored tree under a destination directory;
//! publish snapshots the whitelisted parts of a project and uploads them.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tempfile::TempDir;
use thiserror::Error;

use crate::core::{ContentAddress, DESCRIPTOR_NAME};
use crate::store::{ContentStore, EntryKind, StoreEntry, StoreError};
use crate::util::fs::{copy_dir_all, list_files};

/// Directory holding component sources, both published and installed.
pub const SOURCE_DIR: &str = "src";

pub const README: &str = "README.md";

/// Transfer failures.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("refusing to install entry with unsafe name `{name}`")]
    UnsafeEntryName { name: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to write {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "failed to write {}; the previous install was left at {}",
        .path.display(),
        .backup.display()
    )]
    Stranded {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} not found", .path.display())]
    MissingRequired { path: PathBuf },

    #[error("failed to stage snapshot: {message}")]
    Snapshot { message: String },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> TransferError + '_ {
    move |source| TransferError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Totals for an install.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub files: usize,
    pub directories: usize,
    pub bytes: u64,
}

impl InstallReport {
    fn merge(self, other: InstallReport) -> InstallReport {
        InstallReport {
            files: self.files + other.files,
            directories: self.directories + other.directories,
            bytes: self.bytes + other.bytes,
        }
    }
}

/// A store entry name is a single plain path component.
pub fn is_safe_entry_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// Materialize the tree at `address` as `dest`.
///
/// The tree is assembled in a staging directory beside `dest` and moved
/// into place only once every entry has been written. An existing `dest`
/// is replaced; on failure it is left untouched.
pub fn install_tree(
    store: &dyn ContentStore,
    address: &ContentAddress,
    dest: &Path,
) -> Result<InstallReport, TransferError> {
    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(io_error(&parent))?;

    let staging = tempfile::Builder::new()
        .prefix(".jutsu-install-")
        .tempdir_in(&parent)
        .map_err(io_error(&parent))?;

    tracing::debug!("staging {} in {}", address, staging.path().display());
    let report = fetch_dir(store, address, staging.path())?;

    swap_into_place(&staging, dest)?;
    tracing::info!(
        "installed {} files ({} bytes) into {}",
        report.files,
        report.bytes,
        dest.display()
    );

    Ok(report)
}

/// Replace `dest` with the staged tree, restoring the old one on failure.
fn swap_into_place(staging: &TempDir, dest: &Path) -> Result<(), TransferError> {
    let backup = if dest.exists() {
        let backup = dest.with_file_name(format!(
            ".{}.jutsu-old",
            dest.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        ));
        if backup.exists() {
            fs::remove_dir_all(&backup).map_err(io_error(&backup))?;
        }
        fs::rename(dest, &backup).map_err(io_error(dest))?;
        Some(backup)
    } else {
        None
    };

    if let Err(source) = fs::rename(staging.path(), dest) {
        return Err(match backup {
            Some(backup) => restore_backup(&backup, dest, source),
            None => TransferError::Io {
                path: dest.to_path_buf(),
                source,
            },
        });
    }

    if let Some(backup) = backup {
        if let Err(e) = fs::remove_dir_all(&backup) {
            tracing::warn!("failed to remove {}: {}", backup.display(), e);
        }
    }
    Ok(())
}

/// Move `backup` back to `dest` after a failed swap.
fn restore_backup(backup: &Path, dest: &Path, source: std::io::Error) -> TransferError {
    match fs::rename(backup, dest) {
        Ok(()) => TransferError::Io {
            path: dest.to_path_buf(),
            source,
        },
        Err(e) => {
            tracing::warn!(
                "failed to restore {} from {}: {}",
                dest.display(),
                backup.display(),
                e
            );
            TransferError::Stranded {
                path: dest.to_path_buf(),
                backup: backup.to_path_buf(),
                source,
            }
        }
    }
}

fn fetch_dir(
    store: &dyn ContentStore,
    address: &ContentAddress,
    dir: &Path,
) -> Result<InstallReport, TransferError> {
    let entries = store.list(address)?;
    if let Some(bad) = entries.iter().find(|e| !is_safe_entry_name(&e.name)) {
        return Err(TransferError::UnsafeEntryName {
            name: bad.name.clone(),
        });
    }

    entries
        .par_iter()
        .map(|entry| fetch_entry(store, entry, dir))
        .try_reduce(InstallReport::default, |a, b| Ok(a.merge(b)))
}

fn fetch_entry(
    store: &dyn ContentStore,
    entry: &StoreEntry,
    dir: &Path,
) -> Result<InstallReport, TransferError> {
    let path = dir.join(&entry.name);
    match entry.kind {
        EntryKind::File => {
            let data = store.read(&entry.address)?;
            fs::write(&path, &data).map_err(io_error(&path))?;
            tracing::debug!("wrote {}", path.display());
            Ok(InstallReport {
                files: 1,
                directories: 0,
                bytes: data.len() as u64,
            })
        }
        EntryKind::Directory => {
            fs::create_dir_all(&path).map_err(io_error(&path))?;
            let children = fetch_dir(store, &entry.address, &path)?;
            Ok(children.merge(InstallReport {
                files: 0,
                directories: 1,
                bytes: 0,
            }))
        }
    }
}

/// Copy the publishable parts of a project into a fresh temporary
/// directory: `src/`, `config.json` and, when present, `README.md`.
pub fn stage_snapshot(project_root: &Path) -> Result<TempDir, TransferError> {
    let src = project_root.join(SOURCE_DIR);
    if !src.is_dir() {
        return Err(TransferError::MissingRequired { path: src });
    }
    let descriptor = project_root.join(DESCRIPTOR_NAME);
    if !descriptor.is_file() {
        return Err(TransferError::MissingRequired { path: descriptor });
    }

    let snapshot = tempfile::Builder::new()
        .prefix("jutsu-publish-")
        .tempdir()
        .map_err(|source| TransferError::Io {
            path: std::env::temp_dir(),
            source,
        })?;

    copy_dir_all(&src, &snapshot.path().join(SOURCE_DIR)).map_err(|e| {
        TransferError::Snapshot {
            message: format!("{:#}", e),
        }
    })?;

    let target = snapshot.path().join(DESCRIPTOR_NAME);
    fs::copy(&descriptor, &target).map_err(io_error(&target))?;

    let readme = project_root.join(README);
    if readme.is_file() {
        let target = snapshot.path().join(README);
        fs::copy(&readme, &target).map_err(io_error(&target))?;
    } else {
        tracing::warn!("{} not found, publishing without it", README);
    }

    Ok(snapshot)
}

/// Snapshot `project_root` and upload it under `name`.
pub fn publish_tree(
    store: &dyn ContentStore,
    project_root: &Path,
    name: &str,
) -> Result<ContentAddress, TransferError> {
    let snapshot = stage_snapshot(project_root)?;

    if let Ok(files) = list_files(snapshot.path()) {
        tracing::info!("uploading {} files for {}", files.len(), name);
    }

    let address = store.upload(snapshot.path(), name)?;
    tracing::debug!("{} uploaded as {}", name, address);
    Ok(address)
}
