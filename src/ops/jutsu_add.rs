//! Implementation of `jutsu add`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::{ContentAddress, PackageRef, RegistryRecord};
use crate::registry::{PackageResolver, RegistryClient, Resolution};
use crate::store::ContentStore;
use crate::transfer::{install_tree, InstallReport, SOURCE_DIR};

/// Options for adding a component.
#[derive(Debug, Clone)]
pub struct AddOptions {
    /// Component to install
    pub package: PackageRef,

    /// Project receiving the component
    pub project_root: PathBuf,
}

/// Outcome of `add`.
#[derive(Debug, Clone)]
pub enum AddResult {
    Installed {
        package: PackageRef,
        address: ContentAddress,
        /// Present when the latest release was looked up
        record: Option<RegistryRecord>,
        dest: PathBuf,
        report: InstallReport,
    },
    NotFound {
        package: PackageRef,
    },
}

/// Where a component is installed inside a project.
pub fn install_dir(project_root: &Path, name: &str) -> PathBuf {
    project_root.join(SOURCE_DIR).join(name)
}

/// Resolve a component and install its tree under `src/<name>`.
pub fn add(
    registry: &dyn RegistryClient,
    store: &dyn ContentStore,
    opts: &AddOptions,
) -> Result<AddResult> {
    let package = &opts.package;
    tracing::info!("resolving {}", package);

    let resolution = PackageResolver::new(registry)
        .resolve(package)
        .with_context(|| format!("failed to resolve `{}`", package))?;

    let (address, record) = match resolution {
        Resolution::Found { address, record } => (address, record),
        Resolution::NotFound => {
            return Ok(AddResult::NotFound {
                package: package.clone(),
            })
        }
    };

    if let Some(ref record) = record {
        tracing::info!("latest {} is {}", record.name, record.version);
    }

    let dest = install_dir(&opts.project_root, &package.name);
    let report = install_tree(store, &address, &dest)
        .with_context(|| format!("failed to install `{}` from {}", package, address))?;

    Ok(AddResult::Installed {
        package: package.clone(),
        address,
        record,
        dest,
        report,
    })
}
