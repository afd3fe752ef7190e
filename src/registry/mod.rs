//! Package registry.
//!
//! The registry is an on-chain contract mapping component names and
//! versions to content addresses. This module defines the call shapes the
//! tool uses, the [`RegistryClient`] collaborator that performs them and
//! the [`PackageResolver`] that turns a [`PackageRef`] into an address.

pub mod abi;
pub mod gateway;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{Address, ContentAddress, JutsuError, PackageRef, RegistryRecord};

pub use abi::{AbiParam, AbiRequest, AbiResponse, AbiType, AbiValue};
pub use gateway::HttpRegistry;

/// Registry contract function names.
pub mod functions {
    pub const GET_CID_BY_VERSION: &str = "getCIDByVersion";
    pub const GET_PROJECT: &str = "getProject";
    pub const PUBLISH_CHECK: &str = "publishCheck";
    pub const PUBLISH_PROJECT: &str = "publishProject";
}

/// Content address used when estimating the cost of a publish before the
/// real content has been uploaded.
pub const PLACEHOLDER_CID: &str = "QmRGu24KzQ53vrNpyPJTxfS3fyaXZmsHnZfcN8MArab3i2";

/// Registry failures.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The contract reverted the call.
    #[error("registry call `{function}` reverted: {reason}")]
    Reverted { function: String, reason: String },

    #[error("registry request failed: {message}")]
    Transport { message: String },

    #[error("unexpected registry response: {message}")]
    Decode { message: String },

    #[error("registry value `{name}` is not a valid {expected}: {found}")]
    TypeMismatch {
        name: String,
        expected: AbiType,
        found: String,
    },
}

impl From<RegistryError> for JutsuError {
    fn from(err: RegistryError) -> Self {
        JutsuError::Collaborator {
            collaborator: "registry",
            message: err.to_string(),
        }
    }
}

/// Receipt of a state-changing registry call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: String,
    #[serde(default)]
    pub block_number: Option<u64>,
}

/// A client able to read from and write to the registry contract.
///
/// Implementations own encoding, transport and decoding; callers only deal
/// in typed requests and responses.
pub trait RegistryClient: Send + Sync {
    /// Read-only call, decoded against `outputs`.
    fn get(&self, request: &AbiRequest, outputs: &[AbiParam]) -> Result<AbiResponse, RegistryError>;

    /// State-changing call issued on behalf of `from`.
    fn post(&self, request: &AbiRequest, from: &Address) -> Result<TxReceipt, RegistryError>;

    /// Cost, in wei, of issuing `request` as a post from `from`.
    fn estimate_post(&self, request: &AbiRequest, from: &Address) -> Result<u128, RegistryError>;

    /// Balance, in wei, of `address`.
    fn balance(&self, address: &Address) -> Result<u128, RegistryError>;
}

/// Declared return shape of `getCIDByVersion`.
pub fn cid_outputs() -> Vec<AbiParam> {
    vec![AbiParam::new("cid", AbiType::String)]
}

/// Declared return shape of `getProject`.
pub fn project_outputs() -> Vec<AbiParam> {
    vec![
        AbiParam::new("projectId", AbiType::Uint256),
        AbiParam::new("projectName", AbiType::String),
        AbiParam::new("projectOwner", AbiType::Address),
        AbiParam::new("projectVersion", AbiType::String),
        AbiParam::new("projectCID", AbiType::String),
    ]
}

/// Declared return shape of `publishCheck`.
pub fn publish_check_outputs() -> Vec<AbiParam> {
    vec![
        AbiParam::new("valid", AbiType::Bool),
        AbiParam::new("msg", AbiType::String),
    ]
}

/// Outcome of resolving a package reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The package exists. `record` is reported when the latest release
    /// was looked up.
    Found {
        address: ContentAddress,
        record: Option<RegistryRecord>,
    },
    NotFound,
}

impl Resolution {
    pub fn address(&self) -> Option<&ContentAddress> {
        match self {
            Resolution::Found { address, .. } => Some(address),
            Resolution::NotFound => None,
        }
    }
}

/// Resolves package references against a registry.
pub struct PackageResolver<'a> {
    registry: &'a dyn RegistryClient,
}

impl<'a> PackageResolver<'a> {
    pub fn new(registry: &'a dyn RegistryClient) -> Self {
        PackageResolver { registry }
    }

    /// Look up the content address of `package`.
    ///
    /// A missing package is a normal outcome ([`Resolution::NotFound`]);
    /// only transport and decoding problems are errors.
    pub fn resolve(&self, package: &PackageRef) -> Result<Resolution, RegistryError> {
        match &package.version {
            Some(version) => self.resolve_version(&package.name, version),
            None => self.resolve_latest(&package.name),
        }
    }

    fn resolve_version(&self, name: &str, version: &str) -> Result<Resolution, RegistryError> {
        tracing::debug!("looking up {}@{}", name, version);
        let request = AbiRequest::new(functions::GET_CID_BY_VERSION)
            .string("name", name)
            .string("version", version);

        let response = match self.registry.get(&request, &cid_outputs()) {
            Ok(response) => response,
            Err(RegistryError::Reverted { reason, .. }) => {
                tracing::debug!("{}@{} not registered: {}", name, version, reason);
                return Ok(Resolution::NotFound);
            }
            Err(e) => return Err(e),
        };

        let cid = response.get_string("cid")?;
        if cid.is_empty() {
            return Ok(Resolution::NotFound);
        }

        Ok(Resolution::Found {
            address: ContentAddress::new(cid),
            record: None,
        })
    }

    fn resolve_latest(&self, name: &str) -> Result<Resolution, RegistryError> {
        tracing::debug!("looking up latest {}", name);
        let request = AbiRequest::new(functions::GET_PROJECT).string("name", name);

        let response = match self.registry.get(&request, &project_outputs()) {
            Ok(response) => response,
            Err(RegistryError::Reverted { reason, .. }) => {
                tracing::debug!("{} not registered: {}", name, reason);
                return Ok(Resolution::NotFound);
            }
            Err(e) => return Err(e),
        };

        let cid = response.get_string("projectCID")?;
        if cid.is_empty() {
            return Ok(Resolution::NotFound);
        }

        let address = ContentAddress::new(cid);
        let record = RegistryRecord {
            id: response.get_uint("projectId")?.to_string(),
            name: response.get_string("projectName")?.to_string(),
            owner: response.get_address("projectOwner")?.clone(),
            version: response.get_string("projectVersion")?.to_string(),
            content_address: address.clone(),
        };

        Ok(Resolution::Found {
            address,
            record: Some(record),
        })
    }
}
