//! Implementation of `jutsu publish`.
//!
//! Publishing runs as a fixed sequence of steps. Every step must succeed
//! before the next starts, and nothing is uploaded until the registry has
//! accepted the name/version and the wallet can pay for the update.

use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::core::{Address, ConfigDescriptor, ContentAddress, JutsuError};
use crate::registry::{
    functions, publish_check_outputs, AbiRequest, RegistryClient, TxReceipt, PLACEHOLDER_CID,
};
use crate::store::ContentStore;
use crate::transfer::{publish_tree, TransferError};

/// Steps of a publish, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PublishStep {
    Validate,
    Precheck,
    Estimate,
    Transfer,
    Commit,
    Finalize,
}

impl fmt::Display for PublishStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PublishStep::Validate => "validate",
            PublishStep::Precheck => "precheck",
            PublishStep::Estimate => "estimate",
            PublishStep::Transfer => "transfer",
            PublishStep::Commit => "commit",
            PublishStep::Finalize => "finalize",
        };
        f.write_str(s)
    }
}

/// Options for publishing.
#[derive(Debug, Clone)]
pub struct PublishOptions {
    pub project_root: PathBuf,

    /// Account the registry entry is published from
    pub publisher: Option<Address>,
}

/// A completed publish.
#[derive(Debug, Clone)]
pub struct PublishReport {
    pub name: String,
    pub version: String,
    pub address: ContentAddress,
    pub receipt: TxReceipt,
    /// Estimated cost of the registry update, in wei
    pub cost: u128,
}

/// Publish the project, ignoring step notifications.
pub fn publish(
    registry: &dyn RegistryClient,
    store: &dyn ContentStore,
    opts: &PublishOptions,
) -> Result<PublishReport> {
    publish_with(registry, store, opts, &mut |_| {})
}

/// Publish the project, reporting each step to `on_step` as it starts.
pub fn publish_with(
    registry: &dyn RegistryClient,
    store: &dyn ContentStore,
    opts: &PublishOptions,
    on_step: &mut dyn FnMut(PublishStep),
) -> Result<PublishReport> {
    let mut enter = |step: PublishStep| {
        tracing::debug!("publish step: {}", step);
        on_step(step);
    };

    enter(PublishStep::Validate);
    let descriptor = ConfigDescriptor::load(&opts.project_root)?;
    descriptor.validate()?;
    let publisher = opts
        .publisher
        .clone()
        .ok_or_else(|| JutsuError::Configuration {
            message: "No wallet address was found. Please add WALLET_ADDRESS=<your wallet address> to the .env file.".to_string(),
        })?;
    store.ensure_ready().map_err(JutsuError::from)?;
    let name = descriptor.name.trim().to_string();
    let version = descriptor.version.trim().to_string();

    enter(PublishStep::Precheck);
    precheck(registry, &name, &version, &publisher)?;

    enter(PublishStep::Estimate);
    let cost = estimate(registry, &name, &version, &publisher)?;

    enter(PublishStep::Transfer);
    let address = publish_tree(store, &opts.project_root, &name).map_err(|e| match e {
        TransferError::Store(store_err) => anyhow::Error::from(JutsuError::from(store_err)),
        TransferError::MissingRequired { path } => JutsuError::Configuration {
            message: format!("{} not found; nothing to publish", path.display()),
        }
        .into(),
        other => anyhow::Error::from(other),
    })?;
    tracing::info!("uploaded {}@{} as {}", name, version, address);

    enter(PublishStep::Commit);
    let request = AbiRequest::new(functions::PUBLISH_PROJECT)
        .string("name", &name)
        .string("version", &version)
        .string("ipfs", address.as_str());
    let receipt = registry
        .post(&request, &publisher)
        .map_err(JutsuError::from)
        .with_context(|| format!("failed to register {}@{}", name, version))?;

    enter(PublishStep::Finalize);
    tracing::info!(
        "published {}@{} in transaction {}",
        name,
        version,
        receipt.transaction_hash
    );

    Ok(PublishReport {
        name,
        version,
        address,
        receipt,
        cost,
    })
}

fn precheck(
    registry: &dyn RegistryClient,
    name: &str,
    version: &str,
    publisher: &Address,
) -> Result<(), JutsuError> {
    let request = AbiRequest::new(functions::PUBLISH_CHECK)
        .string("name", name)
        .string("version", version)
        .address("from", publisher.clone());
    let response = registry.get(&request, &publish_check_outputs())?;

    if !response.get_bool("valid")? {
        let reason = response.get_string("msg")?;
        return Err(JutsuError::PublishRejected {
            reason: if reason.is_empty() {
                format!("{}@{} cannot be published", name, version)
            } else {
                reason.to_string()
            },
        });
    }
    Ok(())
}

fn estimate(
    registry: &dyn RegistryClient,
    name: &str,
    version: &str,
    publisher: &Address,
) -> Result<u128, JutsuError> {
    // The real address is unknown until upload; the placeholder has the
    // same length, so the estimate holds.
    let request = AbiRequest::new(functions::PUBLISH_PROJECT)
        .string("name", name)
        .string("version", version)
        .string("cid", PLACEHOLDER_CID);
    let cost = registry.estimate_post(&request, publisher)?;
    let balance = registry.balance(publisher)?;
    tracing::debug!("publish cost {} wei, balance {} wei", cost, balance);

    if balance < cost {
        return Err(JutsuError::InsufficientFunds {
            balance,
            required: cost,
        });
    }
    Ok(cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalStore;
    use crate::test_support::{fixtures, CountingStore, FakeRegistry};
    use crate::transfer::install_tree;
    use crate::util::fs::list_files;
    use tempfile::TempDir;

    fn options(root: PathBuf) -> PublishOptions {
        PublishOptions {
            project_root: root,
            publisher: Some(FakeRegistry::owner()),
        }
    }

    #[test]
    fn test_publish_registers_uploaded_address() {
        let tmp = TempDir::new().unwrap();
        let root = fixtures::component_project(tmp.path(), "ERC20", "1.0.0");
        let store = CountingStore::new(LocalStore::new(tmp.path().join("store")));
        let registry = FakeRegistry::new();

        let mut steps = Vec::new();
        let report =
            publish_with(&registry, &store, &options(root), &mut |s| steps.push(s)).unwrap();

        assert_eq!(
            steps,
            vec![
                PublishStep::Validate,
                PublishStep::Precheck,
                PublishStep::Estimate,
                PublishStep::Transfer,
                PublishStep::Commit,
                PublishStep::Finalize,
            ]
        );
        assert_eq!(report.name, "ERC20");
        assert_eq!(store.uploads(), 1);
        assert_eq!(registry.published(), vec![("ERC20".to_string(), "1.0.0".to_string(), report.address.to_string())]);
    }

    #[test]
    fn test_publish_then_add_round_trip() {
        let tmp = TempDir::new().unwrap();
        let root = fixtures::component_project(tmp.path(), "ERC20", "1.0.0");
        let store = LocalStore::new(tmp.path().join("store"));
        let registry = FakeRegistry::new();

        let report = publish(&registry, &store, &options(root.clone())).unwrap();

        let dest = tmp.path().join("consumer").join("src").join("ERC20");
        install_tree(&store, &report.address, &dest).unwrap();

        let installed = list_files(&dest).unwrap();
        assert!(installed.contains(&PathBuf::from("config.json")));
        assert!(installed.contains(&PathBuf::from("src/ERC20.sol")));
        assert!(!installed.iter().any(|p| p.starts_with(".env")));
    }

    #[test]
    fn test_insufficient_balance_halts_before_upload() {
        let tmp = TempDir::new().unwrap();
        let root = fixtures::component_project(tmp.path(), "ERC20", "1.0.0");
        let store = CountingStore::new(LocalStore::new(tmp.path().join("store")));
        let registry = FakeRegistry::new();
        registry.set_balance(10);
        registry.set_cost(11);

        let mut last = None;
        let err = publish_with(&registry, &store, &options(root), &mut |s| last = Some(s))
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<JutsuError>(),
            Some(JutsuError::InsufficientFunds {
                balance: 10,
                required: 11
            })
        ));
        assert_eq!(last, Some(PublishStep::Estimate));
        assert_eq!(store.uploads(), 0);
        assert!(registry.published().is_empty());
    }

    #[test]
    fn test_precheck_rejection_carries_reason() {
        let tmp = TempDir::new().unwrap();
        let root = fixtures::component_project(tmp.path(), "ERC20", "1.0.0");
        let store = CountingStore::new(LocalStore::new(tmp.path().join("store")));
        let registry = FakeRegistry::new();
        registry.reject_precheck("version already exists");

        let err = publish(&registry, &store, &options(root)).unwrap_err();
        match err.downcast_ref::<JutsuError>() {
            Some(JutsuError::PublishRejected { reason }) => {
                assert_eq!(reason, "version already exists")
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(store.uploads(), 0);
    }

    #[test]
    fn test_missing_descriptor_is_configuration_error() {
        let tmp = TempDir::new().unwrap();
        let store = CountingStore::new(LocalStore::new(tmp.path().join("store")));
        let registry = FakeRegistry::new();

        let err = publish(&registry, &store, &options(tmp.path().to_path_buf())).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<JutsuError>(),
            Some(JutsuError::Configuration { .. })
        ));
        assert!(err.to_string().contains("config.json file not found"));
        assert_eq!(registry.calls(), 0);
    }

    #[test]
    fn test_missing_publisher_is_configuration_error() {
        let tmp = TempDir::new().unwrap();
        let root = fixtures::component_project(tmp.path(), "ERC20", "1.0.0");
        let store = CountingStore::new(LocalStore::new(tmp.path().join("store")));
        let registry = FakeRegistry::new();

        let err = publish(
            &registry,
            &store,
            &PublishOptions {
                project_root: root,
                publisher: None,
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("WALLET_ADDRESS"));
        assert_eq!(registry.calls(), 0);
    }

    #[test]
    fn test_missing_pinning_token_halts_before_registry() {
        use crate::store::pinning::{DEFAULT_API_URL, DEFAULT_GATEWAY_URL, DEFAULT_PIN_URL};
        use crate::store::PinningStore;
        use std::time::Duration;
        use url::Url;

        let tmp = TempDir::new().unwrap();
        let root = fixtures::component_project(tmp.path(), "ERC20", "1.0.0");
        let store = PinningStore::new(
            Url::parse(DEFAULT_PIN_URL).unwrap(),
            Url::parse(DEFAULT_API_URL).unwrap(),
            Url::parse(DEFAULT_GATEWAY_URL).unwrap(),
            None,
            Duration::from_secs(1),
        )
        .unwrap();
        let registry = FakeRegistry::new();

        let mut steps = Vec::new();
        let err = publish_with(&registry, &store, &options(root), &mut |step| steps.push(step))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<JutsuError>(),
            Some(JutsuError::Configuration { .. })
        ));
        assert!(err.to_string().contains("PINATA_JWT"));
        assert_eq!(steps, vec![PublishStep::Validate]);
        assert_eq!(registry.calls(), 0);
    }

    #[test]
    fn test_empty_version_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let root = fixtures::component_project(tmp.path(), "ERC20", "");
        let store = CountingStore::new(LocalStore::new(tmp.path().join("store")));
        let registry = FakeRegistry::new();

        let err = publish(&registry, &store, &options(root)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<JutsuError>(),
            Some(JutsuError::Configuration { .. })
        ));
    }

    #[test]
    fn test_estimate_uses_placeholder_address() {
        let tmp = TempDir::new().unwrap();
        let root = fixtures::component_project(tmp.path(), "ERC20", "1.0.0");
        let store = LocalStore::new(tmp.path().join("store"));
        let registry = FakeRegistry::new();

        publish(&registry, &store, &options(root)).unwrap();
        let estimated = registry.last_estimate().unwrap();
        assert_eq!(estimated.function, functions::PUBLISH_PROJECT);
        assert!(estimated
            .args
            .contains(&crate::registry::AbiValue::String(PLACEHOLDER_CID.to_string())));
    }
}
