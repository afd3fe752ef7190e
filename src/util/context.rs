//! Global context for Jutsu operations.
//!
//! Provides centralized access to configuration, paths, credentials and
//! the collaborators (registry, content store, compiler, chain) built from
//! them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use url::Url;

use crate::chain::{JsonRpcChain, DEFAULT_RPC_URL};
use crate::compiler::SolcCompiler;
use crate::core::{Address, JutsuError, DESCRIPTOR_NAME};
use crate::registry::{HttpRegistry, RegistryClient};
use crate::store::pinning::{DEFAULT_API_URL, DEFAULT_GATEWAY_URL, DEFAULT_PIN_URL};
use crate::store::{ContentStore, LocalStore, PinningStore};
use crate::util::config::{global_config_path, load_config, project_config_path, Config};
use crate::util::fs::find_ancestor_with;

/// Registry contract used when none is configured.
pub const DEFAULT_REGISTRY_CONTRACT: &str = "0xaDA14aaF760bB06CdFF369FD47240d5352aBca63";

/// Variables read from the project's `.env`.
pub mod env_keys {
    pub const WALLET_ADDRESS: &str = "WALLET_ADDRESS";
    pub const PINATA_JWT: &str = "PINATA_JWT";
    pub const CUSTOM_RPC: &str = "CUSTOM_RPC";
}

/// Credentials and network endpoints from `.env` and the process
/// environment. Process variables win over the file.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// Read `<project_root>/.env`, then overlay the process environment.
    pub fn load(project_root: Option<&Path>) -> Result<Self> {
        let mut vars = BTreeMap::new();

        if let Some(path) = project_root.map(|root| root.join(".env")) {
            if path.is_file() {
                let iter = dotenv::from_path_iter(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                for item in iter {
                    let (key, value) =
                        item.with_context(|| format!("failed to parse {}", path.display()))?;
                    vars.insert(key, value);
                }
                tracing::debug!("loaded {}", path.display());
            }
        }

        vars.extend(std::env::vars());
        Ok(Environment { vars })
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Environment {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// A non-empty variable.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// The publisher/deployer identity.
    pub fn wallet_address(&self) -> Result<Address, JutsuError> {
        let raw = self
            .get(env_keys::WALLET_ADDRESS)
            .ok_or_else(|| JutsuError::Configuration {
                message: "No wallet address was found. Please add WALLET_ADDRESS=<your wallet address> to the .env file.".to_string(),
            })?;
        raw.parse().map_err(|e| JutsuError::Configuration {
            message: format!("WALLET_ADDRESS is invalid: {:#}", e),
        })
    }
}

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Nearest ancestor of `cwd` holding a config.json
    project_root: Option<PathBuf>,

    /// Merged tool configuration
    config: Config,

    /// Credentials and endpoints
    env: Environment,
}

impl GlobalContext {
    /// Create a new GlobalContext for the current directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Self::with_cwd(cwd)
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        let project_root = find_ancestor_with(&cwd, DESCRIPTOR_NAME);
        let config_base = project_root.as_deref().unwrap_or(&cwd);
        let config = load_config(
            global_config_path().as_deref(),
            &project_config_path(config_base),
        );
        let env = Environment::load(project_root.as_deref())?;

        Ok(GlobalContext {
            cwd,
            project_root,
            config,
            env,
        })
    }

    /// Apply command-line / environment overrides on top of file config.
    pub fn with_overrides(mut self, overrides: Config) -> Self {
        self.config.merge(overrides);
        self
    }

    /// Replace the loaded environment.
    pub fn with_env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// The project root, or a configuration error outside a project.
    pub fn project_root(&self) -> Result<&Path, JutsuError> {
        self.project_root
            .as_deref()
            .ok_or_else(|| JutsuError::Configuration {
                message: format!("{} file not found", DESCRIPTOR_NAME),
            })
    }

    /// Resolve `path` against the working directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    /// Registry client for the configured gateway.
    pub fn registry(&self) -> Result<Box<dyn RegistryClient>> {
        let raw = self
            .config
            .registry
            .url
            .as_deref()
            .ok_or_else(|| JutsuError::Configuration {
                message: "no registry configured; set [registry] url in .jutsu/config.toml or JUTSU_REGISTRY_URL".to_string(),
            })?;
        let url = Url::parse(raw).with_context(|| format!("invalid registry url `{}`", raw))?;

        let contract = self
            .config
            .registry
            .contract
            .as_deref()
            .unwrap_or(DEFAULT_REGISTRY_CONTRACT);
        let contract: Address = contract
            .parse()
            .with_context(|| format!("invalid registry contract `{}`", contract))?;

        Ok(Box::new(HttpRegistry::new(
            url,
            Some(contract),
            self.config.timeout(),
        )?))
    }

    /// Content store: local when `[store] path` is set, pinning otherwise.
    pub fn store(&self) -> Result<Box<dyn ContentStore>> {
        let store = &self.config.store;
        if let Some(ref path) = store.path {
            let base = self.project_root.as_deref().unwrap_or(&self.cwd);
            let root = if path.is_absolute() {
                path.clone()
            } else {
                base.join(path)
            };
            tracing::debug!("using local store at {}", root.display());
            return Ok(Box::new(LocalStore::new(root)));
        }

        let parse = |raw: Option<&str>, default: &str| -> Result<Url> {
            let raw = raw.unwrap_or(default);
            Url::parse(raw).with_context(|| format!("invalid store url `{}`", raw))
        };

        Ok(Box::new(PinningStore::new(
            parse(store.pin_url.as_deref(), DEFAULT_PIN_URL)?,
            parse(store.api_url.as_deref(), DEFAULT_API_URL)?,
            parse(store.gateway_url.as_deref(), DEFAULT_GATEWAY_URL)?,
            self.env.get(env_keys::PINATA_JWT).map(str::to_string),
            self.config.timeout(),
        )?))
    }

    /// Solidity compiler.
    pub fn compiler(&self) -> Result<SolcCompiler> {
        Ok(SolcCompiler::discover(self.config.compiler.solc.as_deref())?)
    }

    /// Chain client for the RPC URL stored in the `network` variable.
    pub fn chain(&self, network: &str) -> Result<JsonRpcChain> {
        let raw = self.env.get(network).ok_or_else(|| JutsuError::Configuration {
            message: "The network was not found, please add YOUR_NETWORK_RPC=<rpc url> to the .env file".to_string(),
        })?;
        let url = Url::parse(raw).with_context(|| format!("invalid RPC url in {}", network))?;
        if raw == DEFAULT_RPC_URL {
            tracing::debug!("deploying to the local node");
        }
        Ok(JsonRpcChain::new(url, self.config.timeout())?)
    }
}
