//! Configuration file support for Jutsu.
//!
//! Jutsu supports two configuration file locations:
//! - Global: `~/.jutsu/config.toml` - User-wide defaults
//! - Project: `.jutsu/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. Credentials are not
//! kept here; they come from the project's `.env`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default network timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Jutsu configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Registry gateway settings
    pub registry: RegistryConfig,

    /// Content store settings
    pub store: StoreConfig,

    /// Compiler settings
    pub compiler: CompilerConfig,

    /// Network settings
    pub net: NetConfig,
}

/// Registry-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Base URL of the registry gateway
    pub url: Option<String>,

    /// Registry contract address, forwarded to the gateway
    pub contract: Option<String>,
}

/// Content store configuration.
///
/// Setting `path` selects the on-disk store; otherwise the pinning service
/// endpoints are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Pinning service upload endpoint
    pub pin_url: Option<String>,

    /// HTTP gateway for reads
    pub gateway_url: Option<String>,

    /// IPFS API used for directory listings
    pub api_url: Option<String>,

    /// Root of a local content-addressed store
    pub path: Option<PathBuf>,
}

/// Compiler configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// `solc` program name or path
    pub solc: Option<String>,
}

/// Network-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        // Registry settings
        if other.registry.url.is_some() {
            self.registry.url = other.registry.url;
        }
        if other.registry.contract.is_some() {
            self.registry.contract = other.registry.contract;
        }

        // Store settings
        if other.store.pin_url.is_some() {
            self.store.pin_url = other.store.pin_url;
        }
        if other.store.gateway_url.is_some() {
            self.store.gateway_url = other.store.gateway_url;
        }
        if other.store.api_url.is_some() {
            self.store.api_url = other.store.api_url;
        }
        if other.store.path.is_some() {
            self.store.path = other.store.path;
        }

        if other.compiler.solc.is_some() {
            self.compiler.solc = other.compiler.solc;
        }

        if other.net.timeout_secs.is_some() {
            self.net.timeout_secs = other.net.timeout_secs;
        }
    }

    /// Network timeout, falling back to the default.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.net.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.jutsu/config.toml)
/// 2. Global config (~/.jutsu/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    // Load global config first
    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }

    // Project config overrides global
    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global jutsu config directory (~/.jutsu).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".jutsu"))
}

/// Get the global config path (~/.jutsu/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.jutsu/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".jutsu").join("config.toml")
}
