//! Package references, content addresses and registry records.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use super::address::Address;

/// A component name with an optional pinned version.
///
/// Parsed from `name` or `name@version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageRef {
    pub name: String,
    pub version: Option<String>,
}

impl PackageRef {
    /// Create a reference to the latest registered version of `name`.
    pub fn latest(name: impl Into<String>) -> Self {
        PackageRef {
            name: name.into(),
            version: None,
        }
    }

    /// Create a reference pinned to `version`.
    pub fn pinned(name: impl Into<String>, version: impl Into<String>) -> Self {
        PackageRef {
            name: name.into(),
            version: Some(version.into()),
        }
    }
}

impl FromStr for PackageRef {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (name, version) = match s.split_once('@') {
            Some((name, version)) => (name, Some(version)),
            None => (s, None),
        };

        if name.is_empty() {
            bail!("component name cannot be empty in `{}`", s);
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            bail!("invalid component name `{}`", name);
        }
        if version == Some("") {
            bail!("version cannot be empty in `{}`", s);
        }

        Ok(PackageRef {
            name: name.to_string(),
            version: version.map(str::to_string),
        })
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(ref v) => write!(f, "{}@{}", self.name, v),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Immutable identifier of content in a content-addressed store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentAddress(String);

impl ContentAddress {
    pub fn new(address: impl Into<String>) -> Self {
        ContentAddress(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A project record as stored by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryRecord {
    pub id: String,
    pub name: String,
    pub owner: Address,
    pub version: String,
    pub content_address: ContentAddress,
}
