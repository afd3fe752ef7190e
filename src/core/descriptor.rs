//! The project descriptor, `config.json`.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::errors::JutsuError;

/// File name of the project descriptor.
pub const DESCRIPTOR_NAME: &str = "config.json";

/// Default version for new projects.
pub const DEFAULT_VERSION: semver::Version = semver::Version::new(1, 0, 0);

/// Project metadata. Only `name` and `version` are required to publish.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigDescriptor {
    pub name: String,
    pub description: String,
    pub version: String,
    pub license: String,
    pub github: String,
}

impl ConfigDescriptor {
    /// Descriptor for a freshly scaffolded project.
    pub fn new(name: impl Into<String>) -> Self {
        ConfigDescriptor {
            name: name.into(),
            description: String::new(),
            version: DEFAULT_VERSION.to_string(),
            license: "ISC".to_string(),
            github: String::new(),
        }
    }

    /// Load `config.json` from a project root.
    pub fn load(project_root: &Path) -> Result<Self> {
        let path = project_root.join(DESCRIPTOR_NAME);
        if !path.exists() {
            return Err(JutsuError::Configuration {
                message: format!("{} file not found in {}", DESCRIPTOR_NAME, project_root.display()),
            }
            .into());
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Write `config.json` into a project root.
    pub fn save(&self, project_root: &Path) -> Result<()> {
        let path = project_root.join(DESCRIPTOR_NAME);
        let mut contents = serde_json::to_string_pretty(self)?;
        contents.push('\n');
        std::fs::write(&path, contents)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    /// Require the fields publishing depends on.
    pub fn validate(&self) -> Result<(), JutsuError> {
        if self.name.trim().is_empty() || self.version.trim().is_empty() {
            return Err(JutsuError::Configuration {
                message: format!(
                    "name and version must be set in {}",
                    DESCRIPTOR_NAME
                ),
            });
        }
        if semver::Version::parse(self.version.trim()).is_err() {
            tracing::warn!(
                "version `{}` of `{}` is not a semantic version",
                self.version,
                self.name
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_descriptor_defaults() {
        let d = ConfigDescriptor::new("token");
        assert_eq!(d.name, "token");
        assert_eq!(d.version, "1.0.0");
        assert_eq!(d.license, "ISC");
        assert!(d.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let d = ConfigDescriptor::new("token");
        d.save(tmp.path()).unwrap();

        let loaded = ConfigDescriptor::load(tmp.path()).unwrap();
        assert_eq!(loaded, d);
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let d: ConfigDescriptor = serde_json::from_str(r#"{"name": "x"}"#).unwrap();
        assert_eq!(d.version, "");
        assert!(matches!(d.validate(), Err(JutsuError::Configuration { .. })));
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let tmp = TempDir::new().unwrap();
        let err = ConfigDescriptor::load(tmp.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<JutsuError>(),
            Some(JutsuError::Configuration { .. })
        ));
    }
}
