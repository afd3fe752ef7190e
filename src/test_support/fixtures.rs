//! Test fixtures for common test scenarios.
//!
//! Contract trees and component projects written to real directories.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Fixture for a component project.
#[derive(Debug, Clone)]
pub struct ComponentFixture {
    /// Project name, also the directory name.
    pub name: String,
    /// config.json content.
    pub descriptor: String,
    /// Files relative to the project root.
    pub files: BTreeMap<PathBuf, String>,
}

impl ComponentFixture {
    /// A publishable component with one contract named after the project.
    pub fn new(name: impl Into<String>, version: &str) -> Self {
        let name = name.into();
        let descriptor = format!(
            r#"{{
  "name": "{name}",
  "description": "",
  "version": "{version}",
  "license": "ISC",
  "github": ""
}}
"#
        );

        let mut files = BTreeMap::new();
        files.insert(
            PathBuf::from("src").join(format!("{}.sol", name)),
            sources::contract(&name),
        );
        files.insert(PathBuf::from("README.md"), format!("# {}\n", name));
        files.insert(
            PathBuf::from(".env"),
            "WALLET_ADDRESS=0x00000000000000000000000000000000000000aa\n".to_string(),
        );

        ComponentFixture {
            name,
            descriptor,
            files,
        }
    }

    /// Add or replace a file.
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    /// Write this fixture under `base_path` and return the project root.
    pub fn write_to(&self, base_path: &Path) -> std::io::Result<PathBuf> {
        let project_path = base_path.join(&self.name);
        std::fs::create_dir_all(&project_path)?;
        std::fs::write(project_path.join("config.json"), &self.descriptor)?;

        for (rel_path, content) in &self.files {
            let full_path = project_path.join(rel_path);
            if let Some(parent) = full_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&full_path, content)?;
        }

        Ok(project_path)
    }
}

/// Write a component project at `dir/<name>` and return its root.
pub fn component_project(dir: &Path, name: &str, version: &str) -> PathBuf {
    ComponentFixture::new(name, version)
        .write_to(dir)
        .unwrap()
}

/// Write `World.sol` importing `Animal.sol`, which imports `Base.sol`.
/// Returns the path of `World.sol`.
pub fn world_animal_base(dir: &Path) -> PathBuf {
    let files = [
        ("Base.sol", sources::BASE),
        ("Animal.sol", sources::ANIMAL),
        ("World.sol", sources::WORLD),
    ];
    for (name, content) in files {
        std::fs::write(dir.join(name), content).unwrap();
    }
    dir.join("World.sol")
}

/// Contract sources.
pub mod sources {
    pub const BASE: &str = r#"// SPDX-License-Identifier: MIT
pragma solidity ^0.8.0;

contract Base {
    uint256 internal count;
}
"#;

    pub const ANIMAL: &str = r#"// SPDX-License-Identifier: MIT
pragma solidity ^0.8.0;

import "./Base.sol";

contract Animal is Base {
    function grow() public {
        count += 1;
    }
}
"#;

    pub const WORLD: &str = r#"// SPDX-License-Identifier: MIT
pragma solidity ^0.8.0;

import "./Animal.sol";
import "./Base.sol";

contract World is Animal {
    function size() public view returns (uint256) {
        return count;
    }
}
"#;

    /// A self-contained contract named `name`.
    pub fn contract(name: &str) -> String {
        format!(
            r#"// SPDX-License-Identifier: MIT
pragma solidity ^0.8.0;

contract {name} {{
    string public label = "{name}";
}}
"#
        )
    }
}
