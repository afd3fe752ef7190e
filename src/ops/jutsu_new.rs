//! Implementation of `jutsu new`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::chain::DEFAULT_RPC_URL;
use crate::core::{ConfigDescriptor, PackageRef};
use crate::transfer::{README, SOURCE_DIR};
use crate::util::context::env_keys;
use crate::util::fs::write_string;

/// Options for creating a new project.
#[derive(Debug, Clone)]
pub struct NewOptions {
    /// Project name
    pub name: String,
}

/// What `new_project` created.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub root: PathBuf,
    /// Created files and directories, relative to `root`, in display order
    pub entries: Vec<PathBuf>,
    /// Name of the starter contract
    pub contract: String,
}

/// Turn a project name into a Solidity identifier: `my-token` -> `MyToken`.
pub fn contract_name(project: &str) -> String {
    let mut name = String::new();
    let mut upper = true;
    for c in project.chars() {
        if c.is_ascii_alphanumeric() {
            if upper {
                name.push(c.to_ascii_uppercase());
            } else {
                name.push(c);
            }
            upper = false;
        } else {
            upper = true;
        }
    }

    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, 'C');
    }
    name
}

fn env_template() -> String {
    format!(
        "# Account used to publish and deploy. jutsu never needs a private key;\n\
         # the node or registry gateway signs on this account's behalf.\n\
         {wallet}=\n\
         # Please configure your local network\n\
         {rpc}={rpc_url}\n\
         # Please register pinata https://pinata.cloud/\n\
         {jwt}=\n",
        wallet = env_keys::WALLET_ADDRESS,
        rpc = env_keys::CUSTOM_RPC,
        rpc_url = DEFAULT_RPC_URL,
        jwt = env_keys::PINATA_JWT,
    )
}

const GITIGNORE: &str = r#"# Credentials
.env

# Compiler output
abis/

# Jutsu local state
.jutsu/
"#;

fn readme(name: &str) -> String {
    format!(
        "# {name}\n\
         \n\
         A Jutsu component.\n\
         \n\
         ```sh\n\
         jutsu build src/{contract}.sol\n\
         jutsu publish\n\
         ```\n",
        name = name,
        contract = contract_name(name),
    )
}

fn starter_contract(contract: &str) -> String {
    format!(
        r#"// SPDX-License-Identifier: GPL-3.0
pragma solidity >=0.8.0;

contract {contract} {{
    mapping(string => bytes) private values;

    event Updated(string key);

    function get(string memory _key) public view returns (bytes memory) {{
        return values[_key];
    }}

    function put(string memory _key, bytes memory _value) public {{
        values[_key] = _value;
        emit Updated(_key);
    }}
}}
"#,
        contract = contract
    )
}

/// Create a new Jutsu project at `path`.
pub fn new_project(path: &Path, opts: &NewOptions) -> Result<NewProject> {
    // Project names double as registry names.
    let package: PackageRef = opts
        .name
        .parse()
        .with_context(|| format!("invalid project name `{}`", opts.name))?;
    if package.version.is_some() {
        bail!("project name `{}` must not contain a version", opts.name);
    }

    if path.exists() {
        bail!("File already exists: `{}`", path.display());
    }

    let src_dir = path.join(SOURCE_DIR);
    fs::create_dir_all(&src_dir)
        .with_context(|| format!("failed to create directory: {}", src_dir.display()))?;

    ConfigDescriptor::new(&package.name).save(path)?;
    write_string(&path.join(".env"), &env_template())?;
    write_string(&path.join(".gitignore"), GITIGNORE)?;
    write_string(&path.join(README), &readme(&package.name))?;

    let contract = contract_name(&package.name);
    let contract_file = PathBuf::from(SOURCE_DIR).join(format!("{}.sol", contract));
    write_string(&path.join(&contract_file), &starter_contract(&contract))?;

    tracing::info!("created project {} at {}", package.name, path.display());

    Ok(NewProject {
        root: path.to_path_buf(),
        entries: vec![
            PathBuf::from(format!("{}/", SOURCE_DIR)),
            contract_file,
            PathBuf::from(".env"),
            PathBuf::from("config.json"),
            PathBuf::from(".gitignore"),
            PathBuf::from(README),
        ],
        contract,
    })
}
