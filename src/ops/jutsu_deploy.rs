//! Implementation of `jutsu deploy`.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::chain::{deployment_data, ChainClient};
use crate::compiler::Compiler;
use crate::core::{Address, JutsuError};
use crate::ops::jutsu_build::{build, require_file};

/// Options for deploying a contract.
#[derive(Debug, Clone)]
pub struct DeployOptions {
    pub entry: PathBuf,

    /// Environment variable naming the node URL
    pub network: String,

    /// ABI-encoded constructor arguments, one hex string each
    pub args: Vec<String>,

    pub deployer: Option<Address>,
}

/// A deployed contract.
#[derive(Debug, Clone)]
pub struct DeployReport {
    pub contract: String,
    pub contract_address: Address,
    pub transaction_hash: String,
    pub gas_used: Option<u128>,
    pub abi_path: PathBuf,
}

/// Compile `entry` and deploy its primary contract.
pub fn deploy(
    compiler: &dyn Compiler,
    chain: &dyn ChainClient,
    opts: &DeployOptions,
) -> Result<DeployReport> {
    require_file(&opts.entry)?;
    let deployer = opts
        .deployer
        .clone()
        .ok_or_else(|| JutsuError::Configuration {
            message: "No wallet address was found. Please add WALLET_ADDRESS=<your wallet address> to the .env file.".to_string(),
        })?;

    let compiled = build(compiler, &opts.entry)?;
    let data = deployment_data(&compiled.artifact.bytecode, &opts.args).map_err(JutsuError::from)?;

    tracing::info!(
        "deploying {} from {} via {}",
        compiled.artifact.name,
        deployer,
        opts.network
    );
    let receipt = chain
        .deploy(&data, &deployer)
        .map_err(JutsuError::from)
        .with_context(|| format!("failed to deploy {}", compiled.artifact.name))?;

    tracing::info!(
        "{} deployed at {} in transaction {}",
        compiled.artifact.name,
        receipt.contract_address,
        receipt.transaction_hash
    );

    Ok(DeployReport {
        contract: compiled.artifact.name,
        contract_address: receipt.contract_address,
        transaction_hash: receipt.transaction_hash,
        gas_used: receipt.gas_used,
        abi_path: compiled.abi_path,
    })
}
