//! Contract deployment.

pub mod rpc;

use thiserror::Error;

use crate::core::{Address, JutsuError};

pub use rpc::JsonRpcChain;

/// Default local node endpoint.
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Chain failures.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Insufficient wallet balance: have {balance} wei, deployment needs {required} wei")]
    InsufficientFunds { balance: u128, required: u128 },

    #[error("constructor argument `{arg}` is not ABI-encoded hex (expected 32-byte words)")]
    InvalidArgument { arg: String },

    #[error("node returned error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("deployment transaction {hash} reverted")]
    Reverted { hash: String },

    #[error("no receipt for {hash} after {attempts} attempts")]
    Timeout { hash: String, attempts: u32 },

    #[error("node request failed: {message}")]
    Transport { message: String },
}

impl From<ChainError> for JutsuError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::InsufficientFunds { balance, required } => {
                JutsuError::InsufficientFunds { balance, required }
            }
            other => JutsuError::Collaborator {
                collaborator: "chain",
                message: other.to_string(),
            },
        }
    }
}

/// Result of a successful deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReceipt {
    pub transaction_hash: String,
    pub contract_address: Address,
    pub gas_used: Option<u128>,
}

/// A node able to deploy contracts on behalf of an unlocked account.
pub trait ChainClient {
    /// Send a contract-creation transaction carrying `data` from `from`
    /// and wait for it to be mined.
    fn deploy(&self, data: &str, from: &Address) -> Result<DeployReceipt, ChainError>;
}

/// Creation data: bytecode followed by pre-encoded constructor arguments.
pub fn deployment_data(bytecode: &str, args: &[String]) -> Result<String, ChainError> {
    let mut data = String::from("0x");
    data.push_str(bytecode.strip_prefix("0x").unwrap_or(bytecode));

    for arg in args {
        let hex = arg.strip_prefix("0x").unwrap_or(arg);
        if hex.is_empty() || hex.len() % 64 != 0 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ChainError::InvalidArgument { arg: arg.clone() });
        }
        data.push_str(&hex.to_ascii_lowercase());
    }

    Ok(data)
}
