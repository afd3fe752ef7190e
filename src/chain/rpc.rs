//! Ethereum JSON-RPC deployment client.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use super::{ChainClient, ChainError, DeployReceipt};
use crate::core::Address;

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const RECEIPT_POLL_ATTEMPTS: u32 = 120;

/// A JSON-RPC node client. The sending account must be unlocked on the
/// node; transactions are signed there.
#[derive(Debug)]
pub struct JsonRpcChain {
    url: Url,
    client: reqwest::blocking::Client,
    next_id: AtomicU64,
    poll_interval: Duration,
    poll_attempts: u32,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Receipt {
    #[serde(default)]
    contract_address: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    gas_used: Option<String>,
}

fn transport(err: reqwest::Error) -> ChainError {
    ChainError::Transport {
        message: err.to_string(),
    }
}

/// Parse a `0x`-prefixed hex quantity.
fn parse_quantity(value: &Value) -> Result<u128, ChainError> {
    value
        .as_str()
        .and_then(|s| s.strip_prefix("0x"))
        .and_then(|hex| u128::from_str_radix(hex, 16).ok())
        .ok_or_else(|| ChainError::Transport {
            message: format!("invalid quantity: {}", value),
        })
}

fn quantity(n: u128) -> String {
    format!("0x{:x}", n)
}

impl JsonRpcChain {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, ChainError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport)?;

        Ok(JsonRpcChain {
            url,
            client,
            next_id: AtomicU64::new(1),
            poll_interval: RECEIPT_POLL_INTERVAL,
            poll_attempts: RECEIPT_POLL_ATTEMPTS,
        })
    }

    fn request(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        tracing::debug!("{} {}", method, params);

        let response: RpcResponse = self
            .client
            .post(self.url.clone())
            .json(&body)
            .send()
            .map_err(transport)?
            .json()
            .map_err(transport)?;

        into_result(response)
    }

    fn wait_for_receipt(&self, hash: &str) -> Result<Receipt, ChainError> {
        for attempt in 0..self.poll_attempts {
            let raw = self.request("eth_getTransactionReceipt", json!([hash]))?;
            if !raw.is_null() {
                return serde_json::from_value(raw).map_err(|e| ChainError::Transport {
                    message: format!("invalid receipt: {}", e),
                });
            }
            tracing::debug!("waiting for {} (attempt {})", hash, attempt + 1);
            std::thread::sleep(self.poll_interval);
        }
        Err(ChainError::Timeout {
            hash: hash.to_string(),
            attempts: self.poll_attempts,
        })
    }
}

fn into_result(response: RpcResponse) -> Result<Value, ChainError> {
    if let Some(error) = response.error {
        return Err(ChainError::Rpc {
            code: error.code,
            message: error.message,
        });
    }
    Ok(response.result.unwrap_or(Value::Null))
}

fn receipt_into_deploy(hash: String, receipt: Receipt) -> Result<DeployReceipt, ChainError> {
    if receipt.status.as_deref() == Some("0x0") {
        return Err(ChainError::Reverted { hash });
    }
    let contract_address = receipt
        .contract_address
        .and_then(|a| a.parse::<Address>().ok())
        .ok_or_else(|| ChainError::Transport {
            message: format!("receipt for {} has no contract address", hash),
        })?;
    let gas_used = match receipt.gas_used {
        Some(gas) => Some(parse_quantity(&Value::String(gas))?),
        None => None,
    };

    Ok(DeployReceipt {
        transaction_hash: hash,
        contract_address,
        gas_used,
    })
}

impl ChainClient for JsonRpcChain {
    fn deploy(&self, data: &str, from: &Address) -> Result<DeployReceipt, ChainError> {
        let call = json!({ "from": from, "data": data });

        let gas = parse_quantity(&self.request("eth_estimateGas", json!([call]))?)?;
        let gas_price = parse_quantity(&self.request("eth_gasPrice", json!([]))?)?;
        let required = gas.saturating_mul(gas_price);

        let balance = parse_quantity(&self.request("eth_getBalance", json!([from, "latest"]))?)?;
        if balance < required {
            return Err(ChainError::InsufficientFunds { balance, required });
        }
        tracing::info!("estimated {} gas at {} wei", gas, gas_price);

        let tx = json!({
            "from": from,
            "data": data,
            "gas": quantity(gas),
            "gasPrice": quantity(gas_price),
        });
        let hash = self
            .request("eth_sendTransaction", json!([tx]))?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ChainError::Transport {
                message: "eth_sendTransaction returned no hash".to_string(),
            })?;
        tracing::info!("sent deployment transaction {}", hash);

        let receipt = self.wait_for_receipt(&hash)?;
        receipt_into_deploy(hash, receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(&json!("0x5208")).unwrap(), 21000);
        assert!(parse_quantity(&json!("21000")).is_err());
        assert!(parse_quantity(&json!(null)).is_err());
    }

    #[test]
    fn test_rpc_error_is_surfaced() {
        let response: RpcResponse =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32000, "message": "unknown account"}}))
                .unwrap();
        let err = into_result(response).unwrap_err();
        assert!(matches!(err, ChainError::Rpc { code: -32000, .. }));
    }

    #[test]
    fn test_receipt_with_contract_address() {
        let receipt: Receipt = serde_json::from_value(json!({
            "contractAddress": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
            "status": "0x1",
            "gasUsed": "0x5208"
        }))
        .unwrap();
        let deployed = receipt_into_deploy("0xabc".to_string(), receipt).unwrap();
        assert_eq!(
            deployed.contract_address.as_str(),
            "0x5fbdb2315678afecb367f032d93f642f64180aa3"
        );
        assert_eq!(deployed.gas_used, Some(21000));
    }

    #[test]
    fn test_reverted_receipt() {
        let receipt: Receipt =
            serde_json::from_value(json!({"contractAddress": null, "status": "0x0"})).unwrap();
        let err = receipt_into_deploy("0xabc".to_string(), receipt).unwrap_err();
        assert!(matches!(err, ChainError::Reverted { .. }));
    }
}
