//! HTTP registry gateway.
//!
//! Speaks JSON to a service that fronts the registry contract, encodes
//! calls and signs transactions on the publisher's behalf:
//!
//! ```text
//! POST <url>/call      {contract, request}        -> {result: [..]}
//! POST <url>/estimate  {contract, from, request}  -> {result: "<wei>"}
//! POST <url>/send      {contract, from, request}  -> {result: {transactionHash, blockNumber}}
//! GET  <url>/balance/<address>                    -> {result: "<wei>"}
//! ```
//!
//! Failures come back as `{error: {message, reverted}}`.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::{AbiParam, AbiRequest, AbiResponse, RegistryClient, RegistryError, TxReceipt};
use crate::core::Address;

/// Registry client backed by an HTTP gateway.
pub struct HttpRegistry {
    base: Url,
    contract: Option<Address>,
    client: reqwest::blocking::Client,
}

#[derive(Serialize)]
struct CallBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    contract: Option<&'a Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<&'a Address>,
    request: &'a AbiRequest,
}

#[derive(Deserialize)]
struct Envelope<T> {
    result: Option<T>,
    error: Option<GatewayError>,
}

#[derive(Deserialize)]
struct GatewayError {
    message: String,
    #[serde(default)]
    reverted: bool,
}

impl HttpRegistry {
    pub fn new(base: Url, contract: Option<Address>, timeout: Duration) -> Result<Self, RegistryError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport)?;

        Ok(HttpRegistry {
            base,
            contract,
            client,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, RegistryError> {
        let mut base = self.base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(path).map_err(|e| RegistryError::Transport {
            message: format!("invalid registry url: {}", e),
        })
    }

    fn call<T: DeserializeOwned>(
        &self,
        path: &str,
        request: &AbiRequest,
        from: Option<&Address>,
    ) -> Result<T, RegistryError> {
        let url = self.endpoint(path)?;
        tracing::debug!("POST {} {}", url, request.function);

        let body = CallBody {
            contract: self.contract.as_ref(),
            from,
            request,
        };
        let response = self.client.post(url).json(&body).send().map_err(transport)?;
        unwrap_envelope(&request.function, response)
    }
}

fn transport(err: reqwest::Error) -> RegistryError {
    RegistryError::Transport {
        message: err.to_string(),
    }
}

fn unwrap_envelope<T: DeserializeOwned>(
    function: &str,
    response: reqwest::blocking::Response,
) -> Result<T, RegistryError> {
    let status = response.status();
    let text = response.text().map_err(transport)?;
    let envelope: Envelope<T> = serde_json::from_str(&text).map_err(|e| {
        if status.is_success() {
            RegistryError::Decode {
                message: e.to_string(),
            }
        } else {
            RegistryError::Transport {
                message: format!("HTTP {}", status),
            }
        }
    })?;
    open_envelope(function, envelope)
}

fn open_envelope<T>(function: &str, envelope: Envelope<T>) -> Result<T, RegistryError> {
    if let Some(error) = envelope.error {
        return Err(if error.reverted {
            RegistryError::Reverted {
                function: function.to_string(),
                reason: error.message,
            }
        } else {
            RegistryError::Transport {
                message: error.message,
            }
        });
    }
    envelope.result.ok_or_else(|| RegistryError::Decode {
        message: format!("`{}` returned no result", function),
    })
}

/// Wei amounts arrive as decimal strings or numbers.
fn parse_wei(value: &Value) -> Result<u128, RegistryError> {
    let parsed = match value {
        Value::String(s) => match s.strip_prefix("0x") {
            Some(hex) => u128::from_str_radix(hex, 16).ok(),
            None => s.parse().ok(),
        },
        Value::Number(n) => n.as_u64().map(u128::from),
        _ => None,
    };
    parsed.ok_or_else(|| RegistryError::Decode {
        message: format!("not a wei amount: {}", value),
    })
}

impl RegistryClient for HttpRegistry {
    fn get(&self, request: &AbiRequest, outputs: &[AbiParam]) -> Result<AbiResponse, RegistryError> {
        let raw: Vec<Value> = self.call("call", request, None)?;
        AbiResponse::decode(outputs, &raw)
    }

    fn post(&self, request: &AbiRequest, from: &Address) -> Result<TxReceipt, RegistryError> {
        self.call("send", request, Some(from))
    }

    fn estimate_post(&self, request: &AbiRequest, from: &Address) -> Result<u128, RegistryError> {
        let cost: Value = self.call("estimate", request, Some(from))?;
        parse_wei(&cost)
    }

    fn balance(&self, address: &Address) -> Result<u128, RegistryError> {
        let url = self.endpoint(&format!("balance/{}", address))?;
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().map_err(transport)?;
        let balance: Value = unwrap_envelope("balance", response)?;
        parse_wei(&balance)
    }
}
