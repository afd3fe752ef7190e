//! Typed registry call shapes.
//!
//! A request is an ordered list of `{name, type}` parameters paired with
//! values; a response is decoded against a declared parameter list. Only
//! the types the registry contract uses are modelled.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::RegistryError;
use crate::core::Address;

/// Solidity types appearing in registry signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbiType {
    String,
    Bool,
    Address,
    Uint256,
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AbiType::String => "string",
            AbiType::Bool => "bool",
            AbiType::Address => "address",
            AbiType::Uint256 => "uint256",
        };
        f.write_str(s)
    }
}

/// A named, typed parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParam {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: AbiType,
}

impl AbiParam {
    pub fn new(name: impl Into<String>, ty: AbiType) -> Self {
        AbiParam {
            name: name.into(),
            ty,
        }
    }
}

/// A value for one parameter. Integers travel as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AbiValue {
    String(String),
    Bool(bool),
    Address(Address),
    Uint(String),
}

impl AbiValue {
    pub fn ty(&self) -> AbiType {
        match self {
            AbiValue::String(_) => AbiType::String,
            AbiValue::Bool(_) => AbiType::Bool,
            AbiValue::Address(_) => AbiType::Address,
            AbiValue::Uint(_) => AbiType::Uint256,
        }
    }

    /// Decode a JSON value as `ty`.
    pub fn from_json(param: &AbiParam, value: &Value) -> Result<Self, RegistryError> {
        let mismatch = || RegistryError::TypeMismatch {
            name: param.name.clone(),
            expected: param.ty,
            found: value.to_string(),
        };

        match (param.ty, value) {
            (AbiType::String, Value::String(s)) => Ok(AbiValue::String(s.clone())),
            (AbiType::Bool, Value::Bool(b)) => Ok(AbiValue::Bool(*b)),
            (AbiType::Address, Value::String(s)) => {
                s.parse().map(AbiValue::Address).map_err(|_| mismatch())
            }
            (AbiType::Uint256, Value::Number(n)) if n.is_u64() => {
                Ok(AbiValue::Uint(n.to_string()))
            }
            (AbiType::Uint256, Value::String(s)) => parse_uint(s).map(AbiValue::Uint).ok_or_else(mismatch),
            _ => Err(mismatch()),
        }
    }
}

/// Accept decimal or `0x` hex, normalize to decimal when it fits in u128.
fn parse_uint(s: &str) -> Option<String> {
    if let Some(hex) = s.strip_prefix("0x") {
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        return Some(match u128::from_str_radix(hex, 16) {
            Ok(n) => n.to_string(),
            Err(_) => s.to_string(),
        });
    }
    (!s.is_empty() && s.chars().all(|c| c.is_ascii_digit())).then(|| s.to_string())
}

/// A registry function call: `{function, params, args}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbiRequest {
    pub function: String,
    pub params: Vec<AbiParam>,
    pub args: Vec<AbiValue>,
}

impl AbiRequest {
    pub fn new(function: impl Into<String>) -> Self {
        AbiRequest {
            function: function.into(),
            params: Vec::new(),
            args: Vec::new(),
        }
    }

    fn push(mut self, name: &str, value: AbiValue) -> Self {
        self.params.push(AbiParam::new(name, value.ty()));
        self.args.push(value);
        self
    }

    pub fn string(self, name: &str, value: impl Into<String>) -> Self {
        self.push(name, AbiValue::String(value.into()))
    }

    pub fn address(self, name: &str, value: Address) -> Self {
        self.push(name, AbiValue::Address(value))
    }
}

/// Decoded return values, addressable by name.
#[derive(Debug, Clone, PartialEq)]
pub struct AbiResponse {
    values: Vec<(AbiParam, AbiValue)>,
}

impl AbiResponse {
    /// Decode positional JSON values against the declared outputs.
    pub fn decode(outputs: &[AbiParam], raw: &[Value]) -> Result<Self, RegistryError> {
        if outputs.len() != raw.len() {
            return Err(RegistryError::Decode {
                message: format!("expected {} return values, got {}", outputs.len(), raw.len()),
            });
        }

        let values = outputs
            .iter()
            .zip(raw)
            .map(|(param, value)| Ok((param.clone(), AbiValue::from_json(param, value)?)))
            .collect::<Result<Vec<_>, RegistryError>>()?;

        Ok(AbiResponse { values })
    }

    pub fn from_values(values: Vec<(AbiParam, AbiValue)>) -> Self {
        AbiResponse { values }
    }

    pub fn get(&self, name: &str) -> Result<&AbiValue, RegistryError> {
        self.values
            .iter()
            .find(|(param, _)| param.name == name)
            .map(|(_, value)| value)
            .ok_or_else(|| RegistryError::Decode {
                message: format!("missing return value `{}`", name),
            })
    }

    pub fn get_string(&self, name: &str) -> Result<&str, RegistryError> {
        match self.get(name)? {
            AbiValue::String(s) => Ok(s),
            other => Err(self.wrong_type(name, AbiType::String, other)),
        }
    }

    pub fn get_bool(&self, name: &str) -> Result<bool, RegistryError> {
        match self.get(name)? {
            AbiValue::Bool(b) => Ok(*b),
            other => Err(self.wrong_type(name, AbiType::Bool, other)),
        }
    }

    pub fn get_address(&self, name: &str) -> Result<&Address, RegistryError> {
        match self.get(name)? {
            AbiValue::Address(a) => Ok(a),
            other => Err(self.wrong_type(name, AbiType::Address, other)),
        }
    }

    pub fn get_uint(&self, name: &str) -> Result<&str, RegistryError> {
        match self.get(name)? {
            AbiValue::Uint(n) => Ok(n),
            other => Err(self.wrong_type(name, AbiType::Uint256, other)),
        }
    }

    fn wrong_type(&self, name: &str, expected: AbiType, found: &AbiValue) -> RegistryError {
        RegistryError::TypeMismatch {
            name: name.to_string(),
            expected,
            found: format!("{:?}", found),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serializes_call_shape() {
        let request = AbiRequest::new("getCIDByVersion")
            .string("name", "ERC20")
            .string("version", "1.0.0");

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "function": "getCIDByVersion",
                "params": [
                    {"name": "name", "type": "string"},
                    {"name": "version", "type": "string"}
                ],
                "args": ["ERC20", "1.0.0"]
            })
        );
    }

    #[test]
    fn test_decode_project_record() {
        let outputs = [
            AbiParam::new("projectId", AbiType::Uint256),
            AbiParam::new("projectName", AbiType::String),
            AbiParam::new("projectOwner", AbiType::Address),
        ];
        let raw = [
            json!("0x2a"),
            json!("ERC20"),
            json!("0x00000000000000000000000000000000000000AA"),
        ];

        let response = AbiResponse::decode(&outputs, &raw).unwrap();
        assert_eq!(response.get_uint("projectId").unwrap(), "42");
        assert_eq!(response.get_string("projectName").unwrap(), "ERC20");
        assert_eq!(
            response.get_address("projectOwner").unwrap().as_str(),
            "0x00000000000000000000000000000000000000aa"
        );
    }

    #[test]
    fn test_decode_rejects_wrong_type() {
        let outputs = [AbiParam::new("valid", AbiType::Bool)];
        let err = AbiResponse::decode(&outputs, &[json!("yes")]).unwrap_err();
        assert!(matches!(err, RegistryError::TypeMismatch { .. }));
    }

    #[test]
    fn test_decode_rejects_arity_mismatch() {
        let outputs = [AbiParam::new("cid", AbiType::String)];
        let err = AbiResponse::decode(&outputs, &[]).unwrap_err();
        assert!(matches!(err, RegistryError::Decode { .. }));
    }

    #[test]
    fn test_uint_accepts_decimal_strings() {
        let param = AbiParam::new("n", AbiType::Uint256);
        assert_eq!(
            AbiValue::from_json(&param, &json!("123")).unwrap(),
            AbiValue::Uint("123".to_string())
        );
        assert!(AbiValue::from_json(&param, &json!("-1")).is_err());
    }
}
