//! Read-only Starknet client for the proof verifier contract.
//!
//! Talks JSON-RPC (`starknet_call`, `starknet_chainId`) directly over HTTP.
//! Only the pieces of the Cairo ABI encoding the verifier needs are here:
//! `Array<felt252>` arguments and an `Option<Array<u256>>` return value.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use num_bigint::BigUint;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use sha3::{Digest, Keccak256};
use tracing::{debug, instrument};

use crate::domain::{parse_field_element, CalldataArray, VERIFIER_ENTRY_POINT};

use super::error::{RelayError, Result};

/// Submits calldata to the verifier contract.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait OnChainVerifier: Send + Sync {
    /// `Some(public_inputs)` when the contract accepts the proof, `None` otherwise.
    async fn verify_proof(&self, calldata: &CalldataArray) -> Result<Option<Vec<String>>>;

    /// Chain id reported by the node, as `0x` hex.
    async fn chain_id(&self) -> Result<String>;
}

/// JSON-RPC client bound to one node and one verifier contract.
#[derive(Debug, Clone)]
pub struct StarknetVerifier {
    client: reqwest::Client,
    rpc_url: String,
    contract_address: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl std::fmt::Display for RpcErrorObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)?;
        match &self.data {
            Some(Value::String(s)) => write!(f, ": {s}"),
            Some(other) => write!(f, ": {other}"),
            None => Ok(()),
        }
    }
}

impl StarknetVerifier {
    pub fn new(rpc_url: impl Into<String>, contract_address: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), rpc_url, contract_address)
    }

    pub fn with_client(
        client: reqwest::Client,
        rpc_url: impl Into<String>,
        contract_address: impl Into<String>,
    ) -> Self {
        Self {
            client,
            rpc_url: rpc_url.into(),
            contract_address: contract_address.into(),
        }
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    pub fn contract_address(&self) -> &str {
        &self.contract_address
    }

    async fn rpc<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::Rpc(format!("{method} request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RelayError::Rpc(format!(
                "{method} returned HTTP {status}: {}",
                text.trim()
            )));
        }

        let envelope: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| RelayError::UnexpectedOutput(format!("{method} response: {e}")))?;

        match (envelope.result, envelope.error) {
            (_, Some(error)) => Err(RelayError::Rpc(error.to_string())),
            (Some(result), None) => Ok(result),
            (None, None) => Err(RelayError::UnexpectedOutput(format!(
                "{method} response has neither result nor error"
            ))),
        }
    }
}

#[async_trait]
impl OnChainVerifier for StarknetVerifier {
    #[instrument(skip_all, fields(contract = %self.contract_address, elements = calldata.len()))]
    async fn verify_proof(&self, calldata: &CalldataArray) -> Result<Option<Vec<String>>> {
        let params = json!({
            "request": {
                "contract_address": self.contract_address,
                "entry_point_selector": selector(VERIFIER_ENTRY_POINT),
                "calldata": encode_array_argument(calldata),
            },
            "block_id": "latest",
        });

        let felts: Vec<String> = self.rpc("starknet_call", params).await?;
        debug!(felts = felts.len(), "verifier call returned");
        decode_option_u256_array(&felts)
    }

    async fn chain_id(&self) -> Result<String> {
        self.rpc("starknet_chainId", json!([])).await
    }
}

/// Entry point selector: Keccak-256 of the name, truncated to 250 bits.
pub fn selector(name: &str) -> String {
    let mut hash = Keccak256::digest(name.as_bytes());
    hash[0] &= 0x03;
    format!("0x{}", BigUint::from_bytes_be(&hash).to_str_radix(16))
}

/// Serialise calldata as a single `Array<felt252>` argument: length, then elements.
pub fn encode_array_argument(calldata: &CalldataArray) -> Vec<String> {
    let mut felts = Vec::with_capacity(calldata.len() + 1);
    felts.push(format!("{:#x}", calldata.len()));
    felts.extend(calldata.elements().iter().cloned());
    felts
}

/// Decode an `Option<Array<u256>>` return value into decimal strings.
pub fn decode_option_u256_array(felts: &[String]) -> Result<Option<Vec<String>>> {
    let values = felts
        .iter()
        .map(|felt| parse_field_element(felt).map_err(RelayError::UnexpectedOutput))
        .collect::<Result<Vec<BigUint>>>()?;

    let (variant, rest) = values
        .split_first()
        .ok_or_else(|| RelayError::UnexpectedOutput("empty call result".to_string()))?;

    if *variant == BigUint::from(1u8) {
        return Ok(None);
    }
    if *variant != BigUint::from(0u8) {
        return Err(RelayError::UnexpectedOutput(format!(
            "unknown Option variant {variant}"
        )));
    }

    let (len, limbs) = rest
        .split_first()
        .ok_or_else(|| RelayError::UnexpectedOutput("missing array length".to_string()))?;
    let len = usize::try_from(len)
        .map_err(|_| RelayError::UnexpectedOutput(format!("array length {len} out of range")))?;
    if limbs.len() % 2 != 0 || limbs.len() / 2 != len {
        return Err(RelayError::UnexpectedOutput(format!(
            "array length {len} does not match {} u256 limbs",
            limbs.len()
        )));
    }
    if let Some(limb) = limbs.iter().find(|limb| limb.bits() > 128) {
        return Err(RelayError::UnexpectedOutput(format!(
            "u256 limb {limb:#x} exceeds 128 bits"
        )));
    }

    let decoded = limbs
        .chunks_exact(2)
        .map(|pair| (&pair[0] + (&pair[1] << 128u32)).to_str_radix(10))
        .collect();
    Ok(Some(decoded))
}
