//! Proof request and proof artifact types.

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use num_traits::Num;
use serde::{Deserialize, Serialize};

use crate::prover::codec::serde_b64;

/// Private/public values for a balance-threshold proof.
///
/// `threshold` and `nonce` are public circuit inputs; `balance` and
/// `secret_nonce` stay private to the prover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofRequest {
    pub threshold: u64,
    pub nonce: String,
    pub balance: u64,
    pub secret_nonce: String,
}

impl ProofRequest {
    pub fn new(
        threshold: u64,
        nonce: impl Into<String>,
        balance: u64,
        secret_nonce: impl Into<String>,
    ) -> Self {
        Self {
            threshold,
            nonce: nonce.into(),
            balance,
            secret_nonce: secret_nonce.into(),
        }
    }

    /// Named circuit inputs, in the order the circuit ABI declares them.
    pub fn witness_inputs(&self) -> WitnessInputs {
        WitnessInputs {
            threshold: self.threshold.to_string(),
            nonce: self.nonce.clone(),
            balance: self.balance.to_string(),
            secret_nonce: self.secret_nonce.clone(),
        }
    }
}

/// Proof request as it arrives from a form or JSON body, before range checks.
#[derive(Debug, Clone, Deserialize)]
pub struct RawProofRequest {
    pub threshold: i64,
    pub nonce: String,
    pub balance: i64,
    pub secret_nonce: String,
}

/// The four named inputs handed to the circuit executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WitnessInputs {
    pub threshold: String,
    pub nonce: String,
    pub balance: String,
    pub secret_nonce: String,
}

/// A public input returned by the prover.
///
/// Field elements can exceed 64 bits, so the value is kept at arbitrary
/// precision and serialised as a decimal string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicInput(BigUint);

impl PublicInput {
    pub fn new(value: BigUint) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &BigUint {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", self.0.to_str_radix(16))
    }
}

impl From<u64> for PublicInput {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl FromStr for PublicInput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_field_element(s).map(Self)
    }
}

impl fmt::Display for PublicInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for PublicInput {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_str_radix(10))
    }
}

impl<'de> Deserialize<'de> for PublicInput {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a field element written as decimal or `0x`-prefixed hexadecimal text.
pub fn parse_field_element(text: &str) -> Result<BigUint, String> {
    let trimmed = text.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex_digits) => BigUint::from_str_radix(hex_digits, 16),
        None => BigUint::from_str_radix(trimmed, 10),
    };
    parsed.map_err(|e| format!("invalid field element {trimmed:?}: {e}"))
}

/// Output of a successful proof generation.
///
/// Immutable once built: the orchestrator is the only producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofArtifact {
    #[serde(with = "serde_b64")]
    proof: Vec<u8>,
    #[serde(rename = "proofB64")]
    proof_encoded: String,
    public_inputs: Vec<PublicInput>,
    #[serde(with = "serde_b64")]
    verification_key: Vec<u8>,
    is_valid: bool,
}

impl ProofArtifact {
    pub(crate) fn new(
        proof: Vec<u8>,
        proof_encoded: String,
        public_inputs: Vec<PublicInput>,
        verification_key: Vec<u8>,
        is_valid: bool,
    ) -> Self {
        Self {
            proof,
            proof_encoded,
            public_inputs,
            verification_key,
            is_valid,
        }
    }

    pub fn proof(&self) -> &[u8] {
        &self.proof
    }

    pub fn proof_encoded(&self) -> &str {
        &self.proof_encoded
    }

    pub fn public_inputs(&self) -> &[PublicInput] {
        &self.public_inputs
    }

    pub fn verification_key(&self) -> &[u8] {
        &self.verification_key
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }
}
