//! Relay-side verification types.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the on-chain verifier entry point.
pub const VERIFIER_ENTRY_POINT: &str = "verify_ultra_starknet_zk_honk_proof";

/// How the calldata was produced; reported back to callers.
pub const VERIFICATION_METHOD: &str = "garaga_cli";

/// Filesystem locations of the three proof artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactPaths {
    pub proof_path: PathBuf,
    pub vk_path: PathBuf,
    pub public_inputs_path: PathBuf,
}

impl ArtifactPaths {
    pub fn new(
        proof_path: impl Into<PathBuf>,
        vk_path: impl Into<PathBuf>,
        public_inputs_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            proof_path: proof_path.into(),
            vk_path: vk_path.into(),
            public_inputs_path: public_inputs_path.into(),
        }
    }

    /// The layout written by `bb prove` into an output directory.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(
            dir.join("proof"),
            dir.join("vk"),
            dir.join("public_inputs"),
        )
    }

    /// Artifacts paired with their kind, in the order they are checked.
    pub fn entries(&self) -> [(ArtifactKind, &Path); 3] {
        [
            (ArtifactKind::Proof, self.proof_path.as_path()),
            (ArtifactKind::VerificationKey, self.vk_path.as_path()),
            (ArtifactKind::PublicInputs, self.public_inputs_path.as_path()),
        ]
    }
}

/// Which of the three artifacts a path refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Proof,
    VerificationKey,
    PublicInputs,
}

impl ArtifactKind {
    pub fn label(&self) -> &'static str {
        match self {
            ArtifactKind::Proof => "proof",
            ArtifactKind::VerificationKey => "verification key",
            ArtifactKind::PublicInputs => "public inputs",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            ArtifactKind::Proof => "proof",
            ArtifactKind::VerificationKey => "vk",
            ArtifactKind::PublicInputs => "public_inputs",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Proof material carried inline instead of as file paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineArtifacts {
    pub proof: Vec<u8>,
    pub verification_key: Vec<u8>,
    pub public_inputs: Vec<u8>,
}

/// A verification request: exactly one of paths or inline bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationRequest {
    Paths(ArtifactPaths),
    Inline(InlineArtifacts),
}

/// Calldata for the verifier entry point: `0x`-prefixed hex field elements.
///
/// Element count and order are whatever the calldata tool produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalldataArray(Vec<String>);

impl CalldataArray {
    pub fn new(elements: Vec<String>) -> Self {
        Self(elements)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn elements(&self) -> &[String] {
        &self.0
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

/// Outcome of an on-chain verification call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub is_valid: bool,
    /// `null` when the contract returned `None`, else the returned u256 values.
    #[serde(rename = "result")]
    pub raw_result: Option<Vec<String>>,
    pub timestamp: DateTime<Utc>,
    pub contract_address: String,
    pub network: String,
    #[serde(rename = "verificationMethod")]
    pub method: &'static str,
    pub data_size: usize,
}

impl VerificationResult {
    pub fn new(
        raw_result: Option<Vec<String>>,
        contract_address: impl Into<String>,
        network: impl Into<String>,
        data_size: usize,
    ) -> Self {
        Self {
            is_valid: raw_result.is_some(),
            raw_result,
            timestamp: Utc::now(),
            contract_address: contract_address.into(),
            network: network.into(),
            method: VERIFICATION_METHOD,
            data_size,
        }
    }
}

/// Static description of the verifier contract.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractInfo {
    pub address: String,
    pub network: String,
    pub function: &'static str,
    pub status: &'static str,
    pub rpc_url: String,
    pub chain_id: String,
}

/// Human label for a Starknet chain id (hex-encoded short string).
pub fn network_label(chain_id: &str) -> String {
    match chain_id.to_ascii_lowercase().as_str() {
        "0x534e5f5345504f4c4941" => "Starknet Sepolia".to_string(),
        "0x534e5f4d41494e" => "Starknet Mainnet".to_string(),
        other => format!("Starknet ({other})"),
    }
}
