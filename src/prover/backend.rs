//! Seams to the external proving library.
//!
//! The circuit executor and the proving backend are supplied by the caller;
//! this crate only drives them.

use std::path::PathBuf;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::{PublicInput, WitnessInputs};

use super::ProverError;

/// Compiled circuit description (`zk_noir_circuit.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitDescription {
    /// Base64 text of the compressed ACIR bytecode.
    pub bytecode: String,
    pub abi: serde_json::Value,
    pub noir_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<serde_json::Value>,
}

/// Opaque witness produced by circuit execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness(pub Vec<u8>);

/// Raw proof and its public inputs as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofData {
    pub proof: Vec<u8>,
    pub public_inputs: Vec<PublicInput>,
}

/// Shape of the input handed to the backend constructor.
#[derive(Debug, Clone, Copy)]
pub enum BackendInput<'a> {
    /// The circuit's `bytecode` field as-is.
    Bytecode(&'a str),
    /// Bytecode decoded from strict base64.
    DecodedBytecode(&'a [u8]),
    /// The whole circuit descriptor.
    Circuit(&'a CircuitDescription),
    /// Only the ABI object.
    Abi(&'a serde_json::Value),
    /// Bytecode decoded leniently into a raw buffer.
    BytecodeBuffer(&'a [u8]),
}

impl BackendInput<'_> {
    pub fn method(&self) -> BackendMethod {
        match self {
            BackendInput::Bytecode(_) => BackendMethod::Bytecode,
            BackendInput::DecodedBytecode(_) => BackendMethod::DecodedBytecode,
            BackendInput::Circuit(_) => BackendMethod::CircuitDescriptor,
            BackendInput::Abi(_) => BackendMethod::AbiOnly,
            BackendInput::BytecodeBuffer(_) => BackendMethod::BytecodeBuffer,
        }
    }
}

/// Backend construction approaches, named for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendMethod {
    Bytecode,
    DecodedBytecode,
    CircuitDescriptor,
    AbiOnly,
    BytecodeBuffer,
}

impl BackendMethod {
    pub fn name(&self) -> &'static str {
        match self {
            BackendMethod::Bytecode => "bytecode",
            BackendMethod::DecodedBytecode => "decoded bytecode",
            BackendMethod::CircuitDescriptor => "full circuit",
            BackendMethod::AbiOnly => "abi only",
            BackendMethod::BytecodeBuffer => "bytecode buffer",
        }
    }
}

impl std::fmt::Display for BackendMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a backend constructor rejected its input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendInitError {
    /// The constructor does not accept this input shape; another may work.
    #[error("unsupported backend input: {0}")]
    Unsupported(String),

    /// The constructor accepted the input but failed; retrying won't help.
    #[error("backend initialization failed: {0}")]
    Failed(String),
}

/// Where the circuit description comes from.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CircuitSource: Send + Sync {
    async fn load(&self) -> Result<CircuitDescription, ProverError>;
}

/// Executes a circuit to produce a witness.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WitnessGenerator: Send + Sync {
    async fn execute(&self, inputs: &WitnessInputs) -> Result<Witness, ProverError>;
}

/// An initialised proving backend.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProvingBackend: Send + Sync {
    async fn generate_proof(&self, witness: &Witness) -> Result<ProofData, ProverError>;

    async fn verification_key(&self) -> Result<Vec<u8>, ProverError>;

    async fn verify_proof(&self, proof: &ProofData) -> Result<bool, ProverError>;
}

/// Constructs executors and backends from a circuit.
pub trait ProverToolchain: Send + Sync {
    fn executor(
        &self,
        circuit: &CircuitDescription,
    ) -> Result<Box<dyn WitnessGenerator>, ProverError>;

    fn backend(&self, input: BackendInput<'_>)
        -> Result<Box<dyn ProvingBackend>, BackendInitError>;
}

/// Reads the circuit description from a local file.
#[derive(Debug, Clone)]
pub struct FileCircuitSource {
    path: PathBuf,
}

impl FileCircuitSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CircuitSource for FileCircuitSource {
    async fn load(&self) -> Result<CircuitDescription, ProverError> {
        debug!(path = %self.path.display(), "loading circuit description");
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            ProverError::CircuitLoad(format!("read {}: {e}", self.path.display()))
        })?;
        serde_json::from_slice(&bytes).map_err(|e| {
            ProverError::CircuitLoad(format!("parse {}: {e}", self.path.display()))
        })
    }
}

/// Fetches the circuit description over HTTP, e.g. `/zk_noir_circuit.json`.
#[derive(Debug, Clone)]
pub struct HttpCircuitSource {
    client: reqwest::Client,
    url: String,
}

impl HttpCircuitSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl CircuitSource for HttpCircuitSource {
    async fn load(&self) -> Result<CircuitDescription, ProverError> {
        debug!(url = %self.url, "fetching circuit description");
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ProverError::CircuitLoad(format!("fetch {}: {e}", self.url)))?;
        response
            .json::<CircuitDescription>()
            .await
            .map_err(|e| ProverError::CircuitLoad(format!("parse {}: {e}", self.url)))
    }
}
