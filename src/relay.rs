//! Verification relay: proof artifacts in, on-chain verdict out.
//!
//! ```text
//! paths / inline bytes -> existence check -> absolute paths
//!     -> calldata generator -> verifier contract (view call) -> VerificationResult
//! ```
//!
//! The relay keeps no state between calls. Inline payloads are staged in a
//! temporary directory that lives only for the duration of one call.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::domain::{
    ArtifactKind, ArtifactPaths, InlineArtifacts, VerificationRequest, VerificationResult,
};
use crate::infra::{CalldataGenerator, OnChainVerifier, RelayError, Result};

/// Bridges file-based proof artifacts to the verifier contract.
#[derive(Clone)]
pub struct VerificationRelay {
    calldata: Arc<dyn CalldataGenerator>,
    verifier: Arc<dyn OnChainVerifier>,
    contract_address: String,
    network: String,
}

impl VerificationRelay {
    pub fn new(
        calldata: Arc<dyn CalldataGenerator>,
        verifier: Arc<dyn OnChainVerifier>,
        contract_address: impl Into<String>,
        network: impl Into<String>,
    ) -> Self {
        Self {
            calldata,
            verifier,
            contract_address: contract_address.into(),
            network: network.into(),
        }
    }

    pub fn contract_address(&self) -> &str {
        &self.contract_address
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    /// Verify the artifacts at `paths` against the verifier contract.
    ///
    /// Fails with [`RelayError::MissingArtifact`] before running the calldata
    /// tool if any of the three files is absent.
    #[instrument(skip_all, fields(proof = %paths.proof_path.display()))]
    pub async fn verify(&self, paths: &ArtifactPaths) -> Result<VerificationResult> {
        let resolved = resolve(paths).await?;

        info!("generating calldata");
        let calldata = self.calldata.generate_calldata(&resolved).await?;
        let data_size = calldata.len();

        info!(elements = data_size, contract = %self.contract_address, "calling verifier contract");
        let payload = self.verifier.verify_proof(&calldata).await?;

        let result = VerificationResult::new(
            payload,
            self.contract_address.clone(),
            self.network.clone(),
            data_size,
        );
        if result.is_valid {
            info!("proof accepted on-chain");
        } else {
            warn!("proof rejected on-chain");
        }
        Ok(result)
    }

    /// Verify either representation of a request.
    pub async fn verify_request(&self, request: VerificationRequest) -> Result<VerificationResult> {
        match request {
            VerificationRequest::Paths(paths) => self.verify(&paths).await,
            VerificationRequest::Inline(artifacts) => self.verify_inline(&artifacts).await,
        }
    }

    async fn verify_inline(&self, artifacts: &InlineArtifacts) -> Result<VerificationResult> {
        if artifacts.proof.is_empty() {
            return Err(RelayError::InvalidPayload("proof is empty".to_string()));
        }
        if artifacts.verification_key.is_empty() {
            return Err(RelayError::InvalidPayload(
                "verification key is empty".to_string(),
            ));
        }

        let staging = tempfile::tempdir().map_err(|source| RelayError::Io {
            path: std::env::temp_dir(),
            source,
        })?;
        let paths = ArtifactPaths::in_dir(staging.path());
        for (kind, path) in paths.entries() {
            write_artifact(path, artifact_bytes(artifacts, kind)).await?;
        }
        debug!(dir = %staging.path().display(), "staged inline artifacts");

        self.verify(&paths).await
    }

    /// Chain id reported by the configured node.
    pub async fn chain_id(&self) -> Result<String> {
        self.verifier.chain_id().await
    }
}

async fn resolve(paths: &ArtifactPaths) -> Result<ArtifactPaths> {
    for (kind, path) in paths.entries() {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(missing(kind, path)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(missing(kind, path)),
            Err(source) => {
                return Err(RelayError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }

    Ok(ArtifactPaths::new(
        absolute(&paths.proof_path).await?,
        absolute(&paths.vk_path).await?,
        absolute(&paths.public_inputs_path).await?,
    ))
}

fn missing(kind: ArtifactKind, path: &Path) -> RelayError {
    warn!(%kind, path = %path.display(), "artifact missing");
    RelayError::MissingArtifact {
        kind,
        path: path.to_path_buf(),
    }
}

async fn absolute(path: &Path) -> Result<std::path::PathBuf> {
    tokio::fs::canonicalize(path)
        .await
        .map_err(|source| RelayError::Io {
            path: path.to_path_buf(),
            source,
        })
}

async fn write_artifact(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| RelayError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn artifact_bytes(artifacts: &InlineArtifacts, kind: ArtifactKind) -> &[u8] {
    match kind {
        ArtifactKind::Proof => &artifacts.proof,
        ArtifactKind::VerificationKey => &artifacts.verification_key,
        ArtifactKind::PublicInputs => &artifacts.public_inputs,
    }
}
