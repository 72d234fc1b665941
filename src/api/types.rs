//! Request and response bodies for the REST API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ArtifactPaths, ContractInfo, InlineArtifacts, VerificationResult};
use crate::prover::codec;

use super::error::{invalid_field, missing_fields, ApiError};

/// Body of `POST /api/verify/custom`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomVerifyRequest {
    pub proof_path: Option<String>,
    pub vk_path: Option<String>,
    pub public_inputs_path: Option<String>,
}

impl CustomVerifyRequest {
    /// All three paths, or a 400 if any is absent or blank.
    pub fn into_paths(self) -> Result<ArtifactPaths, ApiError> {
        match (
            non_blank(self.proof_path),
            non_blank(self.vk_path),
            non_blank(self.public_inputs_path),
        ) {
            (Some(proof), Some(vk), Some(public_inputs)) => {
                Ok(ArtifactPaths::new(proof, vk, public_inputs))
            }
            _ => Err(missing_fields(
                "proofPath, vkPath e publicInputsPath são obrigatórios",
            )),
        }
    }
}

/// Body of `POST /api/verify/inline`: artifacts as base64 text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InlineVerifyRequest {
    #[serde(rename = "proofB64")]
    pub proof: Option<String>,
    #[serde(rename = "verificationKeyB64")]
    pub verification_key: Option<String>,
    /// May be omitted for circuits without public inputs.
    #[serde(rename = "publicInputsB64")]
    pub public_inputs: Option<String>,
}

impl InlineVerifyRequest {
    pub fn into_artifacts(self) -> Result<InlineArtifacts, ApiError> {
        let (proof, verification_key) =
            match (non_blank(self.proof), non_blank(self.verification_key)) {
                (Some(proof), Some(vk)) => (proof, vk),
                _ => {
                    return Err(missing_fields(
                        "proofB64 e verificationKeyB64 são obrigatórios",
                    ))
                }
            };

        Ok(InlineArtifacts {
            proof: decode_field("proofB64", &proof)?,
            verification_key: decode_field("verificationKeyB64", &verification_key)?,
            public_inputs: match non_blank(self.public_inputs) {
                Some(text) => decode_field("publicInputsB64", &text)?,
                None => Vec::new(),
            },
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn decode_field(field: &str, text: &str) -> Result<Vec<u8>, ApiError> {
    codec::decode_lenient(text)
        .map_err(|e| invalid_field(field, format!("{field} deve estar em base64 válido: {e}")))
}

/// `{ success, message, result }`
#[derive(Debug, Clone, Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub message: String,
    pub result: VerificationResult,
}

/// Body of `GET /api/verify/contract-info`.
#[derive(Debug, Clone, Serialize)]
pub struct ContractInfoResponse {
    pub success: bool,
    pub contract: ContractInfo,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    /// Seconds since startup.
    pub uptime: f64,
    pub environment: String,
    pub version: &'static str,
    pub services: HealthServices,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthServices {
    pub api: &'static str,
    pub starknet: &'static str,
}
