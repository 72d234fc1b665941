//! Error types for the verification relay

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::ArtifactKind;

/// Errors raised while relaying a proof to the on-chain verifier
#[derive(Error, Debug)]
pub enum RelayError {
    /// An artifact file does not exist
    #[error("{kind} file not found: {}", path.display())]
    MissingArtifact { kind: ArtifactKind, path: PathBuf },

    /// An artifact exists but could not be read or written
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The calldata tool could not be run or exited with an error
    #[error("failed to generate calldata: {0}")]
    CalldataTool(String),

    /// The calldata tool's output could not be turned into field elements
    #[error("unparsable calldata output: {0}")]
    CalldataParse(String),

    /// Transport or JSON-RPC failure talking to the Starknet node
    #[error("RPC error: {0}")]
    Rpc(String),

    /// The node answered, but the result did not decode
    #[error("deserialization failed: {0}")]
    UnexpectedOutput(String),

    /// An inline payload was rejected before reaching the filesystem
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl RelayError {
    /// The user-facing category for this error.
    pub fn category(&self) -> FailureCategory {
        FailureCategory::classify(&self.to_string())
    }

    /// Message suitable for display to an end user.
    pub fn user_message(&self) -> String {
        self.category().user_message(&self.to_string())
    }

    /// Errors the caller caused: bad paths or payloads.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            RelayError::MissingArtifact { .. } | RelayError::InvalidPayload(_)
        )
    }
}

/// Result type for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

/// Coarse failure buckets shown to users.
///
/// Classification is by substring of the failure text, since the calldata
/// tool and the node report most conditions only as free-form messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    ContractNotFound,
    InvalidProof,
    Deserialization,
    Network,
    Other,
}

impl FailureCategory {
    /// Classify a failure message. Earlier patterns win.
    pub fn classify(message: &str) -> Self {
        const PATTERNS: [(&str, FailureCategory); 4] = [
            ("Contract not found", FailureCategory::ContractNotFound),
            ("Invalid proof", FailureCategory::InvalidProof),
            ("deserialization failed", FailureCategory::Deserialization),
            ("RPC", FailureCategory::Network),
        ];

        PATTERNS
            .iter()
            .find(|(needle, _)| message.contains(needle))
            .map(|(_, category)| *category)
            .unwrap_or(FailureCategory::Other)
    }

    pub fn user_message(&self, original: &str) -> String {
        match self {
            FailureCategory::ContractNotFound => {
                "Contrato não encontrado. Verifique o endereço do contrato.".to_string()
            }
            FailureCategory::InvalidProof => {
                "Prova inválida. Verifique os dados da prova.".to_string()
            }
            FailureCategory::Deserialization => {
                "Falha na deserialização dos dados da prova. Formato inválido.".to_string()
            }
            FailureCategory::Network => {
                "Erro de conexão com a rede Starknet. Tente novamente.".to_string()
            }
            FailureCategory::Other => format!("Falha na verificação: {original}"),
        }
    }
}
