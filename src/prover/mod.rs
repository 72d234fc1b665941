//! Client-side proof generation.
//!
//! - [`validator`] - cheap request checks before circuit execution
//! - [`codec`] - proof bytes to transport text and back
//! - [`backend`] - seams to the external proving library
//! - [`orchestrator`] - the staged generation pipeline

pub mod backend;
pub mod codec;
pub mod orchestrator;
pub mod validator;

use thiserror::Error;

pub use backend::{
    BackendInitError, BackendInput, BackendMethod, CircuitDescription, CircuitSource,
    FileCircuitSource, HttpCircuitSource, ProofData, ProverToolchain, ProvingBackend, Witness,
    WitnessGenerator,
};
pub use codec::CodecError;
pub use orchestrator::{InitStrategy, ProgressUpdate, ProofOrchestrator, Stage};
pub use validator::{generate_random_nonce, validate, ValidationError};

/// Errors raised while generating a proof. All are terminal for the request.
#[derive(Debug, Error)]
pub enum ProverError {
    /// The request failed validation
    #[error("invalid proof request: {0}")]
    Validation(#[from] ValidationError),

    /// The circuit description could not be loaded
    #[error("failed to load circuit: {0}")]
    CircuitLoad(String),

    /// The circuit executor could not be created
    #[error("failed to initialize circuit executor: {0}")]
    Executor(String),

    /// A backend constructor failed for a reason other than input shape
    #[error("failed to initialize proving backend ({method}): {message}")]
    BackendInit {
        method: BackendMethod,
        message: String,
    },

    /// Every backend construction method rejected its input
    #[error("all backend initialization methods failed: {}", format_attempts(.attempts))]
    BackendInitExhausted {
        attempts: Vec<(BackendMethod, String)>,
    },

    /// Circuit execution rejected the inputs (e.g. unsatisfied constraints)
    #[error("witness generation failed: {0}")]
    Witness(String),

    /// The backend could not produce a proof
    #[error("proof generation failed: {0}")]
    Proof(String),

    /// The verification key could not be derived
    #[error("verification key derivation failed: {0}")]
    VerificationKey(String),

    /// Local verification ran and rejected the proof
    #[error("generated proof failed local verification")]
    LocalVerificationFailed,

    /// Local verification could not run
    #[error("local verification error: {0}")]
    Verification(String),
}

fn format_attempts(attempts: &[(BackendMethod, String)]) -> String {
    attempts
        .iter()
        .map(|(method, message)| format!("{method}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}
