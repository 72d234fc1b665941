//! Stark VIP Library
//!
//! Zero-knowledge balance-threshold proofs: client-side generation and
//! verification against a Starknet verifier contract.
//!
//! ## Modules
//!
//! - [`domain`] - Core domain types (proof requests, artifacts, verification results)
//! - [`prover`] - Input validation, proof transport codec and the generation pipeline
//! - [`infra`] - Calldata tool and Starknet RPC integrations
//! - [`relay`] - Artifacts in, on-chain verdict out
//! - [`report`] - User-facing outcome reports
//! - [`api`] - REST API routes
//! - [`server`] - Configuration and HTTP server bootstrap

pub mod api;
pub mod domain;
pub mod infra;
pub mod prover;
pub mod relay;
pub mod report;
pub mod server;

// Re-export commonly used types
pub use domain::{
    ArtifactPaths, CalldataArray, ProofArtifact, ProofRequest, PublicInput, VerificationResult,
};

pub use infra::{FailureCategory, RelayError, Result};
pub use prover::{ProofOrchestrator, ProverError};
pub use relay::VerificationRelay;
pub use report::{Report, Reporter};
