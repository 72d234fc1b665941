//! Input validation for proof requests.
//!
//! These checks run before any circuit execution; witness generation can take
//! seconds and cannot be interrupted from this layer.

use num_bigint::BigUint;
use rand::RngCore;
use thiserror::Error;

use crate::domain::{ProofRequest, RawProofRequest};

/// A proof request that must not reach the circuit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("threshold must not be negative (got {0})")]
    NegativeThreshold(i64),

    #[error("balance must not be negative (got {0})")]
    NegativeBalance(i64),

    #[error("nonce must not be empty")]
    EmptyNonce,

    #[error("secret nonce must not be empty")]
    EmptySecretNonce,

    #[error("public nonce and secret nonce must be equal")]
    NonceMismatch,

    #[error("balance {balance} is below threshold {threshold}")]
    InsufficientBalance { balance: u64, threshold: u64 },
}

/// Check a proof request; returns normally with no side effects on success.
pub fn validate(request: &ProofRequest) -> Result<(), ValidationError> {
    if request.nonce.trim().is_empty() {
        return Err(ValidationError::EmptyNonce);
    }
    if request.secret_nonce.trim().is_empty() {
        return Err(ValidationError::EmptySecretNonce);
    }
    if request.nonce != request.secret_nonce {
        return Err(ValidationError::NonceMismatch);
    }
    if request.balance < request.threshold {
        return Err(ValidationError::InsufficientBalance {
            balance: request.balance,
            threshold: request.threshold,
        });
    }
    Ok(())
}

impl TryFrom<RawProofRequest> for ProofRequest {
    type Error = ValidationError;

    fn try_from(raw: RawProofRequest) -> Result<Self, Self::Error> {
        let threshold = u64::try_from(raw.threshold)
            .map_err(|_| ValidationError::NegativeThreshold(raw.threshold))?;
        let balance =
            u64::try_from(raw.balance).map_err(|_| ValidationError::NegativeBalance(raw.balance))?;
        Ok(ProofRequest {
            threshold,
            nonce: raw.nonce,
            balance,
            secret_nonce: raw.secret_nonce,
        })
    }
}

/// Fresh 128-bit nonce as a decimal field element.
pub fn generate_random_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    BigUint::from_bytes_be(&bytes).to_str_radix(10)
}
