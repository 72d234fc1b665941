//! Infrastructure layer for the verification relay
//!
//! Contains trait definitions and implementations for:
//! - Calldata generation (external `garaga` CLI)
//! - On-chain verification (Starknet JSON-RPC)
//! - Graceful shutdown (request draining)

mod calldata;
mod error;
mod graceful_shutdown;
mod starknet;

pub use calldata::{
    parse_calldata_output, CalldataGenerator, CalldataParseMode, GaragaCalldataGenerator,
    PROOF_SYSTEM,
};
pub use error::*;
pub use graceful_shutdown::{shutdown_signal, track_requests, RequestGuard, RequestTracker};
pub use starknet::{
    decode_option_u256_array, encode_array_argument, selector, OnChainVerifier, StarknetVerifier,
};

#[cfg(test)]
pub use calldata::MockCalldataGenerator;
#[cfg(test)]
pub use starknet::MockOnChainVerifier;
