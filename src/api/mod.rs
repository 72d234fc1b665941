//! API layer for the verification relay
//!
//! REST endpoints under `/api`, plus the structured error envelope.

pub mod error;
pub mod handlers;
mod rest;
pub mod types;

pub use error::{ApiError, ErrorCode};
pub use rest::*;
