//! REST API handlers organized by domain.

pub mod health;
pub mod verify;

pub use health::*;
pub use verify::*;
