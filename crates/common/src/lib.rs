//! Narrator Common Utilities
//!
//! Shared infrastructure for all Narrator crates:
//! - Error types and result aliases
//! - Animation timer and duration drift utilities
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
