//! # authpipe Domain
//!
//! Data types for the authenticated request pipeline.
//!
//! This crate contains:
//! - Credential, request and response types
//! - Error enums surfaced by the pipeline and its collaborators
//! - Configuration structures
//! - Header names, defaults and environment variable names
//!
//! ## Architecture
//! - No dependencies on other authpipe crates
//! - No I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
