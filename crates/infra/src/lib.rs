//! # authpipe infrastructure
//!
//! Impure implementations of the pipeline collaborators.
//!
//! This crate contains:
//! - A `reqwest` backed [`Transport`](authpipe_common::Transport)
//! - Platform keychain and JSON file credential stores
//! - Configuration loading from the environment and JSON/TOML files
//! - Tracing subscriber initialisation
//! - [`build_pipeline`], which wires the above into an
//!   [`AuthenticatedPipeline`](authpipe_common::AuthenticatedPipeline)
//!
//! ## Architecture
//! - Implements traits defined in `authpipe-common`
//! - Contains all I/O (network, keychain, filesystem)

pub mod bootstrap;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;
pub mod storage;

pub use bootstrap::build_pipeline;
pub use errors::InfraError;
pub use http::{ReqwestTransport, ReqwestTransportBuilder};
pub use observability::{init_tracing, LogFormat};
pub use storage::{FileCredentialStore, KeychainCredentialStore};
