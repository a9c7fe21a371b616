//! Pipeline core shared by authpipe crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `runtime`: the async pipeline, refresh coordination, notifiers, metrics
//! - `test-utils`: mock collaborators and async test helpers

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod auth;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", all(test, feature = "runtime")))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "runtime")]
pub use auth::{
    AuthenticatedPipeline, ChannelNotifier, CredentialStore, HttpRefreshExecutor,
    MemoryCredentialStore, MetricsSnapshot, NoopNotifier, Notifier, PipelineBuilder,
    PipelineMetrics, PipelineOptions, PipelineState, RefreshExecutor, RefreshState,
    TracingNotifier, Transport,
};
