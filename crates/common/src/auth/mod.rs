//! Authenticated request pipeline
//!
//! Provides the request-side authentication lifecycle for HTTP clients:
//! - Bearer credential attachment on every request
//! - Single in-flight credential refresh shared by concurrent failures
//! - Ordered replay of deferred requests after a refresh
//! - Session expiry notification
//!
//! # Architecture
//!
//! - `traits`: collaborator seams (transport, credential store, refresher,
//!   notifier)
//! - `refresh_state`: refresh phase and waiting list
//! - `pipeline`: [`AuthenticatedPipeline`], the orchestrator
//! - `refresh`: [`HttpRefreshExecutor`] posting to a refresh endpoint
//! - `store`: in-memory [`CredentialStore`]
//! - `notifier`: [`Notifier`] implementations
//! - `metrics`: atomic counters

pub mod metrics;
pub mod notifier;
pub mod pipeline;
pub mod refresh;
pub mod refresh_state;
pub mod store;
pub mod traits;

pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use notifier::{ChannelNotifier, NoopNotifier, TracingNotifier};
pub use pipeline::{AuthenticatedPipeline, PipelineBuilder, PipelineOptions};
pub use refresh::HttpRefreshExecutor;
pub use refresh_state::{PipelineState, RefreshState};
pub use store::MemoryCredentialStore;
pub use traits::{CredentialStore, Notifier, RefreshExecutor, Transport};
